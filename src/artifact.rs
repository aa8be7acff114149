//! Model and metadata artifacts
//!
//! Training writes `model.json` and `metadata.json`; the server loads both
//! before accepting requests. Any failure here is fatal at startup.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::classifier::{Classifier, LogisticModel};
use crate::models::FeatureContract;

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize artifact: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{path} declares no feature_names")]
    NoFeatures { path: PathBuf },

    #[error("{path} lists feature '{name}' more than once")]
    DuplicateFeature { path: PathBuf, name: String },

    #[error("unsupported model format version {found} (expected {expected})")]
    UnsupportedFormat { found: u32, expected: u32 },

    #[error("model checksum mismatch for {path}: metadata says {expected}, file is {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("model in {path} has not been fitted")]
    Unfitted { path: PathBuf },

    #[error("model was trained on {model:?} but metadata declares {metadata:?}")]
    FeatureMismatch {
        metadata: Vec<String>,
        model: Vec<String>,
    },
}

/// Training-time description of the model inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMetadata {
    pub feature_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub numeric_features: Vec<String>,
    #[serde(default)]
    pub categorical_features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<DateTime<Utc>>,
}

impl FeatureMetadata {
    pub fn new(feature_names: Vec<String>) -> Self {
        Self {
            feature_names,
            target: None,
            numeric_features: Vec::new(),
            categorical_features: Vec::new(),
            model_file: None,
            model_sha256: None,
            accuracy: None,
            trained_at: None,
        }
    }

    pub fn contract(&self) -> FeatureContract {
        FeatureContract::new(self.feature_names.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    pub model: LogisticModel,
}

impl ModelArtifact {
    pub fn new(model: LogisticModel) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            trained_at: Utc::now(),
            model,
        }
    }
}

/// Everything the server needs, validated against each other.
#[derive(Debug)]
pub struct LoadedArtifacts {
    pub metadata: FeatureMetadata,
    pub model: LogisticModel,
}

impl LoadedArtifacts {
    pub fn contract(&self) -> FeatureContract {
        self.metadata.contract()
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn load_metadata(path: &Path) -> Result<FeatureMetadata, ArtifactError> {
    let bytes = read(path)?;
    let metadata: FeatureMetadata = serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if metadata.feature_names.is_empty() {
        return Err(ArtifactError::NoFeatures {
            path: path.to_path_buf(),
        });
    }

    let mut seen = HashSet::new();
    if let Some(dup) = metadata.feature_names.iter().find(|n| !seen.insert(n.as_str())) {
        return Err(ArtifactError::DuplicateFeature {
            path: path.to_path_buf(),
            name: dup.clone(),
        });
    }

    Ok(metadata)
}

pub fn save_metadata(path: &Path, metadata: &FeatureMetadata) -> Result<(), ArtifactError> {
    let json = serde_json::to_vec_pretty(metadata)?;
    write(path, &json)
}

/// Load a model, verifying its checksum when one is given.
pub fn load_model(path: &Path, expected_sha256: Option<&str>) -> Result<ModelArtifact, ArtifactError> {
    let bytes = read(path)?;

    if let Some(expected) = expected_sha256 {
        let actual = sha256_hex(&bytes);
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(ArtifactError::ChecksumMismatch {
                path: path.to_path_buf(),
                expected: expected.to_string(),
                actual,
            });
        }
    }

    let artifact: ModelArtifact = serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if artifact.format_version != MODEL_FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedFormat {
            found: artifact.format_version,
            expected: MODEL_FORMAT_VERSION,
        });
    }
    if !artifact.model.is_fitted() {
        return Err(ArtifactError::Unfitted {
            path: path.to_path_buf(),
        });
    }

    Ok(artifact)
}

/// Write a model and return the SHA-256 of the written bytes.
pub fn save_model(path: &Path, artifact: &ModelArtifact) -> Result<String, ArtifactError> {
    let json = serde_json::to_vec_pretty(artifact)?;
    write(path, &json)?;
    Ok(sha256_hex(&json))
}

/// Load metadata, then the model it describes, and check they agree.
pub fn load_artifacts(model_path: &Path, metadata_path: &Path) -> Result<LoadedArtifacts, ArtifactError> {
    tracing::info!("Loading metadata from {}", metadata_path.display());
    let metadata = load_metadata(metadata_path)?;

    tracing::info!("Loading model from {}", model_path.display());
    let artifact = load_model(model_path, metadata.model_sha256.as_deref())?;

    if let Some(trained) = artifact.model.feature_names() {
        if trained != metadata.feature_names.as_slice() {
            return Err(ArtifactError::FeatureMismatch {
                metadata: metadata.feature_names.clone(),
                model: trained.to_vec(),
            });
        }
    }

    tracing::info!(
        features = metadata.feature_names.len(),
        trained_at = %artifact.trained_at,
        "Loaded features: {:?}",
        metadata.feature_names
    );

    Ok(LoadedArtifacts {
        metadata,
        model: artifact.model,
    })
}

fn read(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    fs::write(path, bytes).map_err(|source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    })
}
