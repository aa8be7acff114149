//! Training pipeline
//!
//! Loads a labelled CSV, fits the logistic model on a stratified split,
//! evaluates it and writes the artifacts the server consumes.

pub mod dataset;
pub mod metrics;
pub mod split;

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::artifact::{self, ArtifactError, FeatureMetadata, ModelArtifact};
use crate::classifier::{Classifier, Fit, LogisticModel, ModelError, TrainingParams};

pub use dataset::Dataset;
pub use metrics::{ClassMetrics, ClassificationReport};
pub use split::{stratified_split, Split};

pub const MODEL_FILE: &str = "model.json";
pub const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("target column '{0}' not found")]
    MissingTarget(String),

    #[error("line {line}: empty value in column '{column}'")]
    EmptyCell { line: usize, column: String },

    #[error("line {line}: target must be 0 or 1, got '{value}'")]
    BadLabel { line: usize, value: String },

    #[error("dataset has no rows")]
    EmptyDataset,

    #[error("test size must be between 0 and 1, got {0}")]
    InvalidTestSize(f64),

    #[error("not enough rows per class to hold out a test set")]
    InsufficientData,

    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub test_size: f64,
    pub seed: u64,
    pub params: TrainingParams,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            params: TrainingParams::default(),
        }
    }
}

#[derive(Debug)]
pub struct TrainOutcome {
    pub model: LogisticModel,
    pub report: ClassificationReport,
    pub train_rows: usize,
    pub test_rows: usize,
}

impl TrainOutcome {
    pub fn accuracy(&self) -> f64 {
        self.report.accuracy
    }
}

/// Fit on the training split and evaluate on the held-out split.
pub fn train(dataset: &Dataset, options: &TrainOptions) -> Result<TrainOutcome, TrainingError> {
    let split = stratified_split(&dataset.labels, options.test_size, options.seed)?;
    if split.test.is_empty() || split.train.is_empty() {
        return Err(TrainingError::InsufficientData);
    }

    let (train_x, train_y) = dataset.select(&split.train);
    let (test_x, test_y) = dataset.select(&split.test);

    tracing::info!(
        train = train_x.len(),
        test = test_x.len(),
        epochs = options.params.epochs,
        "Fitting logistic model"
    );

    let mut model = LogisticModel::new(dataset.feature_names.clone(), options.params.clone());
    model.fit(&train_x, &train_y)?;

    let predicted = model.predict(&test_x)?;
    let report = ClassificationReport::compute(&test_y, &predicted);

    Ok(TrainOutcome {
        model,
        report,
        train_rows: train_x.len(),
        test_rows: test_x.len(),
    })
}

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub metadata: PathBuf,
}

/// Write `model.json` and `metadata.json` into `out_dir`.
pub fn write_artifacts(
    out_dir: &Path,
    dataset: &Dataset,
    outcome: &TrainOutcome,
) -> Result<ArtifactPaths, TrainingError> {
    std::fs::create_dir_all(out_dir).map_err(|source| TrainingError::CreateDir {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let paths = ArtifactPaths {
        model: out_dir.join(MODEL_FILE),
        metadata: out_dir.join(METADATA_FILE),
    };

    let artifact = ModelArtifact::new(outcome.model.clone());
    let sha = artifact::save_model(&paths.model, &artifact)?;

    let (numeric, categorical) = outcome
        .model
        .preprocessor()
        .map(|p| (p.numeric_features(), p.categorical_features()))
        .unwrap_or_default();

    let metadata = FeatureMetadata {
        feature_names: dataset.feature_names.clone(),
        target: Some(dataset.target.clone()),
        numeric_features: numeric,
        categorical_features: categorical,
        model_file: Some(MODEL_FILE.to_string()),
        model_sha256: Some(sha),
        accuracy: Some(outcome.accuracy()),
        trained_at: Some(Utc::now()),
    };
    artifact::save_metadata(&paths.metadata, &metadata)?;

    Ok(paths)
}
