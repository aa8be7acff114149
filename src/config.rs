//! Configuration module

use std::env;
use std::path::PathBuf;

use crate::risk::{InvalidBands, RiskBands, RiskPolicy};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },

    #[error(transparent)]
    Bands(#[from] InvalidBands),
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Trained model artifact
    pub model_path: PathBuf,

    /// Feature metadata written alongside the model
    pub metadata_path: PathBuf,

    /// Default risk policy for inference endpoints
    pub risk_policy: RiskPolicy,

    /// Bands used whenever the three-tier policy is selected
    pub risk_bands: RiskBands,

    /// Maximum rows per batch request
    pub max_batch_rows: usize,

    /// Maximum request body size in bytes
    pub max_body_bytes: usize,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            model_path: PathBuf::from("artifacts/model.json"),
            metadata_path: PathBuf::from("artifacts/metadata.json"),
            risk_policy: RiskPolicy::TwoTier,
            risk_bands: RiskBands::default(),
            max_batch_rows: 1000,
            max_body_bytes: 2 * 1024 * 1024,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let risk_bands = RiskBands::new(
            parsed(&lookup, "RISK_MEDIUM_THRESHOLD")?.unwrap_or(defaults.risk_bands.medium),
            parsed(&lookup, "RISK_HIGH_THRESHOLD")?.unwrap_or(defaults.risk_bands.high),
        )?;

        let risk_policy = match lookup("RISK_POLICY") {
            Some(name) => RiskPolicy::from_name(&name, risk_bands).ok_or(ConfigError::Invalid {
                key: "RISK_POLICY",
                value: name,
            })?,
            None => defaults.risk_policy,
        };

        Ok(Self {
            port: parsed(&lookup, "PORT")?.unwrap_or(defaults.port),

            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),

            metadata_path: lookup("METADATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.metadata_path),

            risk_policy,
            risk_bands,

            max_batch_rows: parsed(&lookup, "MAX_BATCH_ROWS")?.unwrap_or(defaults.max_batch_rows),

            max_body_bytes: parsed(&lookup, "MAX_BODY_BYTES")?.unwrap_or(defaults.max_body_bytes),

            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parsed<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.risk_policy, RiskPolicy::TwoTier);
        assert_eq!(cfg.model_path, PathBuf::from("artifacts/model.json"));
        assert!(!cfg.is_production());
    }

    #[test]
    fn test_three_tier_uses_configured_bands() {
        let cfg = config(&[
            ("RISK_POLICY", "three-tier"),
            ("RISK_MEDIUM_THRESHOLD", "0.25"),
            ("RISK_HIGH_THRESHOLD", "0.8"),
        ])
        .unwrap();

        assert_eq!(cfg.risk_policy, RiskPolicy::ThreeTier(RiskBands { medium: 0.25, high: 0.8 }));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            config(&[("PORT", "http")]),
            Err(ConfigError::Invalid { key: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("RISK_POLICY", "five-tier")]),
            Err(ConfigError::Invalid { key: "RISK_POLICY", .. })
        ));
        assert!(matches!(
            config(&[("RISK_MEDIUM_THRESHOLD", "0.9")]),
            Err(ConfigError::Bands(_))
        ));
    }
}
