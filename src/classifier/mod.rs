//! Model capability
//!
//! The inference path only sees the [`Classifier`] trait. Training code uses
//! [`Fit`]. `LogisticModel` is the implementation shipped with the crate;
//! anything that satisfies the traits can be plugged into the service.

pub mod logistic;
pub mod preprocess;

pub use logistic::{LogisticModel, TrainingParams};
pub use preprocess::{ColumnEncoder, Preprocessor};

use crate::models::FeatureVector;

/// Binary classifier over contract-ordered feature vectors.
///
/// Implementations are shared across concurrently handled requests, so both
/// operations must be safe to call from several threads at once.
pub trait Classifier: Send + Sync {
    /// Hard label (0 or 1) per row.
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<u8>, ModelError>;

    /// `[P(class 0), P(class 1)]` per row.
    fn predict_proba(&self, rows: &[FeatureVector]) -> Result<Vec<[f64; 2]>, ModelError>;

    /// Column names the model was trained on, if it knows them.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }
}

pub trait Fit {
    fn fit(&mut self, rows: &[FeatureVector], labels: &[u8]) -> Result<(), ModelError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("model has not been fitted")]
    NotFitted,

    #[error("expected {expected} feature values per row, got {found}")]
    WidthMismatch { expected: usize, found: usize },

    #[error("could not convert value '{value}' of feature '{feature}' to a number")]
    NonNumeric { feature: String, value: String },

    #[error("got {rows} rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("labels must be 0 or 1, got {0}")]
    InvalidLabel(u8),

    #[error("model returned probability {0}, outside [0, 1]")]
    InvalidProbability(f64),

    #[error("model returned {found} outputs for {expected} rows")]
    OutputLength { expected: usize, found: usize },

    #[error("weights do not match the encoded width ({weights} weights, {width} columns)")]
    CorruptWeights { weights: usize, width: usize },
}
