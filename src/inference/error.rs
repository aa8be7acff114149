use std::fmt;

use crate::classifier::ModelError;

/// Client-caused request problems, detected before the model is touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing features: {}", py_list(.missing))]
    MissingFeatures { missing: Vec<String> },

    #[error("Invalid value for feature '{feature}': expected a number, string or boolean, got {found}")]
    InvalidValue { feature: String, found: &'static str },

    #[error("{}", join_rows(.rows))]
    Rows { rows: Vec<RowError> },
}

impl ValidationError {
    /// Stable error code reported to clients.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingFeatures { .. } => "missing_features",
            ValidationError::InvalidValue { .. } => "invalid_feature",
            ValidationError::Rows { rows } => rows
                .first()
                .map(|r| r.error.code())
                .unwrap_or("invalid_request"),
        }
    }
}

/// Validation failure of one batch row (0-based).
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub row: usize,
    pub error: ValidationError,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.error)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// `['a', 'b']`
fn py_list(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{}'", n)).collect();
    format!("[{}]", quoted.join(", "))
}

fn join_rows(rows: &[RowError]) -> String {
    rows.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
