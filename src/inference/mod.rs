//! Inference Request Handler
//!
//! Validates requests against the feature contract, builds ordered feature
//! vectors, invokes the classifier and shapes per-record results. Single and
//! batch requests share one validation path.

mod error;
mod service;

#[cfg(test)]
mod tests;

pub use error::{InferenceError, RowError, ValidationError};
pub use service::InferenceService;
