//! Prediction result model

use serde::Serialize;

use crate::risk::{self, RiskTier};

/// Outcome of one inference call. Owned by the request that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Hard label from the model (1 = heart disease)
    pub label: u8,
    /// Probability of class 1, in [0, 1]
    pub probability: f64,
    pub risk: RiskTier,
    /// Triggered risk factors in fixed order
    pub risk_factors: Vec<String>,
}

impl PredictionResult {
    pub fn explanation(&self) -> String {
        risk::summarize(&self.risk_factors)
    }

    pub fn diagnosis(&self) -> &'static str {
        if self.label == 1 {
            "Heart Disease"
        } else {
            "No Heart Disease"
        }
    }
}
