//! Request and response bodies of the HTTP API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::PredictionResult;
use crate::risk::RiskTier;

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub message: &'static str,
    pub available_endpoints: Vec<&'static str>,
    pub required_features: Vec<String>,
    pub risk_policy: &'static str,
}

/// Query options shared by the inference endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct InferenceQuery {
    pub risk_policy: Option<String>,
    /// Report output format (`html` or `text`)
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub status: &'static str,
    pub input: Map<String, Value>,
    pub prediction: u8,
    pub probability: f64,
    pub risk: RiskTier,
    pub risk_factors: Vec<String>,
    pub explanation: String,
}

impl PredictResponse {
    pub fn success(input: Map<String, Value>, result: PredictionResult) -> Self {
        let explanation = result.explanation();
        Self {
            status: "success",
            input,
            prediction: result.label,
            probability: result.probability,
            risk: result.risk,
            risk_factors: result.risk_factors,
            explanation,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub instances: Vec<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub row: usize,
    pub prediction: u8,
    pub probability: f64,
    pub risk_level: RiskTier,
    pub risk_factors: Vec<String>,
    pub explanation: String,
}

impl BatchResult {
    pub fn new(row: usize, result: PredictionResult) -> Self {
        let explanation = result.explanation();
        Self {
            row,
            prediction: result.label,
            probability: result.probability,
            risk_level: result.risk,
            risk_factors: result.risk_factors,
            explanation,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub status: &'static str,
    pub count: usize,
    pub results: Vec<BatchResult>,
}
