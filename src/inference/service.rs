use std::sync::Arc;

use serde_json::{Map, Value};

use super::{InferenceError, RowError, ValidationError};
use crate::classifier::{Classifier, ModelError};
use crate::models::{FeatureContract, FeatureVector, PredictionResult};
use crate::risk::{self, RiskPolicy};

/// Request handler shared by every connection.
///
/// Holds the feature contract and the model read-only; nothing here is
/// mutated after construction.
pub struct InferenceService {
    contract: FeatureContract,
    model: Arc<dyn Classifier>,
    policy: RiskPolicy,
}

impl InferenceService {
    pub fn new(contract: FeatureContract, model: Arc<dyn Classifier>, policy: RiskPolicy) -> Self {
        Self {
            contract,
            model,
            policy,
        }
    }

    pub fn contract(&self) -> &FeatureContract {
        &self.contract
    }

    /// Policy used when the caller does not pick one.
    pub fn default_policy(&self) -> RiskPolicy {
        self.policy
    }

    pub fn handle(&self, request: &Map<String, Value>) -> Result<PredictionResult, InferenceError> {
        self.handle_with(request, &self.policy)
    }

    /// Validate one record, score it and classify the outcome.
    ///
    /// Missing or malformed features fail before the model is called.
    pub fn handle_with(
        &self,
        request: &Map<String, Value>,
        policy: &RiskPolicy,
    ) -> Result<PredictionResult, InferenceError> {
        self.evaluate(request, policy).map(|(_, result)| result)
    }

    /// Like [`handle_with`](Self::handle_with), also returning the validated
    /// vector for presentation.
    pub fn evaluate(
        &self,
        request: &Map<String, Value>,
        policy: &RiskPolicy,
    ) -> Result<(FeatureVector, PredictionResult), InferenceError> {
        let vector = self.contract.vectorize(request)?;
        let mut results = self.score(std::slice::from_ref(&vector), policy)?;
        let result = results.pop().ok_or(ModelError::OutputLength {
            expected: 1,
            found: 0,
        })?;
        Ok((vector, result))
    }

    /// Score a table of records in one model call. Output order matches
    /// input order. Every row is validated first; any failing row rejects
    /// the whole batch with per-row details.
    pub fn handle_batch(
        &self,
        rows: &[Map<String, Value>],
        policy: &RiskPolicy,
    ) -> Result<Vec<PredictionResult>, InferenceError> {
        let mut vectors = Vec::with_capacity(rows.len());
        let mut errors = Vec::new();

        for (row, record) in rows.iter().enumerate() {
            match self.contract.vectorize(record) {
                Ok(vector) => vectors.push(vector),
                Err(error) => errors.push(RowError { row, error }),
            }
        }

        if !errors.is_empty() {
            return Err(ValidationError::Rows { rows: errors }.into());
        }
        if vectors.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self.score(&vectors, policy)?)
    }

    fn score(
        &self,
        vectors: &[FeatureVector],
        policy: &RiskPolicy,
    ) -> Result<Vec<PredictionResult>, ModelError> {
        let labels = self.model.predict(vectors)?;
        let proba = self.model.predict_proba(vectors)?;

        for found in [labels.len(), proba.len()] {
            if found != vectors.len() {
                return Err(ModelError::OutputLength {
                    expected: vectors.len(),
                    found,
                });
            }
        }

        vectors
            .iter()
            .zip(labels)
            .zip(proba)
            .map(|((vector, label), [_, probability])| {
                if label > 1 {
                    return Err(ModelError::InvalidLabel(label));
                }
                if !(0.0..=1.0).contains(&probability) {
                    return Err(ModelError::InvalidProbability(probability));
                }

                Ok(PredictionResult {
                    label,
                    probability,
                    risk: policy.assess(label, probability),
                    risk_factors: risk::explain(self.contract.entries(vector)),
                })
            })
            .collect()
    }
}
