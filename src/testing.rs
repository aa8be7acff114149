//! Test doubles shared by unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::classifier::{Classifier, ModelError};
use crate::inference::InferenceService;
use crate::models::{FeatureContract, FeatureVector};
use crate::risk::RiskPolicy;

type Responder = Box<dyn Fn(&FeatureVector) -> Result<(u8, f64), ModelError> + Send + Sync>;

/// Classifier that answers from a closure and records every call.
pub struct StubClassifier {
    respond: Responder,
    calls: AtomicUsize,
    seen: Mutex<Vec<FeatureVector>>,
}

impl StubClassifier {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&FeatureVector) -> Result<(u8, f64), ModelError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(label: u8, probability: f64) -> Self {
        Self::new(move |_| Ok((label, probability)))
    }

    pub fn failing(error: ModelError) -> Self {
        Self::new(move |_| Err(error.clone()))
    }

    /// Number of `predict` calls (one per scored table).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Rows passed to the most recent `predict` call.
    pub fn seen(&self) -> Vec<FeatureVector> {
        self.seen.lock().unwrap().clone()
    }

    fn answer(&self, rows: &[FeatureVector]) -> Result<Vec<(u8, f64)>, ModelError> {
        rows.iter().map(|r| (self.respond)(r)).collect()
    }
}

impl Classifier for StubClassifier {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<u8>, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.seen.lock().unwrap() = rows.to_vec();
        Ok(self.answer(rows)?.into_iter().map(|(label, _)| label).collect())
    }

    fn predict_proba(&self, rows: &[FeatureVector]) -> Result<Vec<[f64; 2]>, ModelError> {
        Ok(self
            .answer(rows)?
            .into_iter()
            .map(|(_, p)| [1.0 - p, p])
            .collect())
    }
}

pub fn contract(names: &[&str]) -> FeatureContract {
    FeatureContract::new(names.iter().map(|n| n.to_string()).collect())
}

pub fn service(names: &[&str], stub: Arc<StubClassifier>, policy: RiskPolicy) -> InferenceService {
    InferenceService::new(contract(names), stub, policy)
}
