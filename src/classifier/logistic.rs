//! L2-regularised logistic regression on preprocessed features

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use super::{Classifier, Fit, ModelError, Preprocessor};
use crate::models::FeatureVector;

/// Gradient descent settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingParams {
    pub epochs: usize,
    pub learning_rate: f64,
    /// L2 penalty on the weights (bias is not penalised)
    pub l2: f64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            epochs: 2000,
            learning_rate: 0.1,
            l2: 1e-3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    feature_names: Vec<String>,
    params: TrainingParams,
    preprocessor: Option<Preprocessor>,
    weights: Vec<f64>,
    bias: f64,
}

impl LogisticModel {
    pub fn new(feature_names: Vec<String>, params: TrainingParams) -> Self {
        Self {
            feature_names,
            params,
            preprocessor: None,
            weights: Vec::new(),
            bias: 0.0,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.preprocessor.is_some()
    }

    pub fn preprocessor(&self) -> Option<&Preprocessor> {
        self.preprocessor.as_ref()
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Class-1 probability per row.
    fn positive_proba(&self, rows: &[FeatureVector]) -> Result<Array1<f64>, ModelError> {
        let pre = self.preprocessor.as_ref().ok_or(ModelError::NotFitted)?;
        if self.weights.len() != pre.width() {
            return Err(ModelError::CorruptWeights {
                weights: self.weights.len(),
                width: pre.width(),
            });
        }

        let x = pre.transform(rows)?;
        let z = x.dot(&ArrayView1::from(&self.weights[..])) + self.bias;
        Ok(z.mapv(sigmoid))
    }
}

impl Fit for LogisticModel {
    fn fit(&mut self, rows: &[FeatureVector], labels: &[u8]) -> Result<(), ModelError> {
        if rows.len() != labels.len() {
            return Err(ModelError::LengthMismatch {
                rows: rows.len(),
                labels: labels.len(),
            });
        }
        if let Some(&bad) = labels.iter().find(|&&l| l > 1) {
            return Err(ModelError::InvalidLabel(bad));
        }

        let pre = Preprocessor::fit(&self.feature_names, rows)?;
        let x = pre.transform(rows)?;
        let y: Array1<f64> = labels.iter().map(|&l| f64::from(l)).collect();
        let n = x.nrows() as f64;

        let TrainingParams { epochs, learning_rate, l2 } = self.params;
        let mut w = Array1::<f64>::zeros(x.ncols());
        let mut b = 0.0;

        for _ in 0..epochs {
            let p = (x.dot(&w) + b).mapv(sigmoid);
            let err = &p - &y;
            let grad_w = x.t().dot(&err) / n + &w * l2;
            let grad_b = err.sum() / n;

            w = w - grad_w * learning_rate;
            b -= learning_rate * grad_b;
        }

        self.weights = w.to_vec();
        self.bias = b;
        self.preprocessor = Some(pre);
        Ok(())
    }
}

impl Classifier for LogisticModel {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<u8>, ModelError> {
        let p = self.positive_proba(rows)?;
        Ok(p.iter().map(|&p| u8::from(p >= 0.5)).collect())
    }

    fn predict_proba(&self, rows: &[FeatureVector]) -> Result<Vec<[f64; 2]>, ModelError> {
        let p = self.positive_proba(rows)?;
        Ok(p.iter().map(|&p| [1.0 - p, p]).collect())
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.feature_names)
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureValue;

    fn patient(chol: f64, angina: &str) -> FeatureVector {
        FeatureVector::new(vec![
            FeatureValue::Number(chol),
            FeatureValue::Text(angina.into()),
        ])
    }

    fn trained() -> LogisticModel {
        let rows = vec![
            patient(180.0, "N"),
            patient(190.0, "N"),
            patient(200.0, "N"),
            patient(210.0, "N"),
            patient(280.0, "Y"),
            patient(290.0, "Y"),
            patient(300.0, "Y"),
            patient(310.0, "Y"),
        ];
        let labels: Vec<u8> = vec![0, 0, 0, 0, 1, 1, 1, 1];

        let mut model = LogisticModel::new(
            vec!["Cholesterol".into(), "ExerciseAngina".into()],
            TrainingParams::default(),
        );
        model.fit(&rows, &labels).unwrap();
        model
    }

    #[test]
    fn test_separable_data_is_learned() {
        let model = trained();
        let labels = model
            .predict(&[patient(185.0, "N"), patient(305.0, "Y")])
            .unwrap();
        assert_eq!(labels, vec![0u8, 1]);
    }

    #[test]
    fn test_probabilities_sum_to_one_and_agree_with_labels() {
        let model = trained();
        let rows = [patient(185.0, "N"), patient(305.0, "Y")];
        let proba = model.predict_proba(&rows).unwrap();
        let labels = model.predict(&rows).unwrap();

        for (p, label) in proba.iter().zip(&labels) {
            assert!((p[0] + p[1] - 1.0).abs() < 1e-12);
            assert!((0.0..=1.0).contains(&p[1]));
            assert_eq!(*label, u8::from(p[1] >= 0.5));
        }
        assert!(proba[0][1] < 0.5);
        assert!(proba[1][1] > 0.5);
    }

    #[test]
    fn test_unfitted_model_errors() {
        let model = LogisticModel::new(vec!["A".into()], TrainingParams::default());
        assert_eq!(
            model.predict(&[FeatureVector::new(vec![FeatureValue::Number(1.0)])]),
            Err(ModelError::NotFitted)
        );
    }

    #[test]
    fn test_fit_rejects_bad_labels() {
        let mut model = LogisticModel::new(vec!["A".into()], TrainingParams::default());
        let rows = vec![FeatureVector::new(vec![FeatureValue::Number(1.0)])];

        assert_eq!(model.fit(&rows, &[2]), Err(ModelError::InvalidLabel(2)));
        assert_eq!(
            model.fit(&rows, &[0, 1]),
            Err(ModelError::LengthMismatch { rows: 1, labels: 2 })
        );
    }

    #[test]
    fn test_serialized_model_predicts_identically() {
        let model = trained();
        let json = serde_json::to_string(&model).unwrap();
        let restored: LogisticModel = serde_json::from_str(&json).unwrap();

        let rows = [patient(250.0, "Y")];
        let before = model.predict_proba(&rows).unwrap();
        let after = restored.predict_proba(&rows).unwrap();
        assert!((before[0][1] - after[0][1]).abs() < 1e-9);
    }

    #[test]
    fn test_sigmoid_is_stable() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!(sigmoid(1000.0) <= 1.0);
    }
}
