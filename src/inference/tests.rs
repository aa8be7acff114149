//! Tests for the inference request handler

use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::{InferenceError, ValidationError};
use crate::classifier::ModelError;
use crate::models::FeatureValue;
use crate::risk::{RiskBands, RiskPolicy, RiskTier};
use crate::testing::{service, StubClassifier};

const CONTRACT: [&str; 3] = ["Age", "Sex", "Cholesterol"];

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[test]
fn test_missing_features_short_circuit() {
    let stub = Arc::new(StubClassifier::returning(0, 0.1));
    let svc = service(&CONTRACT, stub.clone(), RiskPolicy::TwoTier);

    let err = svc.handle(&object(json!({"Age": 45}))).unwrap_err();

    match err {
        InferenceError::Validation(ValidationError::MissingFeatures { missing }) => {
            assert_eq!(missing, vec!["Sex", "Cholesterol"]);
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(stub.calls(), 0);
}

#[test]
fn test_invalid_value_short_circuits() {
    let stub = Arc::new(StubClassifier::returning(0, 0.1));
    let svc = service(&CONTRACT, stub.clone(), RiskPolicy::TwoTier);

    let err = svc
        .handle(&object(json!({"Age": 45, "Sex": ["M"], "Cholesterol": 200})))
        .unwrap_err();

    assert!(matches!(
        err,
        InferenceError::Validation(ValidationError::InvalidValue { ref feature, found: "array" })
            if feature == "Sex"
    ));
    assert_eq!(stub.calls(), 0);
}

#[test]
fn test_vector_follows_contract_order() {
    let stub = Arc::new(StubClassifier::returning(0, 0.1));
    let svc = service(&CONTRACT, stub.clone(), RiskPolicy::TwoTier);

    svc.handle(&object(json!({
        "Cholesterol": 200,
        "PatientId": "abc-123",
        "Sex": "M",
        "Age": 45
    })))
    .unwrap();

    let seen = stub.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0].values(),
        &[
            FeatureValue::Number(45.0),
            FeatureValue::Text("M".into()),
            FeatureValue::Number(200.0),
        ]
    );
}

#[test]
fn test_end_to_end_low_risk() {
    let stub = Arc::new(StubClassifier::returning(0, 0.10));
    let svc = service(&CONTRACT, stub.clone(), RiskPolicy::TwoTier);

    let result = svc
        .handle(&object(json!({"Age": 45, "Sex": "M", "Cholesterol": 200})))
        .unwrap();

    assert_eq!(result.label, 0);
    assert_eq!(result.probability, 0.10);
    assert_eq!(result.risk, RiskTier::Low);
    assert!(result.risk_factors.is_empty());
    assert_eq!(stub.calls(), 1);
}

#[test]
fn test_policy_override() {
    let stub = Arc::new(StubClassifier::returning(1, 0.55));
    let svc = service(&CONTRACT, stub, RiskPolicy::TwoTier);
    let record = object(json!({"Age": 61, "Sex": "F", "Cholesterol": 280}));

    assert_eq!(svc.handle(&record).unwrap().risk, RiskTier::High);

    let three_tier = RiskPolicy::ThreeTier(RiskBands::default());
    let result = svc.handle_with(&record, &three_tier).unwrap();
    assert_eq!(result.risk, RiskTier::Medium);
    assert_eq!(result.risk_factors, vec!["High Cholesterol"]);
}

#[test]
fn test_model_failure_is_reported() {
    let stub = Arc::new(StubClassifier::failing(ModelError::NonNumeric {
        feature: "Age".into(),
        value: "old".into(),
    }));
    let svc = service(&CONTRACT, stub, RiskPolicy::TwoTier);

    let err = svc
        .handle(&object(json!({"Age": "old", "Sex": "M", "Cholesterol": 200})))
        .unwrap_err();

    assert!(matches!(err, InferenceError::Model(ModelError::NonNumeric { .. })));
}

#[test]
fn test_out_of_range_probability_rejected() {
    let stub = Arc::new(StubClassifier::returning(1, 1.5));
    let svc = service(&CONTRACT, stub, RiskPolicy::TwoTier);

    let err = svc
        .handle(&object(json!({"Age": 45, "Sex": "M", "Cholesterol": 200})))
        .unwrap_err();

    assert!(matches!(err, InferenceError::Model(ModelError::InvalidProbability(p)) if p == 1.5));
}

#[test]
fn test_batch_preserves_order_with_one_model_call() {
    // Probability derived from Age so each row is distinguishable.
    let stub = Arc::new(StubClassifier::new(|row| {
        let age = row.values()[0].as_f64().unwrap_or(0.0);
        let p = age / 100.0;
        Ok((u8::from(p >= 0.5), p))
    }));
    let svc = service(&CONTRACT, stub.clone(), RiskPolicy::ThreeTier(RiskBands::default()));

    let rows: Vec<Map<String, Value>> = [20, 80, 45, 70]
        .iter()
        .map(|age| object(json!({"Age": age, "Sex": "M", "Cholesterol": 200})))
        .collect();

    let results = svc.handle_batch(&rows, &svc.default_policy()).unwrap();

    assert_eq!(stub.calls(), 1);
    assert_eq!(results.len(), 4);
    let probs: Vec<f64> = results.iter().map(|r| r.probability).collect();
    assert_eq!(probs, vec![0.20, 0.80, 0.45, 0.70]);
    let tiers: Vec<RiskTier> = results.iter().map(|r| r.risk).collect();
    assert_eq!(
        tiers,
        vec![RiskTier::Low, RiskTier::High, RiskTier::Medium, RiskTier::High]
    );
}

#[test]
fn test_batch_validates_every_row() {
    let stub = Arc::new(StubClassifier::returning(0, 0.1));
    let svc = service(&CONTRACT, stub.clone(), RiskPolicy::TwoTier);

    let rows = vec![
        object(json!({"Age": 45, "Sex": "M", "Cholesterol": 200})),
        object(json!({"Age": 50})),
        object(json!({"Age": 60, "Sex": "F", "Cholesterol": 220})),
        object(json!({"Sex": "F", "Cholesterol": 220})),
    ];

    let err = svc.handle_batch(&rows, &RiskPolicy::TwoTier).unwrap_err();

    match err {
        InferenceError::Validation(ValidationError::Rows { rows }) => {
            let failing: Vec<usize> = rows.iter().map(|r| r.row).collect();
            assert_eq!(failing, vec![1, 3]);
            assert_eq!(
                rows[0].error,
                ValidationError::MissingFeatures {
                    missing: vec!["Sex".into(), "Cholesterol".into()]
                }
            );
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(stub.calls(), 0);
}

#[test]
fn test_empty_batch_skips_model() {
    let stub = Arc::new(StubClassifier::returning(0, 0.1));
    let svc = service(&CONTRACT, stub.clone(), RiskPolicy::TwoTier);

    let results = svc.handle_batch(&[], &RiskPolicy::TwoTier).unwrap();

    assert!(results.is_empty());
    assert_eq!(stub.calls(), 0);
}

#[test]
fn test_explanation_uses_clinical_fields() {
    let stub = Arc::new(StubClassifier::returning(1, 0.9));
    let svc = service(
        &["Cholesterol", "RestingBP", "MaxHR", "ExerciseAngina"],
        stub,
        RiskPolicy::TwoTier,
    );

    let result = svc
        .handle(&object(json!({
            "Cholesterol": 300,
            "RestingBP": 150,
            "MaxHR": 100,
            "ExerciseAngina": "Y"
        })))
        .unwrap();

    assert_eq!(
        result.risk_factors,
        vec![
            "High Cholesterol",
            "High Blood Pressure",
            "Low Max HR",
            "Exercise Angina detected"
        ]
    );
}
