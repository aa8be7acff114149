//! Feature contract and feature values

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::inference::ValidationError;

/// A single raw input value as accepted at the request boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl FeatureValue {
    /// Convert a JSON scalar. `null`, arrays and objects are not feature values.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(FeatureValue::Number),
            Value::Bool(b) => Some(FeatureValue::Bool(*b)),
            Value::String(s) => Some(FeatureValue::Text(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Parse a CSV cell: a number when it parses as one, text otherwise.
    pub fn parse_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        match trimmed.parse::<f64>() {
            Ok(n) if !trimmed.is_empty() && n.is_finite() => FeatureValue::Number(n),
            _ => FeatureValue::Text(cell.to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FeatureValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FeatureValue::Bool(b) => Value::Bool(*b),
            FeatureValue::Text(s) => Value::String(s.clone()),
        }
    }

    /// Numeric view used by scalers and threshold checks.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            FeatureValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            FeatureValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Category label used by one-hot encoding.
    pub fn as_category(&self) -> String {
        self.to_string()
    }

    pub fn is_text(&self) -> bool {
        matches!(self, FeatureValue::Text(_))
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            FeatureValue::Number(n) => write!(f, "{}", n),
            FeatureValue::Bool(b) => write!(f, "{}", b),
            FeatureValue::Text(s) => f.write_str(s),
        }
    }
}

/// Describes a JSON value for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Ordered feature values matching a [`FeatureContract`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<FeatureValue>);

impl FeatureVector {
    pub fn new(values: Vec<FeatureValue>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[FeatureValue] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&FeatureValue> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Ordered list of input names agreed at training time.
///
/// Loaded once at startup and shared read-only by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureContract {
    names: Vec<String>,
}

impl FeatureContract {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Contract names absent from `record`, in contract order.
    pub fn missing_from(&self, record: &Map<String, Value>) -> Vec<String> {
        self.names
            .iter()
            .filter(|name| !record.contains_key(name.as_str()))
            .cloned()
            .collect()
    }

    /// Build the ordered vector for `record`. Extra keys are ignored.
    pub fn vectorize(&self, record: &Map<String, Value>) -> Result<FeatureVector, ValidationError> {
        let missing = self.missing_from(record);
        if !missing.is_empty() {
            return Err(ValidationError::MissingFeatures { missing });
        }

        let mut values = Vec::with_capacity(self.names.len());
        for name in &self.names {
            let raw = &record[name.as_str()];
            let value = FeatureValue::from_json(raw).ok_or_else(|| ValidationError::InvalidValue {
                feature: name.clone(),
                found: json_kind(raw),
            })?;
            values.push(value);
        }

        Ok(FeatureVector::new(values))
    }

    /// Pair each contract name with its value in `vector`.
    pub fn entries<'a>(
        &'a self,
        vector: &'a FeatureVector,
    ) -> impl Iterator<Item = (&'a str, &'a FeatureValue)> + 'a {
        self.names.iter().map(String::as_str).zip(vector.values())
    }
}
