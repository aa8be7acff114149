//! Column preprocessing
//!
//! Numeric columns are standard-scaled, categorical columns one-hot encoded.
//! Categories not seen during fitting encode as all zeros.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::models::{FeatureValue, FeatureVector};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnEncoder {
    Numeric { name: String, mean: f64, scale: f64 },
    Categorical { name: String, categories: Vec<String> },
}

impl ColumnEncoder {
    pub fn name(&self) -> &str {
        match self {
            ColumnEncoder::Numeric { name, .. } | ColumnEncoder::Categorical { name, .. } => name,
        }
    }

    /// Number of encoded columns this input expands to.
    pub fn width(&self) -> usize {
        match self {
            ColumnEncoder::Numeric { .. } => 1,
            ColumnEncoder::Categorical { categories, .. } => categories.len(),
        }
    }

    fn fit(name: &str, values: &[&FeatureValue]) -> Result<Self, ModelError> {
        if values.iter().any(|v| v.is_text()) {
            let mut categories: Vec<String> = values.iter().map(|v| v.as_category()).collect();
            categories.sort();
            categories.dedup();
            return Ok(ColumnEncoder::Categorical {
                name: name.to_string(),
                categories,
            });
        }

        let numbers = values
            .iter()
            .map(|v| numeric(name, v))
            .collect::<Result<Vec<f64>, _>>()?;

        let n = numbers.len().max(1) as f64;
        let mean = numbers.iter().sum::<f64>() / n;
        let variance = numbers.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();

        Ok(ColumnEncoder::Numeric {
            name: name.to_string(),
            mean,
            scale: if std > f64::EPSILON { std } else { 1.0 },
        })
    }

    fn encode(&self, value: &FeatureValue, out: &mut [f64]) -> Result<(), ModelError> {
        match self {
            ColumnEncoder::Numeric { name, mean, scale } => {
                out[0] = (numeric(name, value)? - mean) / scale;
            }
            ColumnEncoder::Categorical { categories, .. } => {
                let label = value.as_category();
                out.fill(0.0);
                if let Ok(idx) = categories.binary_search(&label) {
                    out[idx] = 1.0;
                }
            }
        }
        Ok(())
    }
}

fn numeric(feature: &str, value: &FeatureValue) -> Result<f64, ModelError> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ModelError::NonNumeric {
            feature: feature.to_string(),
            value: value.to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    columns: Vec<ColumnEncoder>,
}

impl Preprocessor {
    /// Learn encoders for `names` from `rows`. A column is categorical when
    /// any of its training values is text.
    pub fn fit(names: &[String], rows: &[FeatureVector]) -> Result<Self, ModelError> {
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        check_widths(names.len(), rows)?;

        let columns = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let values: Vec<&FeatureValue> = rows.iter().map(|r| &r.values()[i]).collect();
                ColumnEncoder::fit(name, &values)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[ColumnEncoder] {
        &self.columns
    }

    /// Total encoded width.
    pub fn width(&self) -> usize {
        self.columns.iter().map(ColumnEncoder::width).sum()
    }

    pub fn numeric_features(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| matches!(c, ColumnEncoder::Numeric { .. }))
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn categorical_features(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| matches!(c, ColumnEncoder::Categorical { .. }))
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Encode rows into an `n x width` design matrix.
    pub fn transform(&self, rows: &[FeatureVector]) -> Result<Array2<f64>, ModelError> {
        check_widths(self.columns.len(), rows)?;

        let width = self.width();
        let mut matrix = Array2::<f64>::zeros((rows.len(), width));

        let mut buf = vec![0.0; width];

        for (row, mut out) in rows.iter().zip(matrix.rows_mut()) {
            let mut offset = 0;
            for (encoder, value) in self.columns.iter().zip(row.values()) {
                let w = encoder.width();
                encoder.encode(value, &mut buf[offset..offset + w])?;
                offset += w;
            }
            out.assign(&ArrayView1::from(&buf[..]));
        }

        Ok(matrix)
    }
}

fn check_widths(expected: usize, rows: &[FeatureVector]) -> Result<(), ModelError> {
    match rows.iter().find(|r| r.len() != expected) {
        Some(bad) => Err(ModelError::WidthMismatch {
            expected,
            found: bad.len(),
        }),
        None => Ok(()),
    }
}
