//! CSV dataset loading

use std::io::Read;
use std::path::Path;

use super::TrainingError;
use crate::models::{FeatureValue, FeatureVector};

/// Labelled training table. Feature order is the CSV column order with the
/// target column removed.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub target: String,
    pub rows: Vec<FeatureVector>,
    pub labels: Vec<u8>,
}

impl Dataset {
    pub fn from_path(path: &Path, target: &str) -> Result<Self, TrainingError> {
        let file = std::fs::File::open(path).map_err(|source| TrainingError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, target)
    }

    pub fn from_reader<R: Read>(reader: R, target: &str) -> Result<Self, TrainingError> {
        let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers: Vec<String> = csv.headers()?.iter().map(str::to_string).collect();
        let target_idx = headers
            .iter()
            .position(|h| h == target)
            .ok_or_else(|| TrainingError::MissingTarget(target.to_string()))?;

        let feature_names: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_idx)
            .map(|(_, h)| h.clone())
            .collect();

        let mut rows = Vec::new();
        let mut labels = Vec::new();

        for (line, record) in csv.records().enumerate() {
            let record = record?;
            // header is line 1
            let line = line + 2;

            let mut values = Vec::with_capacity(feature_names.len());
            for (i, cell) in record.iter().enumerate() {
                if cell.is_empty() {
                    return Err(TrainingError::EmptyCell {
                        line,
                        column: headers.get(i).cloned().unwrap_or_default(),
                    });
                }
                if i == target_idx {
                    labels.push(parse_label(cell, line)?);
                } else {
                    values.push(FeatureValue::parse_cell(cell));
                }
            }
            rows.push(FeatureVector::new(values));
        }

        if rows.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }

        Ok(Self {
            feature_names,
            target: target.to_string(),
            rows,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows and labels at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> (Vec<FeatureVector>, Vec<u8>) {
        indices
            .iter()
            .map(|&i| (self.rows[i].clone(), self.labels[i]))
            .unzip()
    }
}

fn parse_label(cell: &str, line: usize) -> Result<u8, TrainingError> {
    match cell.parse::<f64>() {
        Ok(v) if v == 0.0 => Ok(0),
        Ok(v) if v == 1.0 => Ok(1),
        _ => Err(TrainingError::BadLabel {
            line,
            value: cell.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Age,Sex,Cholesterol,HeartDisease
40,M,289,0
49,F,180,1
37,M,283,0
";

    #[test]
    fn test_target_removed_and_order_kept() {
        let ds = Dataset::from_reader(CSV.as_bytes(), "HeartDisease").unwrap();

        assert_eq!(ds.feature_names, vec!["Age", "Sex", "Cholesterol"]);
        assert_eq!(ds.labels, vec![0u8, 1, 0]);
        assert_eq!(
            ds.rows[1].values(),
            &[
                FeatureValue::Number(49.0),
                FeatureValue::Text("F".into()),
                FeatureValue::Number(180.0),
            ]
        );
    }

    #[test]
    fn test_missing_target_column() {
        let err = Dataset::from_reader(CSV.as_bytes(), "Outcome").unwrap_err();
        assert!(matches!(err, TrainingError::MissingTarget(ref t) if t == "Outcome"));
    }

    #[test]
    fn test_bad_label_reports_line() {
        let csv = "Age,HeartDisease\n40,0\n41,yes\n";
        let err = Dataset::from_reader(csv.as_bytes(), "HeartDisease").unwrap_err();
        assert!(matches!(err, TrainingError::BadLabel { line: 3, .. }));
    }

    #[test]
    fn test_empty_cell_rejected() {
        let csv = "Age,Sex,HeartDisease\n40,,0\n";
        let err = Dataset::from_reader(csv.as_bytes(), "HeartDisease").unwrap_err();
        assert!(matches!(err, TrainingError::EmptyCell { line: 2, ref column } if column == "Sex"));
    }

    #[test]
    fn test_select() {
        let ds = Dataset::from_reader(CSV.as_bytes(), "HeartDisease").unwrap();
        let (rows, labels) = ds.select(&[2, 1]);
        assert_eq!(labels, vec![0u8, 1]);
        assert_eq!(rows[0].values()[0], FeatureValue::Number(37.0));
    }
}
