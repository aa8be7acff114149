//! Evaluation metrics

use std::fmt;

use serde::Serialize;

pub fn accuracy(truth: &[u8], predicted: &[u8]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    correct as f64 / truth.len() as f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision / recall / F1 for a binary classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub total: usize,
}

impl ClassificationReport {
    pub fn compute(truth: &[u8], predicted: &[u8]) -> Self {
        let classes = [0u8, 1]
            .iter()
            .map(|&label| {
                let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
                for (&t, &p) in truth.iter().zip(predicted) {
                    match (t == label, p == label) {
                        (true, true) => tp += 1,
                        (false, true) => fp += 1,
                        (true, false) => fn_ += 1,
                        (false, false) => {}
                    }
                }

                let precision = ratio(tp, tp + fp);
                let recall = ratio(tp, tp + fn_);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                ClassMetrics {
                    label,
                    precision,
                    recall,
                    f1,
                    support: tp + fn_,
                }
            })
            .collect();

        Self {
            classes,
            accuracy: accuracy(truth, predicted),
            total: truth.len(),
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support")?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        write!(f, "{:>12} {:>32.2} {:>10}", "accuracy", self.accuracy, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_report_counts() {
        let truth = [1, 1, 1, 0, 0];
        let pred = [1, 1, 0, 1, 0];
        let report = ClassificationReport::compute(&truth, &pred);

        let pos = &report.classes[1];
        assert_eq!(pos.support, 3);
        assert!((pos.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((pos.recall - 2.0 / 3.0).abs() < 1e-12);

        let neg = &report.classes[0];
        assert_eq!(neg.support, 2);
        assert_eq!(neg.precision, 0.5);
        assert_eq!(neg.recall, 0.5);
        assert_eq!(report.accuracy, 0.6);
    }

    #[test]
    fn test_report_renders_table() {
        let report = ClassificationReport::compute(&[0, 1], &[0, 1]);
        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("accuracy"));
    }
}
