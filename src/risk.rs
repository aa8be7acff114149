//! Risk Classifier
//!
//! Maps a model outcome to a risk tier and derives the clinical risk factors
//! present in a patient record. Both are independent of each other: tiers come
//! from the model output, factors from the raw feature values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::FeatureValue;

/// Cholesterol above this (mg/dl) is reported.
pub const CHOLESTEROL_LIMIT: f64 = 240.0;
/// Resting blood pressure above this (mm Hg) is reported.
pub const RESTING_BP_LIMIT: f64 = 140.0;
/// Max heart rate below this is reported.
pub const MAX_HR_FLOOR: f64 = 120.0;

pub const NO_RISK_FACTORS: &str = "No major risk factors detected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
        }
    }

    /// Card colour used by the report renderer.
    pub fn color(&self) -> &'static str {
        match self {
            RiskTier::Low => "#4CAF50",
            RiskTier::Medium => "#FFC107",
            RiskTier::High => "#F44336",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability band boundaries for the three-tier policy.
///
/// Each band includes its lower bound: `p < medium` is Low,
/// `medium <= p < high` is Medium, `p >= high` is High.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBands {
    pub medium: f64,
    pub high: f64,
}

impl Default for RiskBands {
    fn default() -> Self {
        Self {
            medium: 0.30,
            high: 0.70,
        }
    }
}

impl RiskBands {
    pub fn new(medium: f64, high: f64) -> Result<Self, InvalidBands> {
        let bands = Self { medium, high };
        bands.validate()?;
        Ok(bands)
    }

    pub fn validate(&self) -> Result<(), InvalidBands> {
        if self.medium > 0.0 && self.medium < self.high && self.high <= 1.0 {
            Ok(())
        } else {
            Err(InvalidBands {
                medium: self.medium,
                high: self.high,
            })
        }
    }

    pub fn classify(&self, probability: f64) -> RiskTier {
        if probability < self.medium {
            RiskTier::Low
        } else if probability < self.high {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("risk thresholds must satisfy 0 < medium < high <= 1 (got medium={medium}, high={high})")]
pub struct InvalidBands {
    pub medium: f64,
    pub high: f64,
}

/// Three-tier classification with the default 0.30 / 0.70 bands.
pub fn classify(probability: f64) -> RiskTier {
    RiskBands::default().classify(probability)
}

/// How a model outcome becomes a risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum RiskPolicy {
    /// High when the hard label is 1, Low otherwise.
    #[default]
    TwoTier,
    /// Low / Medium / High from the class-1 probability.
    ThreeTier(RiskBands),
}

impl RiskPolicy {
    pub fn assess(&self, label: u8, probability: f64) -> RiskTier {
        match self {
            RiskPolicy::TwoTier if label == 1 => RiskTier::High,
            RiskPolicy::TwoTier => RiskTier::Low,
            RiskPolicy::ThreeTier(bands) => bands.classify(probability),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RiskPolicy::TwoTier => "two-tier",
            RiskPolicy::ThreeTier(_) => "three-tier",
        }
    }

    /// Parse a policy name; three-tier uses `bands`.
    pub fn from_name(name: &str, bands: RiskBands) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "two-tier" | "two_tier" | "2" => Some(RiskPolicy::TwoTier),
            "three-tier" | "three_tier" | "3" => Some(RiskPolicy::ThreeTier(bands)),
            _ => None,
        }
    }
}

impl FromStr for RiskPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskPolicy::from_name(s, RiskBands::default())
            .ok_or_else(|| format!("unknown risk policy '{}' (expected two-tier or three-tier)", s))
    }
}

// ============================================================================
// EXPLANATION
// ============================================================================

/// Checked in this order; each match appends its description.
const RISK_FACTORS: [(&str, fn(&FeatureValue) -> bool, &str); 4] = [
    ("Cholesterol", high_cholesterol, "High Cholesterol"),
    ("RestingBP", high_blood_pressure, "High Blood Pressure"),
    ("MaxHR", low_max_hr, "Low Max HR"),
    ("ExerciseAngina", exercise_angina, "Exercise Angina detected"),
];

fn high_cholesterol(value: &FeatureValue) -> bool {
    value.as_f64().is_some_and(|v| v > CHOLESTEROL_LIMIT)
}

fn high_blood_pressure(value: &FeatureValue) -> bool {
    value.as_f64().is_some_and(|v| v > RESTING_BP_LIMIT)
}

fn low_max_hr(value: &FeatureValue) -> bool {
    value.as_f64().is_some_and(|v| v < MAX_HR_FLOOR)
}

fn exercise_angina(value: &FeatureValue) -> bool {
    match value {
        FeatureValue::Text(s) => s == "Y",
        FeatureValue::Bool(b) => *b,
        FeatureValue::Number(_) => false,
    }
}

/// Risk factors triggered by a record's raw values, in fixed order.
///
/// Fields that are absent or not comparable never trigger.
pub fn explain<'a, I>(fields: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, &'a FeatureValue)>,
{
    let fields: Vec<(&str, &FeatureValue)> = fields.into_iter().collect();

    RISK_FACTORS
        .iter()
        .filter(|(name, check, _)| {
            fields
                .iter()
                .find(|(field, _)| field == name)
                .is_some_and(|(_, value)| check(*value))
        })
        .map(|(_, _, description)| description.to_string())
        .collect()
}

/// One-line summary of `factors`.
pub fn summarize(factors: &[String]) -> String {
    if factors.is_empty() {
        NO_RISK_FACTORS.to_string()
    } else {
        factors.join(" & ")
    }
}
