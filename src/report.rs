//! Patient report rendering
//!
//! Turns one inference result into a plain-text document or an HTML page with
//! a coloured result card and a probability gauge.

use std::f64::consts::PI;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{FeatureContract, FeatureVector, PredictionResult};

pub const REPORT_TITLE: &str = "Heart Disease Prediction Report";

/// Gauge bands in percent, with their colours.
const GAUGE_BANDS: [(f64, f64, &str); 3] = [
    (0.0, 30.0, "green"),
    (30.0, 70.0, "yellow"),
    (70.0, 100.0, "red"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Html,
    Text,
}

impl ReportFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "html" => Some(ReportFormat::Html),
            "text" | "txt" => Some(ReportFormat::Text),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Html => "text/html; charset=utf-8",
            ReportFormat::Text => "text/plain; charset=utf-8",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Patient values in contract order
    pub patient: Vec<(String, String)>,
    pub result: PredictionResult,
}

impl Report {
    pub fn new(contract: &FeatureContract, vector: &FeatureVector, result: PredictionResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            patient: contract
                .entries(vector)
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            result,
        }
    }

    pub fn render(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Html => self.to_html(),
            ReportFormat::Text => self.to_text(),
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", REPORT_TITLE);
        let _ = writeln!(out, "Report ID: {}", self.id);
        let _ = writeln!(out, "Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
        let _ = writeln!(out);
        let _ = writeln!(out, "Patient Information:");
        for (name, value) in &self.patient {
            let _ = writeln!(out, "{}: {}", name, value);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Prediction: {}", self.result.diagnosis());
        let _ = writeln!(out, "Probability: {:.2}", self.result.probability);
        let _ = writeln!(out, "Risk Level: {}", self.result.risk);
        let _ = writeln!(out, "Explanation: {}", self.result.explanation());
        out
    }

    pub fn to_html(&self) -> String {
        let mut rows = String::new();
        for (name, value) in &self.patient {
            let _ = writeln!(
                rows,
                "<tr><th>{}</th><td>{}</td></tr>",
                escape_html(name),
                escape_html(value)
            );
        }

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body style="font-family: sans-serif; max-width: 720px; margin: 2em auto;">
<h1 style="color:#1976D2;">{title}</h1>
<p>Report ID: {id}<br>Generated: {generated}</p>
<div style="padding:15px; border-radius:10px; background-color:{color}; color:white;">
<h3>Prediction: {diagnosis}</h3>
<p><b>Probability:</b> {probability:.2}</p>
<p><b>Risk Level:</b> {risk}</p>
<p><b>Explanation:</b> {explanation}</p>
</div>
{gauge}
<h2>Patient Information</h2>
<table>
{rows}</table>
</body>
</html>
"#,
            title = REPORT_TITLE,
            id = self.id,
            generated = self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            color = self.result.risk.color(),
            diagnosis = self.result.diagnosis(),
            probability = self.result.probability,
            risk = self.result.risk,
            explanation = escape_html(&self.result.explanation()),
            gauge = gauge_svg(self.result.probability),
            rows = rows,
        )
    }
}

/// Half-circle gauge of `probability` as a percentage.
pub fn gauge_svg(probability: f64) -> String {
    const CX: f64 = 150.0;
    const CY: f64 = 150.0;
    const R: f64 = 120.0;

    let percent = (probability * 100.0).clamp(0.0, 100.0);
    let point = |pct: f64| {
        let angle = PI * (1.0 - pct / 100.0);
        (CX + R * angle.cos(), CY - R * angle.sin())
    };

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="300" height="190" viewBox="0 0 300 190" role="img" aria-label="Heart Disease Probability (%)">"#
    );
    for (from, to, color) in GAUGE_BANDS {
        let (x0, y0) = point(from);
        let (x1, y1) = point(to);
        let _ = writeln!(
            svg,
            r#"<path d="M {:.1} {:.1} A {R} {R} 0 0 1 {:.1} {:.1}" stroke="{}" stroke-width="24" fill="none"/>"#,
            x0, y0, x1, y1, color
        );
    }

    let (nx, ny) = point(percent);
    let _ = writeln!(
        svg,
        r#"<line x1="{CX}" y1="{CY}" x2="{:.1}" y2="{:.1}" stroke="red" stroke-width="4"/>"#,
        nx, ny
    );
    let _ = writeln!(
        svg,
        r#"<text x="{CX}" y="180" text-anchor="middle" font-size="22">{:.0}%</text>"#,
        percent
    );
    svg.push_str("</svg>");
    svg
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureValue;
    use crate::risk::RiskTier;

    fn report(probability: f64, risk: RiskTier, factors: Vec<String>) -> Report {
        let contract = FeatureContract::new(vec!["Age".into(), "Sex".into()]);
        let vector = FeatureVector::new(vec![
            FeatureValue::Number(54.0),
            FeatureValue::Text("<M>".into()),
        ]);
        Report::new(
            &contract,
            &vector,
            PredictionResult {
                label: u8::from(probability >= 0.5),
                probability,
                risk,
                risk_factors: factors,
            },
        )
    }

    #[test]
    fn test_text_report() {
        let text = report(0.8123, RiskTier::High, vec!["High Cholesterol".into()]).to_text();

        assert!(text.starts_with(REPORT_TITLE));
        assert!(text.contains("Age: 54\n"));
        assert!(text.contains("Prediction: Heart Disease\n"));
        assert!(text.contains("Probability: 0.81\n"));
        assert!(text.contains("Risk Level: High\n"));
        assert!(text.contains("Explanation: High Cholesterol\n"));
    }

    #[test]
    fn test_html_report_escapes_and_colours() {
        let html = report(0.1, RiskTier::Low, vec![]).to_html();

        assert!(html.contains("background-color:#4CAF50"));
        assert!(html.contains("&lt;M&gt;"));
        assert!(!html.contains("<M>"));
        assert!(html.contains("No major risk factors detected"));
        assert!(html.contains("<svg"));
    }

    #[test]
    fn test_gauge_has_three_bands_and_value() {
        let svg = gauge_svg(0.42);
        assert_eq!(svg.matches("<path").count(), 3);
        assert!(svg.contains(">42%</text>"));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ReportFormat::parse("HTML"), Some(ReportFormat::Html));
        assert_eq!(ReportFormat::parse("text"), Some(ReportFormat::Text));
        assert_eq!(ReportFormat::parse("pdf"), None);
    }
}
