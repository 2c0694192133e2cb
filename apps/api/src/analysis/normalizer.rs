//! Response normalizer: turns whatever the model wrote into an `AnalysisResult`.
//!
//! Never fails: unparseable output becomes a fixed fallback, missing fields
//! become "Not available", numeric fields fall back to 0.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::llm_client::strip_json_fences;

pub const NOT_AVAILABLE: &str = "Not available";
const BULLET: &str = "• ";

/// The six-field verdict returned to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub matching_analysis: String,
    pub description: String,
    pub score: u8,
    pub recommendation: String,
    #[serde(rename = "ats-friendly")]
    pub ats_friendly: u8,
    #[serde(rename = "ats-recommendation")]
    pub ats_recommendation: String,
}

impl AnalysisResult {
    /// Returned when the model's answer is not a JSON object.
    pub fn fallback() -> Self {
        AnalysisResult {
            matching_analysis: "Error processing response".to_string(),
            description: "Unable to analyze".to_string(),
            score: 0,
            recommendation: "Please try again".to_string(),
            ats_friendly: 0,
            ats_recommendation: "Please try again".to_string(),
        }
    }
}

/// Parses and sanitizes raw model output.
pub fn normalize_response(raw: &str) -> AnalysisResult {
    let body = strip_json_fences(raw);

    let fields = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(fields)) => fields,
        Ok(other) => {
            warn!("Model answered with non-object JSON ({})", json_kind(&other));
            return AnalysisResult::fallback();
        }
        Err(e) => {
            warn!("Model answer is not valid JSON: {e}");
            return AnalysisResult::fallback();
        }
    };

    AnalysisResult {
        matching_analysis: text_field(&fields, "matching_analysis"),
        description: text_field(&fields, "description"),
        score: score_field(&fields, "score"),
        recommendation: text_field(&fields, "recommendation"),
        ats_friendly: score_field(&fields, "ats-friendly"),
        ats_recommendation: text_field(&fields, "ats-recommendation"),
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    let raw = match fields.get(key) {
        None | Some(Value::Null) => return NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => other.to_string(),
    };
    format_bullets(&raw)
}

fn score_field(fields: &Map<String, Value>, key: &str) -> u8 {
    fields.get(key).map(coerce_score).unwrap_or(0)
}

/// Coerces a model-supplied score to 0–100. Accepts numbers and numeric
/// strings with an optional trailing `%`; anything else is 0.
pub fn coerce_score(value: &Value) -> u8 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            let s = s.strip_suffix('%').unwrap_or(s).trim();
            s.parse::<f64>().ok()
        }
        _ => None,
    };

    match parsed {
        Some(n) if n.is_finite() => n.trunc().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

/// One bullet per non-empty line, separated by a blank line.
/// `- x` becomes `• x`; lines without a bullet get one.
pub fn format_bullets(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if let Some(rest) = line.strip_prefix("- ") {
                format!("{BULLET}{rest}")
            } else if line.starts_with(BULLET) {
                line.to_string()
            } else {
                format!("{BULLET}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
