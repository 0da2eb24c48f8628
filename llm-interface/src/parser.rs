//! Pull JSON out of free-form model output.
//!
//! Models are asked for bare JSON but routinely wrap it in markdown fences
//! or surround it with prose. Nothing here returns an error: text that does
//! not contain a JSON object comes back as `None` or as prose.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Strip a leading ```` ```json ```` or ```` ``` ```` fence and a trailing
/// ```` ``` ````, then trim.
pub fn strip_code_fences(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```JSON")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// The cleaned text as JSON, or failing that the span from the first `{`
/// to the last `}`.
pub fn parse_json(raw: &str) -> Option<Value> {
    let cleaned = strip_code_fences(raw);
    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        return Some(value);
    }

    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&cleaned[start..=end]) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Model output is not JSON: {}", e);
            None
        }
    }
}

/// [`parse_json`] followed by a typed conversion.
pub fn parse_json_as<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let value = parse_json(raw)?;
    serde_json::from_value(value)
        .map_err(|e| debug!("Model JSON does not match the expected shape: {}", e))
        .ok()
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisPayload {
    Structured(Value),
    Prose(String),
}

impl AnalysisPayload {
    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            AnalysisPayload::Structured(value) => Some(value),
            AnalysisPayload::Prose(_) => None,
        }
    }
}

pub fn parse_analysis(raw: &str) -> AnalysisPayload {
    match parse_json(raw) {
        Some(value) => AnalysisPayload::Structured(value),
        None => AnalysisPayload::Prose(raw.trim().to_string()),
    }
}
