// Strict JSON extraction from model replies
//
// Models wrap JSON in prose or code fences. We slice out the first object
// and parse it. Retrying is the caller's job.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Objects with at most one level of nested objects, shortest first.
static SHALLOW_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}").expect("valid shallow-object regex")
});

/// Greedy fallback: first `{` to last `}`.
static GREEDY_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid greedy-object regex"));

#[derive(Debug, thiserror::Error)]
pub enum JsonExtractError {
    #[error("No JSON object found in text")]
    NoObject,

    #[error("JSON parsing failed: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Locate the first `{...}` object in `text` and parse it.
pub fn extract_json_object(text: &str) -> Result<Value, JsonExtractError> {
    let found = SHALLOW_OBJECT
        .find(text)
        .or_else(|| GREEDY_OBJECT.find(text))
        .ok_or(JsonExtractError::NoObject)?;

    Ok(serde_json::from_str(found.as_str())?)
}

/// Extract the first object and deserialize it into `T`.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, JsonExtractError> {
    let value = extract_json_object(text)?;
    Ok(serde_json::from_value(value)?)
}
