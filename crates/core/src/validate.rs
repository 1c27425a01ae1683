use serde_json::Value;
use thiserror::Error;

use crate::types::OcrResult;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Expected an array of OCR results, got {0}")]
    NotAnArray(&'static str),
    #[error("OCR result #{index} is malformed: {reason}")]
    Malformed { index: usize, reason: String },
    #[error("OCR result #{index} has invalid confidence {value}")]
    Confidence { index: usize, value: f64 },
    #[error("OCR result #{index} has an empty source")]
    EmptySource { index: usize },
}

/// Parse a JSON array of OCR results, rejecting anything that is not
/// shaped like one.
pub fn parse_results(json: &str) -> Result<Vec<OcrResult>, ValidationError> {
    let value: Value = serde_json::from_str(json)?;
    validate_results(value)
}

pub fn validate_results(value: Value) -> Result<Vec<OcrResult>, ValidationError> {
    let items = match value {
        Value::Array(items) => items,
        other => return Err(ValidationError::NotAnArray(kind(&other))),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| validate_one(index, item))
        .collect()
}

fn validate_one(index: usize, item: Value) -> Result<OcrResult, ValidationError> {
    let result: OcrResult = serde_json::from_value(item).map_err(|e| ValidationError::Malformed {
        index,
        reason: e.to_string(),
    })?;

    if !result.confidence.is_finite() || result.confidence < 0.0 {
        return Err(ValidationError::Confidence { index, value: result.confidence });
    }
    if result.source.to_string().trim().is_empty() {
        return Err(ValidationError::EmptySource { index });
    }
    Ok(result)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
