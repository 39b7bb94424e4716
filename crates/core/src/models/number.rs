use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A numeric field as it arrives from a form or an older stored record:
/// either a JSON number or free text such as `"6,40"` or `""`.
///
/// The store accepts this and coerces it with [`NumberInput::coerce`];
/// form code that wants to reject bad input uses [`parse_decimal`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Number(f64),
    Text(String),
}

impl NumberInput {
    /// Coerce to a finite number. Anything unparseable becomes `0.0`.
    #[must_use]
    pub fn coerce(&self) -> f64 {
        match self {
            NumberInput::Number(n) if n.is_finite() => *n,
            NumberInput::Number(_) => 0.0,
            NumberInput::Text(s) => coerce_decimal(s),
        }
    }

    /// Strict variant of [`coerce`](Self::coerce).
    pub fn parse(&self) -> Result<f64, CoreError> {
        match self {
            NumberInput::Number(n) if n.is_finite() => Ok(*n),
            NumberInput::Number(n) => Err(CoreError::ValidationError(format!(
                "'{n}' is not a finite number"
            ))),
            NumberInput::Text(s) => parse_decimal(s),
        }
    }
}

impl From<f64> for NumberInput {
    fn from(n: f64) -> Self {
        NumberInput::Number(n)
    }
}

impl From<&str> for NumberInput {
    fn from(s: &str) -> Self {
        NumberInput::Text(s.to_string())
    }
}

impl From<String> for NumberInput {
    fn from(s: String) -> Self {
        NumberInput::Text(s)
    }
}

/// Parse a decimal typed by a user. Accepts a comma as the decimal separator.
///
/// Returns `CoreError::ValidationError` for empty, non-numeric or non-finite input.
pub fn parse_decimal(input: &str) -> Result<f64, CoreError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CoreError::ValidationError("number is empty".into()));
    }
    let normalized = trimmed.replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(CoreError::ValidationError(format!(
            "'{trimmed}' is not a valid number"
        ))),
    }
}

/// Store-boundary coercion: same rules as [`parse_decimal`], but failures become `0.0`.
#[must_use]
pub fn coerce_decimal(input: &str) -> f64 {
    parse_decimal(input).unwrap_or(0.0)
}

/// Coerce an arbitrary JSON value (number, numeric string, anything else) to a finite number.
#[must_use]
pub fn coerce_json(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0),
        serde_json::Value::String(s) => coerce_decimal(s),
        _ => 0.0,
    }
}
