//! Validation of inbound frames from the EEG analysis service.
//!
//! The service pushes JSON text frames shaped
//! `{ "concentration"?: number, "eeg_status"?: string }`. [`parse`] turns one
//! frame into a [`Reading`], dropping each malformed portion independently:
//! a bad concentration does not discard a good status and vice versa. Frames
//! that are not JSON objects are rejected as a whole.

use serde_json::Value;

use crate::models::Reading;

/// Lower bound of the concentration scale.
pub const CONCENTRATION_MIN: f64 = 0.0;
/// Upper bound of the concentration scale.
pub const CONCENTRATION_MAX: f64 = 100.0;

/// Why a frame produced no reading at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The frame is not valid JSON.
    NotJson(String),
    /// The frame is valid JSON but not an object.
    NotAnObject,
    /// Neither a usable concentration nor a usable status was present.
    Empty,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::NotJson(e) => write!(f, "not JSON: {e}"),
            Rejection::NotAnObject => f.write_str("payload is not a JSON object"),
            Rejection::Empty => f.write_str("payload carries no usable field"),
        }
    }
}

/// Parse and validate a raw text frame.
pub fn parse(raw: &str) -> Result<Reading, Rejection> {
    let value: Value = serde_json::from_str(raw).map_err(|e| Rejection::NotJson(e.to_string()))?;
    let obj = value.as_object().ok_or(Rejection::NotAnObject)?;

    let concentration = match obj.get("concentration") {
        Some(v) => {
            let coerced = coerce_concentration(v);
            if coerced.is_none() {
                tracing::debug!(value = %v, "discarding non-numeric concentration");
            }
            coerced
        }
        None => None,
    };

    let device_status = match obj.get("eeg_status") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            tracing::debug!(value = %other, "discarding non-string eeg_status");
            None
        }
        None => None,
    };

    if concentration.is_none() && device_status.is_none() {
        return Err(Rejection::Empty);
    }

    Ok(Reading {
        concentration,
        device_status,
    })
}

/// Coerce a JSON value to a concentration percentage.
///
/// Numbers and numeric strings are accepted; anything else, including
/// non-finite results, yields `None`. Out-of-range values are clamped.
fn coerce_concentration(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    Some(n.clamp(CONCENTRATION_MIN, CONCENTRATION_MAX))
}
