use crate::error::ValidationError;
use crate::types::{AcceptanceWindow, OperatorInputs, ParsedRecord};

/// Deployment-level validation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Window used when the operator leaves an override field empty.
    pub default_window: AcceptanceWindow,
    /// Whether a product type must be selected before labels can print.
    pub require_product_type: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub identifier: String,
    pub voltage: i32,
    pub window: AcceptanceWindow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted(Reading),
    OutOfRange(Reading),
}

/// Reorders a wire identifier (`AA:BB:CC:DD:EE:FF`) into label order
/// (`FFEEDDCCBBAA`).
pub fn normalize_identifier(raw: &str) -> String {
    let cleaned: String = raw.trim().chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
    cleaned.split(':').rev().collect()
}

fn parse_bound(text: &str, default: i32) -> Result<i32, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(default);
    }
    text.parse()
        .map_err(|_| ValidationError::NonNumericWindowBound)
}

/// Resolves the window from the operator's override strings, falling back to
/// the policy defaults for empty fields.
pub fn resolve_window(
    inputs: &OperatorInputs,
    policy: &ValidationPolicy,
) -> Result<AcceptanceWindow, ValidationError> {
    Ok(AcceptanceWindow {
        min_voltage: parse_bound(&inputs.min_override, policy.default_window.min_voltage)?,
        max_voltage: parse_bound(&inputs.max_override, policy.default_window.max_voltage)?,
    })
}

pub fn validate(
    record: &ParsedRecord,
    inputs: &OperatorInputs,
    policy: &ValidationPolicy,
) -> Result<Verdict, ValidationError> {
    let product_missing = inputs
        .product_type
        .as_deref()
        .map_or(true, |p| p.trim().is_empty());
    if policy.require_product_type && product_missing {
        return Err(ValidationError::MissingProductType);
    }
    if inputs.lot_number.trim().is_empty() {
        return Err(ValidationError::MissingLotNumber);
    }

    let voltage: i32 = record
        .voltage
        .trim()
        .parse()
        .map_err(|_| ValidationError::NonNumericVoltage)?;
    let window = resolve_window(inputs, policy)?;

    let reading = Reading {
        identifier: normalize_identifier(&record.identifier),
        voltage,
        window,
    };
    if window.contains(voltage) {
        Ok(Verdict::Accepted(reading))
    } else {
        Ok(Verdict::OutOfRange(reading))
    }
}
