//! Extraction of identifier and voltage fields from a completed frame.
//!
//! A record looks like `MACADDRESS:AA:BB:CC:DD:EE:FFBATT:3500` once whitespace
//! has been stripped by the accumulator.

use crate::error::{MalformedFrame, MalformedReason};
use crate::types::ParsedRecord;

pub const IDENTIFIER_MARKER: &str = "MACADDRESS:";
pub const VOLTAGE_MARKER: &str = "BATT:";

const NOISE_SIGNATURES: [&str; 2] = ["?", "SENSOR"];

/// Returns `true` for frames the fixture emits between measurements.
pub fn is_noise(text: &str) -> bool {
    NOISE_SIGNATURES.iter().any(|sig| text.contains(sig))
}

pub fn parse_record(text: &str) -> Result<ParsedRecord, MalformedFrame> {
    let malformed = |reason| MalformedFrame {
        reason,
        benign: is_noise(text),
    };

    let id_start = text
        .find(IDENTIFIER_MARKER)
        .map(|pos| pos + IDENTIFIER_MARKER.len())
        .ok_or_else(|| malformed(MalformedReason::MissingIdentifierMarker))?;
    let volt_marker = text
        .find(VOLTAGE_MARKER)
        .ok_or_else(|| malformed(MalformedReason::MissingVoltageMarker))?;

    if volt_marker < id_start {
        return Err(malformed(MalformedReason::MarkersOutOfOrder));
    }

    Ok(ParsedRecord {
        identifier: text[id_start..volt_marker].to_string(),
        voltage: text[volt_marker + VOLTAGE_MARKER.len()..].to_string(),
    })
}
