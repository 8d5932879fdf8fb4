use crate::error::MalformedReason;

/// Bytes handed over by the transport in a single read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    pub bytes: Vec<u8>,
}

impl RawChunk {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

/// Identifier and voltage text cut out of one completed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub identifier: String,
    pub voltage: String,
}

/// Open voltage interval, in millivolts. Both bounds are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptanceWindow {
    pub min_voltage: i32,
    pub max_voltage: i32,
}

impl AcceptanceWindow {
    pub const DEFAULT_MIN_VOLTAGE: i32 = 3000;
    pub const DEFAULT_MAX_VOLTAGE: i32 = i32::MAX;

    pub fn contains(&self, voltage: i32) -> bool {
        self.min_voltage < voltage && voltage < self.max_voltage
    }
}

impl Default for AcceptanceWindow {
    fn default() -> Self {
        Self {
            min_voltage: Self::DEFAULT_MIN_VOLTAGE,
            max_voltage: Self::DEFAULT_MAX_VOLTAGE,
        }
    }
}

/// Operator-supplied values, snapshotted once per validated frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorInputs {
    pub lot_number: String,
    pub product_type: Option<String>,
    pub min_override: String,
    pub max_override: String,
}

/// Everything printed on one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPayload {
    pub identifier: String,
    pub voltage: i32,
    pub product: Option<String>,
    pub lot_number: String,
    pub date: String,
    /// Multi-line human-readable description.
    pub text: String,
    /// Exact string encoded into the QR symbol.
    pub qr_data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingInput {
    LotNumber,
    ProductType,
}

/// Terminal result of processing one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accepted(LabelPayload),
    RejectedOutOfRange {
        identifier: String,
        voltage: i32,
        window: AcceptanceWindow,
    },
    RejectedMissingInput(MissingInput),
    Malformed(MalformedReason),
    /// Fixture noise; nothing is shown to the operator.
    Ignored,
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted(_))
    }
}

/// Result of handing one label to one printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintReport {
    pub printer: String,
    pub identifier: String,
    pub error: Option<String>,
}
