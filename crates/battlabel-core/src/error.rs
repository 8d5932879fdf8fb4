use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("port not found: {0}")]
    PortNotFound(String),

    #[error("port already in use: {0}")]
    PortInUse(String),

    #[error("serial I/O error: {0}")]
    Io(String),

    #[error("transport disconnected")]
    Disconnected,
}

/// Why a completed frame could not be read as a measurement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("identifier marker missing")]
    MissingIdentifierMarker,

    #[error("voltage marker missing")]
    MissingVoltageMarker,

    #[error("markers out of order")]
    MarkersOutOfOrder,

    #[error("non-numeric voltage")]
    NonNumericVoltage,

    #[error("non-numeric window bound")]
    NonNumericWindowBound,
}

/// A frame that failed to parse. `benign` frames carry the fixture's
/// heartbeat/noise signature and are dropped without telling the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed frame: {reason}")]
pub struct MalformedFrame {
    pub reason: MalformedReason,
    pub benign: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please specify a lot number")]
    MissingLotNumber,

    #[error("please select a product type")]
    MissingProductType,

    #[error("measured voltage is not an integer")]
    NonNumericVoltage,

    #[error("specified voltage range was not an integer value")]
    NonNumericWindowBound,
}

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("QR encoding failed: {0}")]
    QrEncode(String),

    #[error("QR symbol needs {modules} px but the label size is {size} px")]
    TargetTooSmall { modules: u32, size: u32 },

    #[error("image encoding failed: {0}")]
    ImageEncode(String),
}

#[derive(Debug, Error)]
pub enum PrinterError {
    #[error("printer initialization failed: {0}")]
    InitializationFailed(String),

    #[error("print failed: {0}")]
    PrintFailed(String),

    #[error("printer not found: {0}")]
    NotFound(String),

    #[error("label file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
