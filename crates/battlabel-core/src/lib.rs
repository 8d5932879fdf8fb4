pub mod config;
pub mod error;
pub mod record;
pub mod tui_types;
pub mod types;
pub mod validate;

pub use config::{AppConfig, QrFormat};
pub use error::{
    ConfigError, LabelError, MalformedFrame, MalformedReason, PrinterError, TransportError,
    ValidationError,
};
pub use record::parse_record;
pub use tui_types::{ConnectionState, SessionEvent, SessionState, UiCommand};
pub use types::{
    AcceptanceWindow, LabelPayload, MissingInput, OperatorInputs, Outcome, ParsedRecord,
    PrintReport, RawChunk,
};
pub use validate::{normalize_identifier, validate, ValidationPolicy, Verdict};
