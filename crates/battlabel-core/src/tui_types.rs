use crate::error::{MalformedReason, TransportError};
use crate::types::{LabelPayload, MissingInput, OperatorInputs, Outcome, ParsedRecord, PrintReport};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected {
        port: String,
    },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// One-line message shown to the operator until the next frame starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Red-highlight flags on operator fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cues {
    pub lot_missing: bool,
    pub product_missing: bool,
    pub voltage_rejected: bool,
}

/// Aggregate session state broadcast to the TUI via watch channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub connection: ConnectionState,
    pub ports: Vec<String>,
    /// Raw identifier and voltage text of the frame being shown.
    pub reading: Option<ParsedRecord>,
    pub cues: Cues,
    pub notice: Option<Notice>,
    pub last_label: Option<LabelPayload>,
    pub accepted: u32,
    pub rejected: u32,
    pub printed: u32,
}

/// State changes published by the controller, printer host and main loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PortsListed(Vec<String>),
    Connected(String),
    Disconnected,
    TransportFailed(TransportError),
    FrameStarted,
    RecordDecoded(ParsedRecord),
    Outcome(Outcome),
    /// An accepted reading whose label could not be rendered.
    LabelFailed { identifier: String, message: String },
    Printed(PrintReport),
}

impl SessionState {
    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::PortsListed(ports) => self.ports = ports,
            SessionEvent::Connected(port) => {
                self.connection = ConnectionState::Connected { port };
                self.notice = None;
            }
            SessionEvent::Disconnected => self.connection = ConnectionState::Disconnected,
            SessionEvent::TransportFailed(err) => {
                self.connection = ConnectionState::Disconnected;
                self.notice = Some(Notice::error(transport_message(&err)));
            }
            SessionEvent::FrameStarted => {
                self.reading = None;
                self.cues = Cues::default();
                self.notice = None;
            }
            SessionEvent::RecordDecoded(record) => self.reading = Some(record),
            SessionEvent::Outcome(outcome) => self.apply_outcome(outcome),
            SessionEvent::LabelFailed {
                identifier,
                message,
            } => {
                self.notice = Some(Notice::error(format!(
                    "Label for {} could not be created: {}",
                    identifier, message
                )));
            }
            SessionEvent::Printed(report) => match report.error {
                None => self.printed += 1,
                Some(err) => {
                    self.notice = Some(Notice::error(format!(
                        "Printer '{}' failed for {}: {}",
                        report.printer, report.identifier, err
                    )));
                }
            },
        }
    }

    fn apply_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Accepted(payload) => {
                self.accepted += 1;
                self.notice = Some(Notice::info(format!(
                    "Accepted {} at {} mV",
                    payload.identifier, payload.voltage
                )));
                self.last_label = Some(payload);
            }
            Outcome::RejectedOutOfRange { .. } => {
                self.rejected += 1;
                self.cues.voltage_rejected = true;
            }
            Outcome::RejectedMissingInput(MissingInput::LotNumber) => {
                self.cues.lot_missing = true;
                self.notice = Some(Notice::error("Please specify a lot number!"));
            }
            Outcome::RejectedMissingInput(MissingInput::ProductType) => {
                self.cues.product_missing = true;
                self.notice = Some(Notice::error("Please select a product type!"));
            }
            Outcome::Malformed(MalformedReason::NonNumericWindowBound) => {
                self.notice = Some(Notice::error(
                    "Specified voltage range was not an integer value!",
                ));
            }
            Outcome::Malformed(reason) => {
                self.notice = Some(Notice::error(format!(
                    "The data transmission was interrupted or corrupt ({}). Please try again.",
                    reason
                )));
            }
            Outcome::Ignored => {}
        }
    }
}

fn transport_message(err: &TransportError) -> String {
    match err {
        TransportError::PortNotFound(port) => format!("Port not found: {}", port),
        TransportError::PortInUse(port) => format!("Port {} already in use!", port),
        other => other.to_string(),
    }
}

/// Commands sent from TUI → main via mpsc channel.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    SetInputs(OperatorInputs),
    Connect { port: String },
    Disconnect,
    RefreshPorts,
    Quit,
}
