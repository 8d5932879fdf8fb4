use battlabel_core::validate::Reading;
use battlabel_core::{
    parse_record, validate, LabelPayload, MalformedReason, MissingInput, OperatorInputs, Outcome,
    SessionEvent, ValidationError, ValidationPolicy, Verdict,
};
use battlabel_label::{LabelComposer, LabelJob};
use battlabel_serial::FrameEvent;
use chrono::NaiveDate;
use tokio::sync::{mpsc, watch};

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn rejection(err: ValidationError) -> Outcome {
    match err {
        ValidationError::MissingLotNumber => Outcome::RejectedMissingInput(MissingInput::LotNumber),
        ValidationError::MissingProductType => {
            Outcome::RejectedMissingInput(MissingInput::ProductType)
        }
        ValidationError::NonNumericVoltage => Outcome::Malformed(MalformedReason::NonNumericVoltage),
        ValidationError::NonNumericWindowBound => {
            Outcome::Malformed(MalformedReason::NonNumericWindowBound)
        }
    }
}

/// Runs each completed frame through parse → validate → compose and hands
/// accepted labels to the printer host.
///
/// Operator inputs are snapshotted from the watch channel once per frame, so a
/// frame is judged against one consistent set of inputs.
pub struct SessionController {
    policy: ValidationPolicy,
    composer: LabelComposer,
    inputs_rx: watch::Receiver<OperatorInputs>,
    job_tx: mpsc::UnboundedSender<LabelJob>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    today: fn() -> NaiveDate,
}

impl SessionController {
    pub fn new(
        policy: ValidationPolicy,
        composer: LabelComposer,
        inputs_rx: watch::Receiver<OperatorInputs>,
        job_tx: mpsc::UnboundedSender<LabelJob>,
        event_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            policy,
            composer,
            inputs_rx,
            job_tx,
            event_tx,
            today: local_today,
        }
    }

    /// Replaces the label date source (local calendar date by default).
    pub fn with_date_source(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    pub fn handle_event(&self, event: FrameEvent) -> Option<Outcome> {
        match event {
            FrameEvent::Started => {
                self.emit(SessionEvent::FrameStarted);
                None
            }
            FrameEvent::Completed(text) => Some(self.handle_frame(&text)),
        }
    }

    /// Processes one completed frame and publishes its outcome.
    pub fn handle_frame(&self, text: &str) -> Outcome {
        let outcome = self.evaluate(text);
        if matches!(outcome, Outcome::Ignored) {
            return outcome;
        }
        self.emit(SessionEvent::Outcome(outcome.clone()));
        if let Outcome::Accepted(ref payload) = outcome {
            self.dispatch(payload.clone());
        }
        outcome
    }

    fn evaluate(&self, text: &str) -> Outcome {
        let record = match parse_record(text) {
            Ok(record) => record,
            Err(frame) if frame.benign => {
                tracing::debug!("ignoring fixture noise: {:?}", text);
                return Outcome::Ignored;
            }
            Err(frame) => {
                tracing::warn!("malformed frame ({}): {:?}", frame.reason, text);
                return Outcome::Malformed(frame.reason);
            }
        };
        self.emit(SessionEvent::RecordDecoded(record.clone()));

        let inputs = self.inputs_rx.borrow().clone();
        let reading = match validate(&record, &inputs, &self.policy) {
            Ok(Verdict::Accepted(reading)) => reading,
            Ok(Verdict::OutOfRange(reading)) => {
                tracing::warn!(
                    identifier = %reading.identifier,
                    "voltage {} mV outside ({}, {})",
                    reading.voltage,
                    reading.window.min_voltage,
                    reading.window.max_voltage
                );
                return Outcome::RejectedOutOfRange {
                    identifier: reading.identifier,
                    voltage: reading.voltage,
                    window: reading.window,
                };
            }
            Err(e) => {
                tracing::warn!(identifier = %record.identifier, "reading rejected: {e}");
                return rejection(e);
            }
        };

        Outcome::Accepted(self.label_payload(&reading, &inputs))
    }

    fn label_payload(&self, reading: &Reading, inputs: &OperatorInputs) -> LabelPayload {
        let payload = self.composer.payload(reading, inputs, (self.today)());
        tracing::info!(
            identifier = %payload.identifier,
            "accepted at {} mV, lot {}",
            payload.voltage,
            payload.lot_number
        );
        payload
    }

    fn dispatch(&self, payload: LabelPayload) {
        let identifier = payload.identifier.clone();
        match self.composer.render(payload) {
            Ok(job) => {
                if self.job_tx.send(job).is_err() {
                    tracing::error!("printer host is gone, label for {} dropped", identifier);
                }
            }
            Err(e) => {
                tracing::error!(identifier = %identifier, "label rendering failed: {e}");
                self.emit(SessionEvent::LabelFailed {
                    identifier,
                    message: e.to_string(),
                });
            }
        }
    }

    /// Consumes frame events until the accumulator side closes.
    pub async fn run(self, mut frame_rx: mpsc::UnboundedReceiver<FrameEvent>) {
        while let Some(event) = frame_rx.recv().await {
            self.handle_event(event);
        }
        tracing::debug!("frame channel closed, controller stopped");
    }

    pub fn spawn(
        self,
        frame_rx: mpsc::UnboundedReceiver<FrameEvent>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(frame_rx))
    }
}
