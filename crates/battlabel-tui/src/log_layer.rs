use std::collections::VecDeque;
use std::fmt::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::Subscriber;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Shared ring of formatted log lines shown in the logs tab.
pub type LogBuffer = Arc<Mutex<VecDeque<String>>>;

/// Captures log events as `HH:MM:SS LEVEL message key=value` lines into a
/// bounded buffer, dropping the oldest line when full.
pub struct TuiLogLayer {
    buffer: LogBuffer,
    capacity: usize,
}

impl TuiLogLayer {
    pub fn new(buffer: LogBuffer, capacity: usize) -> Self {
        Self { buffer, capacity }
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }
}

impl<S: Subscriber> Layer<S> for TuiLogLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let line = format!(
            "{} {:<5} {}{}",
            chrono::Local::now().format("%H:%M:%S"),
            event.metadata().level(),
            visitor.message,
            visitor.fields
        );

        if let Ok(mut buf) = self.buffer.lock() {
            while buf.len() >= self.capacity.max(1) {
                buf.pop_front();
            }
            buf.push_back(line);
        }
    }
}
