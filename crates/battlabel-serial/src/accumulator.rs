//! Quiet-timer framing of the fixture's byte stream.
//!
//! The fixture sends one record in several bursts and then goes quiet. A frame
//! is everything received within a fixed delay of its first byte; later bytes
//! extend the frame but never push the deadline out.

use battlabel_core::RawChunk;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// First bytes of a new frame arrived; stale display state can be cleared.
    Started,
    /// The quiet timer fired; carries the whole frame text.
    Completed(String),
}

/// ASCII-decodes a chunk and strips all whitespace. Bytes outside ASCII
/// become `?`.
pub fn decode_chunk(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .filter(|c| !c.is_ascii_whitespace())
        .collect()
}

pub struct FrameAccumulator {
    buffer: String,
    deadline: Option<Instant>,
    timeout: Duration,
}

impl FrameAccumulator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            buffer: String::new(),
            deadline: None,
            timeout,
        }
    }

    /// Appends a chunk. Returns `true` when this chunk started a new frame
    /// and armed the timer.
    pub fn append(&mut self, chunk: &RawChunk, now: Instant) -> bool {
        let text = decode_chunk(&chunk.bytes);
        if text.is_empty() {
            return false;
        }
        let started = self.buffer.is_empty();
        if started {
            self.deadline = Some(now + self.timeout);
        }
        self.buffer.push_str(&text);
        started
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn pending(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Takes the frame if its deadline has passed, disarming the timer.
    pub fn poll_expired(&mut self, now: Instant) -> Option<String> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                Some(std::mem::take(&mut self.buffer))
            }
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.deadline = None;
    }
}

/// Drives a [`FrameAccumulator`] from a chunk channel until the channel
/// closes. A partial frame left at close is dropped.
pub async fn run_accumulator(
    mut accumulator: FrameAccumulator,
    mut chunk_rx: mpsc::UnboundedReceiver<RawChunk>,
    frame_tx: mpsc::UnboundedSender<FrameEvent>,
) {
    loop {
        let deadline = accumulator.deadline();
        tokio::select! {
            chunk = chunk_rx.recv() => {
                match chunk {
                    Some(chunk) => {
                        if accumulator.append(&chunk, Instant::now())
                            && frame_tx.send(FrameEvent::Started).is_err()
                        {
                            break;
                        }
                    }
                    None => {
                        if !accumulator.is_empty() {
                            tracing::debug!(
                                "transport closed, dropping partial frame: {:?}",
                                accumulator.pending()
                            );
                        }
                        accumulator.reset();
                        break;
                    }
                }
            }
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some(text) = accumulator.poll_expired(Instant::now()) {
                    tracing::debug!("frame complete: {:?}", text);
                    if frame_tx.send(FrameEvent::Completed(text)).is_err() {
                        break;
                    }
                }
            }
        }
    }
}

pub fn spawn_accumulator(
    timeout: Duration,
    chunk_rx: mpsc::UnboundedReceiver<RawChunk>,
    frame_tx: mpsc::UnboundedSender<FrameEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run_accumulator(
        FrameAccumulator::new(timeout),
        chunk_rx,
        frame_tx,
    ))
}
