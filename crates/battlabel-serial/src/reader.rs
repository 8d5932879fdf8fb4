use crate::transport::Transport;
use battlabel_core::{RawChunk, TransportError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const READ_BUFFER_SIZE: usize = 256;

/// Pause between empty reads, so transports without a blocking timeout
/// don't spin.
const IDLE_BACKOFF: Duration = Duration::from_millis(5);

static NEXT_READER_ID: AtomicU64 = AtomicU64::new(1);

/// A transport failure, tagged with the reader that hit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderError {
    pub reader: u64,
    pub error: TransportError,
}

// ── SerialReader ───────────────────────────────────────────────

pub struct SerialReader {
    id: u64,
    transport: Box<dyn Transport>,
    chunk_tx: mpsc::UnboundedSender<RawChunk>,
    error_tx: Option<mpsc::UnboundedSender<ReaderError>>,
}

impl SerialReader {
    pub fn new(
        transport: Box<dyn Transport>,
        chunk_tx: mpsc::UnboundedSender<RawChunk>,
        error_tx: Option<mpsc::UnboundedSender<ReaderError>>,
    ) -> Self {
        Self {
            id: NEXT_READER_ID.fetch_add(1, Ordering::Relaxed),
            transport,
            chunk_tx,
            error_tx,
        }
    }

    /// Read until `running` is cleared, the chunk receiver goes away, or the
    /// transport fails.
    pub fn run(&mut self, running: Arc<AtomicBool>) {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        while running.load(Ordering::Relaxed) {
            match self.transport.read_available(&mut buf) {
                Ok(0) => std::thread::sleep(IDLE_BACKOFF),
                Ok(n) => {
                    tracing::trace!(port = %self.transport.name(), "read {n} bytes");
                    if self.chunk_tx.send(RawChunk::new(&buf[..n])).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(port = %self.transport.name(), "serial read failed: {e}");
                    if let Some(ref tx) = self.error_tx {
                        let _ = tx.send(ReaderError {
                            reader: self.id,
                            error: e,
                        });
                    }
                    break;
                }
            }
        }
        tracing::debug!(port = %self.transport.name(), "serial reader stopped");
    }

    /// Spawn the reader on a dedicated thread. Consumes self.
    pub fn start(mut self) -> Result<ReaderHandle, TransportError> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let id = self.id;
        let port = self.transport.name().to_string();
        let thread = std::thread::Builder::new()
            .name("serial-reader".into())
            .spawn(move || self.run(flag))
            .map_err(|e| TransportError::Io(format!("failed to spawn reader thread: {}", e)))?;
        Ok(ReaderHandle {
            id,
            running,
            thread: Some(thread),
            port,
        })
    }
}

// ── ReaderHandle ───────────────────────────────────────────────

pub struct ReaderHandle {
    id: u64,
    running: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
    port: String,
}

impl ReaderHandle {
    /// Matches the `reader` tag on errors this reader sends.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Signal the reader thread to stop and wait for it to finish. The port
    /// is closed when the thread drops its transport.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(t) = self.thread.take() {
            if t.join().is_err() {
                tracing::error!(port = %self.port, "serial reader thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct ScriptedTransport {
        script: VecDeque<Result<Vec<u8>, TransportError>>,
    }

    impl ScriptedTransport {
        fn boxed(script: Vec<Result<Vec<u8>, TransportError>>) -> Box<dyn Transport> {
            Box::new(Self {
                script: script.into(),
            })
        }
    }

    impl Transport for ScriptedTransport {
        fn name(&self) -> &str {
            "scripted"
        }

        fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
            match self.script.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    #[test]
    fn test_reader_forwards_chunks_in_order() {
        let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel();
        let transport = ScriptedTransport::boxed(vec![
            Ok(b"MACADDRESS:".to_vec()),
            Ok(Vec::new()),
            Ok(b"AA:BB".to_vec()),
        ]);
        let handle = SerialReader::new(transport, chunk_tx, None).start().unwrap();
        assert_eq!(handle.port(), "scripted");

        let first = chunk_rx.blocking_recv().unwrap();
        let second = chunk_rx.blocking_recv().unwrap();
        assert_eq!(first.bytes, b"MACADDRESS:");
        assert_eq!(second.bytes, b"AA:BB");

        handle.stop();
    }

    #[test]
    fn test_reader_reports_error_and_exits() {
        let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel();
        let (error_tx, mut error_rx) = mpsc::unbounded_channel();
        let transport = ScriptedTransport::boxed(vec![
            Ok(b"BATT:".to_vec()),
            Err(TransportError::Disconnected),
        ]);
        let handle = SerialReader::new(transport, chunk_tx, Some(error_tx))
            .start()
            .unwrap();

        assert_eq!(chunk_rx.blocking_recv().unwrap().bytes, b"BATT:");
        let failure = error_rx.blocking_recv().unwrap();
        assert_eq!(failure.error, TransportError::Disconnected);
        assert_eq!(failure.reader, handle.id());
        // The thread dropped its sender on exit.
        assert!(chunk_rx.blocking_recv().is_none());
        handle.stop();
    }

    #[test]
    fn test_reader_stops_when_receiver_dropped() {
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        drop(chunk_rx);
        let transport = ScriptedTransport::boxed(vec![Ok(b"x".to_vec())]);
        let handle = SerialReader::new(transport, chunk_tx, None).start().unwrap();
        for _ in 0..200 {
            if handle.is_finished() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(handle.is_finished());
        handle.stop();
    }

    #[test]
    fn test_reader_stop_joins_idle_thread() {
        let (chunk_tx, _chunk_rx) = mpsc::unbounded_channel();
        let handle = SerialReader::new(ScriptedTransport::boxed(Vec::new()), chunk_tx, None)
            .start()
            .unwrap();
        assert!(!handle.is_finished());
        handle.stop();
    }

    #[test]
    fn test_readers_get_distinct_ids() {
        let (chunk_tx, _chunk_rx) = mpsc::unbounded_channel();
        let first = SerialReader::new(ScriptedTransport::boxed(Vec::new()), chunk_tx.clone(), None)
            .start()
            .unwrap();
        let second = SerialReader::new(ScriptedTransport::boxed(Vec::new()), chunk_tx, None)
            .start()
            .unwrap();
        assert_ne!(first.id(), second.id());
        first.stop();
        second.stop();
    }
}
