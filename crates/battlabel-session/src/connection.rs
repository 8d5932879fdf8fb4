use battlabel_core::config::SerialConfig;
use battlabel_core::TransportError;
use battlabel_serial::{
    spawn_accumulator, FrameEvent, PortManager, ReaderError, ReaderHandle, SerialReader, Transport,
};
use std::time::Duration;
use tokio::sync::mpsc;

/// One live fixture connection: a reader thread feeding a frame accumulator
/// task. Frames go to the shared controller channel, so the controller
/// outlives individual connections.
pub struct Connection {
    reader: ReaderHandle,
    accumulator: tokio::task::JoinHandle<()>,
}

impl Connection {
    /// Opens `port` with the configured line settings and starts reading.
    pub fn open(
        ports: &PortManager,
        port: &str,
        config: &SerialConfig,
        frame_tx: mpsc::UnboundedSender<FrameEvent>,
        error_tx: mpsc::UnboundedSender<ReaderError>,
    ) -> Result<Self, TransportError> {
        let transport = ports.open(port, config)?;
        Self::attach(Box::new(transport), config.frame_timeout(), frame_tx, error_tx)
    }

    /// Starts reading from an already-open transport.
    pub fn attach(
        transport: Box<dyn Transport>,
        frame_timeout: Duration,
        frame_tx: mpsc::UnboundedSender<FrameEvent>,
        error_tx: mpsc::UnboundedSender<ReaderError>,
    ) -> Result<Self, TransportError> {
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        let reader = SerialReader::new(transport, chunk_tx, Some(error_tx)).start()?;
        let accumulator = spawn_accumulator(frame_timeout, chunk_rx, frame_tx);
        tracing::info!(port = %reader.port(), "fixture connected");
        Ok(Self {
            reader,
            accumulator,
        })
    }

    pub fn port(&self) -> &str {
        self.reader.port()
    }

    /// Whether `failure` came from this connection's reader rather than one
    /// that has since been closed.
    pub fn raised(&self, failure: &ReaderError) -> bool {
        failure.reader == self.reader.id()
    }

    /// Stops the reader, releasing the port, and waits for the accumulator to
    /// drain. Any partial frame is discarded.
    pub async fn close(self) {
        let port = self.reader.port().to_string();
        let reader = self.reader;
        if tokio::task::spawn_blocking(move || reader.stop()).await.is_err() {
            tracing::error!(port = %port, "failed to join serial reader");
        }
        let _ = self.accumulator.await;
        tracing::info!(port = %port, "fixture disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct ScriptedTransport {
        reads: VecDeque<Result<Vec<u8>, TransportError>>,
    }

    impl Transport for ScriptedTransport {
        fn name(&self) -> &str {
            "scripted"
        }

        fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
            std::thread::sleep(Duration::from_millis(5));
            match self.reads.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    fn scripted(reads: Vec<Result<Vec<u8>, TransportError>>) -> Box<dyn Transport> {
        Box::new(ScriptedTransport {
            reads: reads.into(),
        })
    }

    #[test]
    fn test_open_empty_port_name_fails() {
        let (frame_tx, _frame_rx) = mpsc::unbounded_channel();
        let (error_tx, _error_rx) = mpsc::unbounded_channel();
        let result = Connection::open(
            &PortManager::new(),
            "",
            &SerialConfig::default(),
            frame_tx,
            error_tx,
        );
        assert!(matches!(result, Err(TransportError::PortNotFound(_))));
    }

    #[tokio::test]
    async fn test_attach_delivers_frames() {
        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();
        let (error_tx, _error_rx) = mpsc::unbounded_channel();
        let conn = Connection::attach(
            scripted(vec![Ok(b"MACADDRESS:AA BATT:1".to_vec())]),
            Duration::from_millis(50),
            frame_tx,
            error_tx,
        )
        .unwrap();
        assert_eq!(conn.port(), "scripted");

        let timeout = Duration::from_secs(2);
        let first = tokio::time::timeout(timeout, frame_rx.recv()).await.unwrap();
        assert_eq!(first, Some(FrameEvent::Started));
        let second = tokio::time::timeout(timeout, frame_rx.recv()).await.unwrap();
        assert_eq!(
            second,
            Some(FrameEvent::Completed("MACADDRESS:AABATT:1".to_string()))
        );

        tokio::time::timeout(timeout, conn.close())
            .await
            .expect("close timed out");
    }

    #[tokio::test]
    async fn test_transport_failure_reported() {
        let (frame_tx, _frame_rx) = mpsc::unbounded_channel();
        let (error_tx, mut error_rx) = mpsc::unbounded_channel();
        let conn = Connection::attach(
            scripted(vec![Err(TransportError::Disconnected)]),
            Duration::from_millis(50),
            frame_tx,
            error_tx,
        )
        .unwrap();

        let failure = tokio::time::timeout(Duration::from_secs(2), error_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(failure.error, TransportError::Disconnected);
        assert!(conn.raised(&failure));
        conn.close().await;
    }

    #[tokio::test]
    async fn test_failure_from_closed_connection_not_claimed() {
        let (frame_tx, _frame_rx) = mpsc::unbounded_channel();
        let (error_tx, mut error_rx) = mpsc::unbounded_channel();
        let old = Connection::attach(
            scripted(vec![Err(TransportError::Io("unplugged".into()))]),
            Duration::from_millis(50),
            frame_tx.clone(),
            error_tx.clone(),
        )
        .unwrap();
        let failure = tokio::time::timeout(Duration::from_secs(2), error_rx.recv())
            .await
            .unwrap()
            .unwrap();
        old.close().await;

        // Same port name, new reader.
        let new = Connection::attach(
            scripted(Vec::new()),
            Duration::from_millis(50),
            frame_tx,
            error_tx,
        )
        .unwrap();
        assert_eq!(new.port(), "scripted");
        assert!(!new.raised(&failure));
        new.close().await;
    }
}
