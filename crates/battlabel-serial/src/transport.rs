use battlabel_core::TransportError;
use serialport::SerialPort;
use std::io::{self, Read};

/// Byte source feeding the frame accumulator.
pub trait Transport: Send {
    /// Returns the port name, for logging.
    fn name(&self) -> &str;
    /// Reads whatever is available into `buf`. `Ok(0)` means nothing arrived
    /// within the read timeout.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;
}

pub struct SerialTransport {
    name: String,
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    pub fn new(name: &str, port: Box<dyn SerialPort>) -> Self {
        Self {
            name: name.to_string(),
            port,
        }
    }
}

impl Transport for SerialTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(ref e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {
                Ok(0)
            }
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                tracing::debug!(port = %self.name, "serial read: {e}");
                Err(TransportError::Disconnected)
            }
            Err(e) => Err(TransportError::Io(e.to_string())),
        }
    }
}

/// Maps a `serialport` open failure onto the operator-facing taxonomy.
pub(crate) fn classify_open_error(port: &str, err: &serialport::Error) -> TransportError {
    use serialport::ErrorKind;

    match err.kind() {
        ErrorKind::NoDevice | ErrorKind::InvalidInput => {
            TransportError::PortNotFound(port.to_string())
        }
        ErrorKind::Io(io::ErrorKind::NotFound) => TransportError::PortNotFound(port.to_string()),
        ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
            TransportError::PortInUse(port.to_string())
        }
        _ if err.description.to_lowercase().contains("busy") => {
            TransportError::PortInUse(port.to_string())
        }
        _ => TransportError::Io(format!("{}: {}", port, err.description)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::ErrorKind;

    #[test]
    fn test_classify_no_device() {
        let err = serialport::Error::new(ErrorKind::NoDevice, "gone");
        assert_eq!(
            classify_open_error("COM7", &err),
            TransportError::PortNotFound("COM7".into())
        );
    }

    #[test]
    fn test_classify_invalid_input_as_not_found() {
        let err = serialport::Error::new(ErrorKind::InvalidInput, "bad name");
        assert!(matches!(
            classify_open_error("", &err),
            TransportError::PortNotFound(_)
        ));
    }

    #[test]
    fn test_classify_permission_denied_as_in_use() {
        let err = serialport::Error::new(ErrorKind::Io(io::ErrorKind::PermissionDenied), "denied");
        assert_eq!(
            classify_open_error("/dev/ttyUSB0", &err),
            TransportError::PortInUse("/dev/ttyUSB0".into())
        );
    }

    #[test]
    fn test_classify_busy_description_as_in_use() {
        let err = serialport::Error::new(ErrorKind::Unknown, "Device or resource busy");
        assert!(matches!(
            classify_open_error("/dev/ttyUSB0", &err),
            TransportError::PortInUse(_)
        ));
    }

    #[test]
    fn test_classify_other_as_io() {
        let err = serialport::Error::new(ErrorKind::Unknown, "weird");
        match classify_open_error("/dev/ttyS1", &err) {
            TransportError::Io(msg) => assert!(msg.contains("weird")),
            other => panic!("expected Io, got {:?}", other),
        }
    }
}
