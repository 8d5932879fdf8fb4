use crate::transport::{classify_open_error, SerialTransport};
use battlabel_core::config::SerialConfig;
use battlabel_core::TransportError;
use serialport::{DataBits, FlowControl, Parity, StopBits};

pub struct PortManager;

impl PortManager {
    pub fn new() -> Self {
        Self
    }

    pub fn list_ports(&self) -> Result<Vec<String>, TransportError> {
        let ports = serialport::available_ports()
            .map_err(|e| TransportError::Io(format!("could not enumerate serial ports: {}", e)))?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }

    /// Opens `name` as 8N1 without flow control. Only the read timeout is
    /// applied; the fixture is never written to.
    pub fn open(&self, name: &str, config: &SerialConfig) -> Result<SerialTransport, TransportError> {
        if name.trim().is_empty() {
            return Err(TransportError::PortNotFound(name.to_string()));
        }

        let port = serialport::new(name, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout())
            .open()
            .map_err(|e| classify_open_error(name, &e))?;

        tracing::info!(
            "opened {} at {} baud (8N1, read timeout {} ms)",
            name,
            config.baud_rate,
            config.read_timeout_ms
        );
        Ok(SerialTransport::new(name, port))
    }
}

impl Default for PortManager {
    fn default() -> Self {
        Self::new()
    }
}
