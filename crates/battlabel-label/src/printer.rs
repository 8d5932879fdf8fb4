use crate::job::LabelJob;
use async_trait::async_trait;
use battlabel_core::PrinterError;

/// A label printer that receives filled-in label templates.
///
/// Implementations are registered via [`PrinterRegistry`](crate::PrinterRegistry)
/// and receive jobs through [`print`](Self::print).
#[async_trait]
pub trait Printer: Send + Sync {
    /// Returns the printer's plugin name (e.g. `"file"`, `"command"`).
    fn name(&self) -> &str;
    /// One-time initialisation with printer-specific TOML configuration.
    async fn initialize(&mut self, config: toml::Value) -> Result<(), PrinterError>;
    /// Print one label.
    async fn print(&self, job: &LabelJob) -> Result<(), PrinterError>;
    /// Returns `true` if the printer is currently able to accept jobs.
    fn is_healthy(&self) -> bool;
    /// Gracefully shut down the printer, releasing resources.
    async fn shutdown(&self) -> Result<(), PrinterError>;
}
