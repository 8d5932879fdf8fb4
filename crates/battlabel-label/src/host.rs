use crate::job::LabelJob;
use crate::printer::Printer;
use crate::registry::PrinterRegistry;
use battlabel_core::{PrintReport, PrinterError};
use tokio::sync::mpsc;

/// Owns the configured printers and feeds every label job to each of them
/// from a background task.
pub struct PrinterHost {
    registry: PrinterRegistry,
    printers: Vec<Box<dyn Printer>>,
    job_rx: Option<mpsc::UnboundedReceiver<LabelJob>>,
    report_tx: Option<mpsc::UnboundedSender<PrintReport>>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl PrinterHost {
    pub fn new(
        job_rx: mpsc::UnboundedReceiver<LabelJob>,
        report_tx: Option<mpsc::UnboundedSender<PrintReport>>,
    ) -> Self {
        Self {
            registry: PrinterRegistry::new(),
            printers: Vec::new(),
            job_rx: Some(job_rx),
            report_tx,
            task_handle: None,
        }
    }

    pub fn registry_mut(&mut self) -> &mut PrinterRegistry {
        &mut self.registry
    }

    pub fn printer_count(&self) -> usize {
        self.printers.len()
    }

    pub async fn add_printer(
        &mut self,
        plugin_name: &str,
        config: toml::Value,
    ) -> Result<(), PrinterError> {
        let mut printer = self.registry.create(plugin_name)?;
        printer.initialize(config).await?;
        tracing::info!(printer = %plugin_name, "printer ready");
        self.printers.push(printer);
        Ok(())
    }

    pub fn start(&mut self) {
        let Some(mut rx) = self.job_rx.take() else {
            tracing::warn!("printer host already started");
            return;
        };
        let printers = std::mem::take(&mut self.printers);
        let report_tx = self.report_tx.take();

        let handle = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                for printer in &printers {
                    let result = printer.print(&job).await;
                    if let Err(ref e) = result {
                        tracing::error!(
                            identifier = %job.identifier(),
                            printer = %printer.name(),
                            "print failed: {e}"
                        );
                    } else {
                        tracing::info!(
                            identifier = %job.identifier(),
                            printer = %printer.name(),
                            "label printed"
                        );
                    }
                    if let Some(ref tx) = report_tx {
                        let _ = tx.send(PrintReport {
                            printer: printer.name().to_string(),
                            identifier: job.identifier().to_string(),
                            error: result.err().map(|e| e.to_string()),
                        });
                    }
                }
            }

            for printer in &printers {
                if let Err(e) = printer.shutdown().await {
                    tracing::warn!(printer = %printer.name(), "shutdown failed: {e}");
                }
            }
        });

        self.task_handle = Some(handle);
    }

    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            let _ = handle.await;
        }
    }
}
