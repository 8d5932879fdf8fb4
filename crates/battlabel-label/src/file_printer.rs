use crate::job::LabelJob;
use crate::printer::Printer;
use crate::spool::{spool_dir_from, write_spool_file, IMAGE_FILE_NAME, TEXT_FILE_NAME};
use async_trait::async_trait;
use battlabel_core::PrinterError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Drops each label into a spool directory as `qrcode.png` + `label.txt`,
/// replacing the previous label.
pub struct FilePrinter {
    spool_dir: Mutex<Option<PathBuf>>,
    print_count: AtomicUsize,
}

impl FilePrinter {
    pub fn new() -> Self {
        Self {
            spool_dir: Mutex::new(None),
            print_count: AtomicUsize::new(0),
        }
    }

    pub fn print_count(&self) -> usize {
        self.print_count.load(Ordering::Relaxed)
    }

    fn dir(&self) -> Option<PathBuf> {
        self.spool_dir.lock().ok().and_then(|g| g.clone())
    }
}

impl Default for FilePrinter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Printer for FilePrinter {
    fn name(&self) -> &str {
        "file"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), PrinterError> {
        let dir = spool_dir_from(&config)?;
        std::fs::create_dir_all(&dir)?;
        if let Ok(mut guard) = self.spool_dir.lock() {
            *guard = Some(dir);
        }
        Ok(())
    }

    async fn print(&self, job: &LabelJob) -> Result<(), PrinterError> {
        let dir = self
            .dir()
            .ok_or_else(|| PrinterError::PrintFailed("not initialized".to_string()))?;

        write_spool_file(&dir, IMAGE_FILE_NAME, &job.image_png)?;
        write_spool_file(&dir, TEXT_FILE_NAME, job.fields_text().as_bytes())?;

        self.print_count.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("spooled label {} to {}", job.identifier(), dir.display());
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        self.dir().is_some()
    }

    async fn shutdown(&self) -> Result<(), PrinterError> {
        Ok(())
    }
}
