use crate::job::LabelJob;
use crate::qr::render_qr_png;
use battlabel_core::config::{LabelConfig, QrFormat};
use battlabel_core::validate::Reading;
use battlabel_core::{LabelError, LabelPayload, OperatorInputs};
use chrono::NaiveDate;
use std::fmt::Write;

const FALLBACK_DATE_FORMAT: &str = "%m/%d/%y";

fn display_product(name: &str, prefix: &str) -> String {
    let stripped = name.strip_prefix(prefix).unwrap_or(name).trim();
    if stripped.is_empty() {
        name.trim().to_string()
    } else {
        stripped.to_string()
    }
}

fn format_date(date: NaiveDate, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        tracing::warn!("invalid label date format {:?}, using {}", format, FALLBACK_DATE_FORMAT);
        out.clear();
        let _ = write!(out, "{}", date.format(FALLBACK_DATE_FORMAT));
    }
    out
}

/// Builds the label text and QR string for an accepted reading.
pub fn compose(
    identifier: &str,
    voltage: i32,
    product_type: Option<&str>,
    lot_number: &str,
    date: NaiveDate,
    settings: &LabelConfig,
) -> LabelPayload {
    let product = product_type
        .filter(|p| !p.trim().is_empty())
        .map(|p| display_product(p, &settings.product_prefix));
    let lot_number = lot_number.trim().to_string();
    let date = format_date(date, &settings.date_format);

    let mut text = format!("S/N: {}\n", identifier);
    if let Some(ref product) = product {
        let _ = writeln!(text, "Product: {}", product);
    }
    let _ = writeln!(text, "Customer/Lot: {}", lot_number);
    let _ = write!(text, "Date: {}", date);

    let qr_data = match settings.qr_format {
        QrFormat::Joined => format!("{}+{}", identifier, lot_number),
        QrFormat::Block => text.clone(),
    };

    LabelPayload {
        identifier: identifier.to_string(),
        voltage,
        product,
        lot_number,
        date,
        text,
        qr_data,
    }
}

/// Turns accepted readings into printable jobs.
#[derive(Debug, Clone)]
pub struct LabelComposer {
    settings: LabelConfig,
}

impl LabelComposer {
    pub fn new(settings: LabelConfig) -> Self {
        Self { settings }
    }

    /// Builds the label payload for an accepted reading.
    pub fn payload(&self, reading: &Reading, inputs: &OperatorInputs, date: NaiveDate) -> LabelPayload {
        compose(
            &reading.identifier,
            reading.voltage,
            inputs.product_type.as_deref(),
            &inputs.lot_number,
            date,
            &self.settings,
        )
    }

    /// Renders the QR image for `payload` and wraps both into a job.
    pub fn render(&self, payload: LabelPayload) -> Result<LabelJob, LabelError> {
        let png = render_qr_png(&payload.qr_data, self.settings.qr_size)?;
        Ok(LabelJob::new(payload, png))
    }

    pub fn compose_job(
        &self,
        reading: &Reading,
        inputs: &OperatorInputs,
        date: NaiveDate,
    ) -> Result<LabelJob, LabelError> {
        self.render(self.payload(reading, inputs, date))
    }
}
