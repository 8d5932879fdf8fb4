use battlabel_core::LabelPayload;

pub const FIELD_TEXT: &str = "TEXT";
pub const FIELD_BARCODE: &str = "BARCODE";
pub const FIELD_PRODUCT: &str = "PRODUCT";
pub const FIELD_LOT: &str = "LOT";
pub const FIELD_DATE: &str = "DATE";
pub const FIELD_DESCRIPTION: &str = "DESCRIPTION";
pub const FIELD_GRAPHIC: &str = "GRAPHIC";

/// A filled-in label template: named text fields plus the QR image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelJob {
    pub payload: LabelPayload,
    pub fields: Vec<(String, String)>,
    /// Name of the template's image field.
    pub image_field: String,
    pub image_png: Vec<u8>,
}

impl LabelJob {
    pub fn new(payload: LabelPayload, image_png: Vec<u8>) -> Self {
        let mut fields = vec![
            (FIELD_TEXT.to_string(), payload.identifier.clone()),
            (FIELD_BARCODE.to_string(), payload.qr_data.clone()),
        ];
        if let Some(ref product) = payload.product {
            fields.push((FIELD_PRODUCT.to_string(), product.clone()));
        }
        fields.push((FIELD_LOT.to_string(), payload.lot_number.clone()));
        fields.push((FIELD_DATE.to_string(), payload.date.clone()));
        fields.push((FIELD_DESCRIPTION.to_string(), payload.text.clone()));

        Self {
            payload,
            fields,
            image_field: FIELD_GRAPHIC.to_string(),
            image_png,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.payload.identifier
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Text fields rendered as `NAME=value` lines, with line breaks in values
    /// escaped.
    pub fn fields_text(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}={}\n", k, v.replace('\n', "\\n")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(product: Option<&str>) -> LabelPayload {
        LabelPayload {
            identifier: "FFEEDDCCBBAA".to_string(),
            voltage: 3500,
            product: product.map(str::to_string),
            lot_number: "42".to_string(),
            date: "03/07/26".to_string(),
            text: "S/N: FFEEDDCCBBAA\nCustomer/Lot: 42\nDate: 03/07/26".to_string(),
            qr_data: "FFEEDDCCBBAA+42".to_string(),
        }
    }

    #[test]
    fn test_job_fields() {
        let job = LabelJob::new(payload(None), vec![1, 2, 3]);
        assert_eq!(job.field(FIELD_TEXT), Some("FFEEDDCCBBAA"));
        assert_eq!(job.field(FIELD_BARCODE), Some("FFEEDDCCBBAA+42"));
        assert_eq!(job.field(FIELD_LOT), Some("42"));
        assert_eq!(job.field(FIELD_PRODUCT), None);
        assert_eq!(job.image_field, "GRAPHIC");
        assert_eq!(job.identifier(), "FFEEDDCCBBAA");
    }

    #[test]
    fn test_job_product_field_present_when_set() {
        let job = LabelJob::new(payload(Some("Pro")), Vec::new());
        assert_eq!(job.field(FIELD_PRODUCT), Some("Pro"));
    }

    #[test]
    fn test_fields_text_escapes_newlines() {
        let job = LabelJob::new(payload(None), Vec::new());
        let text = job.fields_text();
        assert!(text.starts_with("TEXT=FFEEDDCCBBAA\nBARCODE=FFEEDDCCBBAA+42\n"));
        assert!(text.contains("DESCRIPTION=S/N: FFEEDDCCBBAA\\nCustomer/Lot: 42\\nDate: 03/07/26\n"));
    }
}
