use battlabel_core::LabelError;
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

/// Renders `data` as a `size`×`size` QR raster with no quiet zone.
///
/// Modules are scaled by the largest whole factor that fits; leftover pixels
/// are split evenly around the symbol. Fails with `TargetTooSmall` when the
/// symbol has more modules than `size`.
pub fn render_qr(data: &str, size: u32) -> Result<GrayImage, LabelError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)
        .map_err(|e| LabelError::QrEncode(e.to_string()))?;

    let modules = code.width() as u32;
    if modules > size {
        return Err(LabelError::TargetTooSmall { modules, size });
    }
    let scale = size / modules;
    let symbol = code
        .render::<Luma<u8>>()
        .quiet_zone(false)
        .module_dimensions(scale, scale)
        .build();

    if symbol.width() == size {
        return Ok(symbol);
    }

    let mut canvas = GrayImage::from_pixel(size, size, Luma([255]));
    let offset = i64::from((size - symbol.width()) / 2);
    image::imageops::overlay(&mut canvas, &symbol, offset, offset);
    Ok(canvas)
}

/// Renders `data` and encodes the raster as PNG in memory.
pub fn render_qr_png(data: &str, size: u32) -> Result<Vec<u8>, LabelError> {
    let image = render_qr(data, size)?;
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| LabelError::ImageEncode(e.to_string()))?;
    Ok(bytes)
}
