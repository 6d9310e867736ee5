//! Document loading: uploaded bytes → first-page RGB raster.
//!
//! Attempts, in order: spreadsheet conversion (LibreOffice) for `.xlsx` /
//! `.xls` uploads, PDF rasterization of the first page via pdfium, then raw
//! image decoding. Temporary files created for the conversion step live in a
//! `tempfile` directory and are removed on all exit paths.

use image::RgbImage;
use pdfium_render::prelude::*;
use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, warn};

/// DPI for PDF page rasterization.
const RENDER_DPI: f32 = 200.0;
/// Maximum dimension for rendered pages.
const MAX_RENDER_DIMENSION: u32 = 4000;

#[derive(Error, Debug)]
pub enum LoadError {
    /// The upload could not be interpreted as a document page; maps to a
    /// client error.
    #[error("{0}")]
    Unsupported(String),

    /// A conversion step failed on the server side.
    #[error("conversion failed: {0}")]
    Conversion(String),
}

/// Loads the first page of an uploaded document as an RGB raster.
pub fn load_first_page(bytes: &[u8], filename: &str) -> Result<RgbImage, LoadError> {
    let bytes = if is_spreadsheet(filename) {
        debug!(filename, "converting spreadsheet to PDF");
        convert_spreadsheet_to_pdf(bytes, filename)?
    } else {
        bytes.to_vec()
    };

    match render_pdf_first_page(&bytes) {
        Ok(image) => return Ok(image),
        Err(err) => debug!(error = %err, "not renderable as PDF, trying raw image decode"),
    }

    image::load_from_memory(&bytes)
        .map(|img| img.to_rgb8())
        .map_err(|_| {
            LoadError::Unsupported(
                "Failed to convert file to image. Supported formats: PDF, Excel, or image files"
                    .to_string(),
            )
        })
}

fn is_spreadsheet(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    lower.ends_with(".xlsx") || lower.ends_with(".xls")
}

/// Converts spreadsheet bytes to PDF via a headless LibreOffice run.
fn convert_spreadsheet_to_pdf(bytes: &[u8], filename: &str) -> Result<Vec<u8>, LoadError> {
    let dir = tempfile::tempdir()
        .map_err(|e| LoadError::Conversion(format!("temp dir: {e}")))?;

    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("xlsx");
    let input_path = dir.path().join(format!("upload.{extension}"));
    std::fs::write(&input_path, bytes)
        .map_err(|e| LoadError::Conversion(format!("temp write: {e}")))?;

    let output = Command::new("soffice")
        .args(["--headless", "--convert-to", "pdf", "--outdir"])
        .arg(dir.path())
        .arg(&input_path)
        .output()
        .map_err(|e| LoadError::Conversion(format!("failed to run soffice: {e}")))?;

    if !output.status.success() {
        return Err(LoadError::Conversion(format!(
            "soffice exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let pdf_path = input_path.with_extension("pdf");
    std::fs::read(&pdf_path)
        .map_err(|e| LoadError::Conversion(format!("converted PDF not readable: {e}")))
}

/// Renders the first page of a PDF to an RGB image.
fn render_pdf_first_page(bytes: &[u8]) -> Result<RgbImage, LoadError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| LoadError::Unsupported(format!("not a loadable PDF: {e}")))?;

    let page = document
        .pages()
        .first()
        .map_err(|_| LoadError::Unsupported("PDF has no pages".to_string()))?;

    // Points are 1/72 inch; scale to the render DPI and cap the dimensions.
    let scale = RENDER_DPI / 72.0;
    let mut width_px = (page.width().value * scale) as u32;
    let mut height_px = (page.height().value * scale) as u32;
    if width_px > MAX_RENDER_DIMENSION || height_px > MAX_RENDER_DIMENSION {
        let ratio = MAX_RENDER_DIMENSION as f32 / width_px.max(height_px) as f32;
        width_px = (width_px as f32 * ratio) as u32;
        height_px = (height_px as f32 * ratio) as u32;
    }

    let render_config = PdfRenderConfig::new()
        .set_target_width(width_px as i32)
        .set_target_height(height_px as i32)
        .render_form_data(true)
        .render_annotations(true);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| LoadError::Conversion(format!("page render failed: {e}")))?;

    Ok(bitmap.as_image().to_rgb8())
}

/// Binds to a pdfium library, preferring local copies over the system one.
fn bind_pdfium() -> Result<Pdfium, LoadError> {
    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/lib"))
        })
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/local/lib"))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| {
            warn!(error = %e, "pdfium library not found");
            LoadError::Unsupported(format!("PDF rendering unavailable: {e}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spreadsheet_extensions_are_detected_case_insensitively() {
        assert!(is_spreadsheet("report.xlsx"));
        assert!(is_spreadsheet("REPORT.XLS"));
        assert!(!is_spreadsheet("report.pdf"));
        assert!(!is_spreadsheet("scan.png"));
    }

    #[test]
    fn plain_image_bytes_decode() {
        let mut png = Vec::new();
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([255, 255, 255]));
        image::DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut png),
                image::ImageFormat::Png,
            )
            .expect("encode");

        let loaded = load_first_page(&png, "scan.png").expect("load");
        assert_eq!(loaded.dimensions(), (4, 4));
    }

    #[test]
    fn garbage_bytes_are_unsupported() {
        let err = load_first_page(b"definitely not a document", "note.bin").expect_err("fail");
        assert!(matches!(err, LoadError::Unsupported(_)));
    }
}
