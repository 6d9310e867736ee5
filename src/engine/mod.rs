//! OCR engine boundary.
//!
//! The engine is an external collaborator: given a single raster image it
//! returns word-level [`RawToken`]s in engine-native pixel coordinates with
//! 0–100 confidence scores. The shipped implementation shells out to the
//! `tesseract` binary; tests substitute mock engines.

mod tesseract;

pub use tesseract::{TesseractConfig, TesseractEngine};

use crate::core::errors::ExtractError;
use crate::domain::token::RawToken;
use image::GrayImage;

/// An optical character recognition backend.
pub trait OcrEngine: Send + Sync {
    /// Recognizes word-level tokens in the given (preprocessed) image.
    fn recognize(&self, image: &GrayImage) -> Result<Vec<RawToken>, ExtractError>;
}
