//! # docfield
//!
//! Structured field extraction from scanned or rendered document pages.
//!
//! Given a single page image, the pipeline produces a list of semantically
//! typed text regions (headers, questions, answers, or model-specific entity
//! labels) suitable for downstream form-data extraction. Two classification
//! strategies are available:
//!
//! - a **model path** that feeds OCR tokens and the page image to a
//!   token-classification layout model and BIO-decodes its output, and
//! - a **heuristic path** that groups OCR tokens into lines and assigns each
//!   line a field type via pattern rules, including question→answer pairing.
//!
//! The [`pipeline::FieldExtractor`] orchestrates both: the model path runs
//! when a label model loaded at startup, and any model-path failure falls
//! back to the heuristic path for that request. An unreachable or failing ML
//! dependency never fails a request outright as long as the OCR engine can
//! still produce tokens.
//!
//! ## Example
//!
//! ```no_run
//! use docfield::pipeline::FieldExtractorBuilder;
//!
//! let extractor = FieldExtractorBuilder::new()
//!     .with_label_model_dir("models/layoutlmv3")
//!     .build()
//!     .expect("failed to build extractor");
//!
//! let page = image::open("page.png").expect("image").to_rgb8();
//! let result = extractor.extract(&page).expect("extraction");
//! println!("{}: {} fields", result.model, result.fields.len());
//! ```

pub mod classify;
pub mod core;
pub mod domain;
pub mod engine;
pub mod model;
pub mod pipeline;
pub mod processors;
pub mod utils;

pub use crate::core::errors::ExtractError;
pub use crate::domain::field::{BBox, ExtractionResult, Field, FieldKind};
pub use crate::domain::token::{NormalizedToken, NormalizedTokens, RawToken};
pub use crate::pipeline::{FieldExtractor, FieldExtractorBuilder};
