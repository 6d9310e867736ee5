//! Domain data model: OCR tokens and extracted fields.

pub mod field;
pub mod token;

pub use field::{BBox, ExtractionResult, Field, FieldKind};
pub use token::{NormalizedToken, NormalizedTokens, RawToken};
