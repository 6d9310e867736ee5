//! Error types for the field extraction pipeline.
//!
//! The taxonomy has three domain variants with different propagation rules:
//! decode errors surface to the caller as client errors, classifier errors
//! are absorbed by the orchestrator's fallback, and engine errors are fatal
//! to the request because both strategies depend on the OCR engine.

use thiserror::Error;

/// Errors that can occur during field extraction.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The input could not be turned into a usable page image.
    ///
    /// Client-side and non-retryable without a different file.
    #[error("decode failed: {message}")]
    Decode {
        /// A message describing why the input could not be decoded.
        message: String,
        /// The underlying error, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A model-path failure (encoding, inference, or label decoding).
    ///
    /// Recovered internally via fallback to the heuristic path; never
    /// surfaced to the caller directly.
    #[error("classifier failed: {context}")]
    Classifier {
        /// Additional context about where the classifier failed.
        context: String,
        /// The underlying error, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The OCR backend was unreachable or crashed.
    ///
    /// Both strategies depend on the engine, so this is fatal to the request.
    #[error("ocr engine failed: {context}")]
    Engine {
        /// Additional context about the engine failure.
        context: String,
        /// The underlying error, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error occurred while loading or decoding an image.
    #[error("image load")]
    ImageLoad(#[from] image::ImageError),

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor shape operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Creates a decode error without an underlying cause.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a decode error wrapping an underlying cause.
    pub fn decode_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Decode {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a classifier error without an underlying cause.
    pub fn classifier(context: impl Into<String>) -> Self {
        Self::Classifier {
            context: context.into(),
            source: None,
        }
    }

    /// Wraps an error that occurred on the model classification path.
    pub fn classifier_with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Classifier {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an engine error without an underlying cause.
    pub fn engine(context: impl Into<String>) -> Self {
        Self::Engine {
            context: context.into(),
            source: None,
        }
    }

    /// Wraps an error from the OCR backend.
    pub fn engine_with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Engine {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if this error maps to a client-side (4xx) failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::ImageLoad(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_are_client_errors() {
        assert!(ExtractError::decode("unsupported file").is_client_error());
        assert!(!ExtractError::engine("tesseract exited with status 1").is_client_error());
        assert!(!ExtractError::classifier("sequence encoding failed").is_client_error());
    }

    #[test]
    fn display_includes_context() {
        let err = ExtractError::engine("tesseract not found");
        assert_eq!(err.to_string(), "ocr engine failed: tesseract not found");
    }
}
