//! Label model boundary.
//!
//! The label model is an external collaborator: given a page image plus
//! normalized word/box sequences, it returns one label per retained token
//! position (padded/truncated to its fixed sequence length) and the maximum
//! post-softmax probability of the pass. It may be unavailable at process
//! start; the orchestrator detects that once and never retries.

mod layoutlm;

pub use layoutlm::OnnxLabelModel;

use crate::core::errors::ExtractError;
use image::RgbImage;

/// Per-token label output of one model invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPrediction {
    /// One label string per retained input token, in input order.
    ///
    /// May be shorter than the input when tokens beyond the model's fixed
    /// sequence length were dropped.
    pub labels: Vec<String>,
    /// Maximum post-softmax probability across the whole label distribution
    /// of this pass (a model-wide scalar, not per-token).
    pub max_probability: f32,
}

/// A token-classification layout model.
pub trait LabelModel: Send + Sync {
    /// Predicts one label per input token position.
    ///
    /// `boxes` are 0–1000 normalized `[x0, y0, x1, y1]` coordinates parallel
    /// to `words`; `image` is the original (non-binarized) page.
    fn predict(
        &self,
        image: &RgbImage,
        words: &[String],
        boxes: &[[i64; 4]],
    ) -> Result<LabelPrediction, ExtractError>;
}
