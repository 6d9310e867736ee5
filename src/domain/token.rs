//! OCR token model: raw engine output and its normalized form.

use serde::{Deserialize, Serialize};

/// One word-level detection from the OCR engine, in engine-native units.
///
/// Coordinates are pixels in the recognized image; confidence is on the
/// engine's 0–100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawToken {
    pub text: String,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f32,
}

impl RawToken {
    pub fn new(
        text: impl Into<String>,
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        confidence: f32,
    ) -> Self {
        Self {
            text: text.into(),
            left,
            top,
            width,
            height,
            confidence,
        }
    }

    /// Right edge of the token box.
    pub fn right(&self) -> u32 {
        self.left + self.width
    }
}

/// A token scaled into the 0–1000 unit-square coordinate system.
///
/// Box layout is `[x0, y0, x1, y1]`. Invariants: every component lies in
/// `[0, 1000]` and `x0 <= x1`, `y0 <= y1`. Confidence is rescaled to 0.0–1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedToken {
    pub text: String,
    pub bbox: [i64; 4],
    pub confidence: f32,
}

/// Parallel word/box/confidence sequences over normalized tokens.
///
/// This is the layout the label model consumes; the three vectors always
/// have identical length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTokens {
    pub words: Vec<String>,
    pub boxes: Vec<[i64; 4]>,
    pub confidences: Vec<f32>,
}

impl NormalizedTokens {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: Vec::with_capacity(capacity),
            boxes: Vec::with_capacity(capacity),
            confidences: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, token: NormalizedToken) {
        self.words.push(token.text);
        self.boxes.push(token.bbox);
        self.confidences.push(token.confidence);
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
