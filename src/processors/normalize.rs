//! OCR-result normalization.
//!
//! Converts the engine's raw pixel-space output into the filtered,
//! unit-square-scaled token sequences the label model consumes. The label
//! model is trained on 0–1000 normalized layout coordinates independent of
//! page resolution, so every retained box is rescaled here.

use crate::domain::token::{NormalizedToken, NormalizedTokens, RawToken};

/// Raw confidence cutoff on the engine's 0–100 scale.
///
/// Tuned to exclude noise detections without discarding legitimate faint
/// text.
pub const MIN_TOKEN_CONFIDENCE: f32 = 30.0;

/// Upper bound of the normalized coordinate space.
pub const COORD_SCALE: i64 = 1000;

/// Filters and rescales raw tokens into parallel word/box/confidence
/// sequences.
///
/// Tokens with trimmed-empty text or raw confidence below
/// [`MIN_TOKEN_CONFIDENCE`] are dropped, order-preserving. Box components are
/// rounded into the 0–1000 space and clamped so the output always satisfies
/// `0 <= x0 <= x1 <= 1000` (and likewise for y), even for tokens touching
/// the right or bottom page edge where rounding would overflow by one.
pub fn normalize_tokens(tokens: &[RawToken], width: u32, height: u32) -> NormalizedTokens {
    let mut normalized = NormalizedTokens::with_capacity(tokens.len());
    if width == 0 || height == 0 {
        return normalized;
    }

    for token in tokens {
        if token.text.trim().is_empty() {
            continue;
        }
        if token.confidence < MIN_TOKEN_CONFIDENCE {
            continue;
        }

        let x0 = scale(token.left, width).min(COORD_SCALE);
        let y0 = scale(token.top, height).min(COORD_SCALE);
        let x1 = (x0 + scale(token.width, width)).min(COORD_SCALE);
        let y1 = (y0 + scale(token.height, height)).min(COORD_SCALE);

        normalized.push(NormalizedToken {
            text: token.text.clone(),
            bbox: [x0, y0, x1, y1],
            confidence: token.confidence / 100.0,
        });
    }

    normalized
}

fn scale(value: u32, extent: u32) -> i64 {
    (value as f64 / extent as f64 * COORD_SCALE as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, left: u32, top: u32, w: u32, h: u32, conf: f32) -> RawToken {
        RawToken::new(text, left, top, w, h, conf)
    }

    #[test]
    fn drops_empty_and_low_confidence_tokens() {
        let tokens = vec![
            token("Name", 10, 10, 50, 12, 95.0),
            token("   ", 70, 10, 20, 12, 88.0),
            token("", 95, 10, 5, 12, 99.0),
            token("smudge", 10, 40, 30, 12, 12.0),
            token("Date", 10, 70, 40, 12, 30.0),
        ];

        let normalized = normalize_tokens(&tokens, 1000, 1000);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized.words, vec!["Name", "Date"]);
        assert!(normalized.confidences.iter().all(|&c| c >= 0.30));
        assert!(normalized.len() <= tokens.len());
    }

    #[test]
    fn scales_boxes_into_unit_square() {
        let tokens = vec![token("word", 100, 50, 200, 25, 90.0)];
        let normalized = normalize_tokens(&tokens, 2000, 1000);

        assert_eq!(normalized.boxes[0], [50, 50, 150, 75]);
        assert!((normalized.confidences[0] - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn boxes_satisfy_unit_square_invariants() {
        let tokens = vec![
            token("a", 0, 0, 640, 480, 95.0),
            token("edge", 630, 470, 15, 15, 80.0),
            token("mid", 320, 240, 10, 10, 55.0),
        ];

        let normalized = normalize_tokens(&tokens, 640, 480);
        for bbox in &normalized.boxes {
            let [x0, y0, x1, y1] = *bbox;
            assert!(0 <= x0 && x0 <= x1 && x1 <= 1000, "bad box {bbox:?}");
            assert!(0 <= y0 && y0 <= y1 && y1 <= 1000, "bad box {bbox:?}");
        }
    }

    #[test]
    fn zero_dimension_image_yields_no_tokens() {
        let tokens = vec![token("word", 0, 0, 10, 10, 90.0)];
        assert!(normalize_tokens(&tokens, 0, 100).is_empty());
    }
}
