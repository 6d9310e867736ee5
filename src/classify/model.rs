//! Model-driven token-labeling classifier.
//!
//! The primary strategy: drives a [`LabelModel`] over the page image and the
//! normalized token sequences, then decodes its BIO-tagged output into
//! fields. Tokens labeled `O` (outside any span) produce no field; `B-`/`I-`
//! prefixes are stripped to obtain the field type. Emitted boxes stay in the
//! 0–1000 normalized space and are not rescaled back to pixels.

use crate::core::errors::ExtractError;
use crate::domain::field::{BBox, Field, FieldKind};
use crate::domain::token::NormalizedTokens;
use crate::model::LabelModel;
use image::RgbImage;
use std::sync::Arc;
use tracing::debug;

/// Label denoting a token outside any field span.
const OUTSIDE_LABEL: &str = "O";

/// Classifies tokens by invoking a layout label model and decoding its
/// BIO-tagged output.
#[derive(Clone)]
pub struct ModelClassifier {
    model: Arc<dyn LabelModel>,
}

impl ModelClassifier {
    pub fn new(model: Arc<dyn LabelModel>) -> Self {
        Self { model }
    }

    /// Runs the label model and decodes one field per non-`O` token.
    ///
    /// The model may return fewer labels than input tokens when its fixed
    /// sequence length truncates the page; excess tokens are dropped
    /// silently. Every emitted field carries the pass's maximum post-softmax
    /// probability as its confidence.
    pub fn classify(
        &self,
        image: &RgbImage,
        tokens: &NormalizedTokens,
    ) -> Result<Vec<Field>, ExtractError> {
        let prediction = self.model.predict(image, &tokens.words, &tokens.boxes)?;

        if prediction.labels.len() < tokens.len() {
            debug!(
                tokens = tokens.len(),
                labeled = prediction.labels.len(),
                "sequence limit truncated token labels"
            );
        }

        let mut fields = Vec::new();
        for ((word, bbox), label) in tokens
            .words
            .iter()
            .zip(&tokens.boxes)
            .zip(&prediction.labels)
        {
            if label == OUTSIDE_LABEL {
                continue;
            }

            let kind = label.rsplit('-').next().unwrap_or(label);
            let [x0, y0, x1, y1] = *bbox;

            fields.push(Field {
                text: word.clone(),
                kind: FieldKind::Label(kind.to_string()),
                confidence: prediction.max_probability,
                bbox: BBox {
                    x: x0,
                    y: y0,
                    width: x1 - x0,
                    height: y1 - y0,
                },
            });
        }

        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LabelPrediction;

    /// Model stub that replays a fixed label sequence.
    struct FixedLabels {
        labels: Vec<&'static str>,
        max_probability: f32,
    }

    impl LabelModel for FixedLabels {
        fn predict(
            &self,
            _image: &RgbImage,
            _words: &[String],
            _boxes: &[[i64; 4]],
        ) -> Result<LabelPrediction, ExtractError> {
            Ok(LabelPrediction {
                labels: self.labels.iter().map(|l| l.to_string()).collect(),
                max_probability: self.max_probability,
            })
        }
    }

    fn tokens(words: &[&str]) -> NormalizedTokens {
        let mut tokens = NormalizedTokens::with_capacity(words.len());
        for (index, word) in words.iter().enumerate() {
            let offset = index as i64 * 100;
            tokens.push(crate::domain::token::NormalizedToken {
                text: word.to_string(),
                bbox: [offset, 10, offset + 80, 30],
                confidence: 0.9,
            });
        }
        tokens
    }

    #[test]
    fn outside_labels_yield_no_fields() {
        let classifier = ModelClassifier::new(Arc::new(FixedLabels {
            labels: vec!["O", "O", "O"],
            max_probability: 0.99,
        }));

        let fields = classifier
            .classify(&RgbImage::new(8, 8), &tokens(&["a", "b", "c"]))
            .expect("classify");
        assert!(fields.is_empty());
    }

    #[test]
    fn bio_prefixes_are_stripped() {
        let classifier = ModelClassifier::new(Arc::new(FixedLabels {
            labels: vec!["B-ANSWER", "I-ANSWER", "B-QUESTION"],
            max_probability: 0.87,
        }));

        let fields = classifier
            .classify(&RgbImage::new(8, 8), &tokens(&["42", "items", "Count:"]))
            .expect("classify");

        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].kind, FieldKind::Label("ANSWER".to_string()));
        assert_eq!(fields[1].kind, FieldKind::Label("ANSWER".to_string()));
        assert_eq!(fields[2].kind, FieldKind::Label("QUESTION".to_string()));
        assert!(fields.iter().all(|f| (f.confidence - 0.87).abs() < 1e-6));
    }

    #[test]
    fn bbox_is_normalized_space_width_height() {
        let classifier = ModelClassifier::new(Arc::new(FixedLabels {
            labels: vec!["B-HEADER"],
            max_probability: 0.5,
        }));

        let fields = classifier
            .classify(&RgbImage::new(8, 8), &tokens(&["TITLE"]))
            .expect("classify");

        assert_eq!(
            fields[0].bbox,
            BBox {
                x: 0,
                y: 10,
                width: 80,
                height: 20
            }
        );
    }

    #[test]
    fn truncated_label_sequences_drop_excess_tokens() {
        let classifier = ModelClassifier::new(Arc::new(FixedLabels {
            labels: vec!["B-ANSWER"],
            max_probability: 0.6,
        }));

        let fields = classifier
            .classify(&RgbImage::new(8, 8), &tokens(&["kept", "dropped"]))
            .expect("classify");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].text, "kept");
    }
}
