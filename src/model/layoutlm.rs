//! ONNX-backed token-classification layout model.
//!
//! Loads a LayoutLMv3-style token-classification model exported to ONNX,
//! together with its `tokenizer.json` and `config.json` (for the id→label
//! mapping). Inference goes through one `ort` session; `Session::run`
//! requires exclusive access, so invocations are serialized behind a mutex.

use crate::core::errors::ExtractError;
use crate::model::{LabelModel, LabelPrediction};
use image::imageops::FilterType;
use image::RgbImage;
use ndarray::{Array2, Array3, Array4};
use ort::session::Session;
use ort::value::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tokenizers::Tokenizer;
use tracing::info;

/// Fixed sequence length the model was exported with.
const MAX_SEQUENCE_LENGTH: usize = 512;
/// Side length of the model's pixel input.
const PIXEL_INPUT_SIZE: u32 = 224;

/// Special token ids of the RoBERTa vocabulary LayoutLMv3 uses, used as
/// fallbacks when the tokenizer file does not name them.
const FALLBACK_CLS_ID: u32 = 0;
const FALLBACK_PAD_ID: u32 = 1;
const FALLBACK_SEP_ID: u32 = 2;

/// A LayoutLMv3-style token-classification model behind an ort session.
#[derive(Debug)]
pub struct OnnxLabelModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    id2label: HashMap<usize, String>,
    cls_id: i64,
    sep_id: i64,
    pad_id: i64,
}

impl OnnxLabelModel {
    /// Loads `model.onnx`, `tokenizer.json`, and `config.json` from
    /// `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self, ExtractError> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let config_path = model_dir.join("config.json");

        for path in [&model_path, &tokenizer_path, &config_path] {
            if !path.exists() {
                return Err(ExtractError::classifier(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let session = Session::builder()?.commit_from_file(&model_path)?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            ExtractError::classifier(format!(
                "failed to load tokenizer from '{}': {}",
                tokenizer_path.display(),
                e
            ))
        })?;

        let id2label = load_id2label(&config_path)?;

        let cls_id = tokenizer.token_to_id("<s>").unwrap_or(FALLBACK_CLS_ID) as i64;
        let sep_id = tokenizer.token_to_id("</s>").unwrap_or(FALLBACK_SEP_ID) as i64;
        let pad_id = tokenizer.token_to_id("<pad>").unwrap_or(FALLBACK_PAD_ID) as i64;

        info!(
            model = %model_path.display(),
            labels = id2label.len(),
            "label model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            id2label,
            cls_id,
            sep_id,
            pad_id,
        })
    }
}

/// Encoded page ready for the session: fixed-length id/box/mask sequences
/// plus the sequence position of each retained word's first subtoken.
struct EncodedPage {
    input_ids: Vec<i64>,
    boxes: Vec<i64>,
    attention_mask: Vec<i64>,
    word_positions: Vec<usize>,
}

impl OnnxLabelModel {
    /// Tokenizes words into the fixed-length input layout.
    ///
    /// Each word's subtokens all carry the word's box. Words whose subtokens
    /// would overflow the sequence limit are dropped silently, the known
    /// truncation boundary of the model path.
    fn encode(&self, words: &[String], boxes: &[[i64; 4]]) -> Result<EncodedPage, ExtractError> {
        let mut input_ids = vec![self.cls_id];
        let mut flat_boxes = vec![0i64; 4];
        let mut word_positions = Vec::with_capacity(words.len());

        for (word, bbox) in words.iter().zip(boxes) {
            let encoding = self.tokenizer.encode(word.as_str(), false).map_err(|e| {
                ExtractError::classifier(format!("tokenization failed for '{word}': {e}"))
            })?;
            let subtokens = encoding.get_ids();
            if subtokens.is_empty() {
                continue;
            }
            if input_ids.len() + subtokens.len() > MAX_SEQUENCE_LENGTH - 1 {
                break;
            }

            word_positions.push(input_ids.len());
            for &id in subtokens {
                input_ids.push(id as i64);
                flat_boxes.extend_from_slice(bbox);
            }
        }

        input_ids.push(self.sep_id);
        flat_boxes.extend_from_slice(&[0, 0, 0, 0]);

        let mut attention_mask = vec![1i64; input_ids.len()];
        attention_mask.resize(MAX_SEQUENCE_LENGTH, 0);
        input_ids.resize(MAX_SEQUENCE_LENGTH, self.pad_id);
        flat_boxes.resize(MAX_SEQUENCE_LENGTH * 4, 0);

        Ok(EncodedPage {
            input_ids,
            boxes: flat_boxes,
            attention_mask,
            word_positions,
        })
    }

    /// Resizes the page to the pixel input size and normalizes channels to
    /// mean/std 0.5, CHW layout.
    fn pixel_values(&self, image: &RgbImage) -> Array4<f32> {
        let resized = image::imageops::resize(
            image,
            PIXEL_INPUT_SIZE,
            PIXEL_INPUT_SIZE,
            FilterType::CatmullRom,
        );

        let size = PIXEL_INPUT_SIZE as usize;
        let mut pixels = Array4::<f32>::zeros((1, 3, size, size));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for channel in 0..3 {
                pixels[[0, channel, y as usize, x as usize]] =
                    (pixel[channel] as f32 / 255.0 - 0.5) / 0.5;
            }
        }
        pixels
    }
}

impl LabelModel for OnnxLabelModel {
    fn predict(
        &self,
        image: &RgbImage,
        words: &[String],
        boxes: &[[i64; 4]],
    ) -> Result<LabelPrediction, ExtractError> {
        let encoded = self.encode(words, boxes)?;
        let pixels = self.pixel_values(image);

        let input_ids = Array2::from_shape_vec((1, MAX_SEQUENCE_LENGTH), encoded.input_ids)?;
        let attention_mask =
            Array2::from_shape_vec((1, MAX_SEQUENCE_LENGTH), encoded.attention_mask)?;
        let bbox = Array3::from_shape_vec((1, MAX_SEQUENCE_LENGTH, 4), encoded.boxes)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ExtractError::classifier("label model session lock poisoned"))?;

        let outputs = session.run(ort::inputs![
            "input_ids" => Value::from_array(input_ids)?,
            "bbox" => Value::from_array(bbox)?,
            "attention_mask" => Value::from_array(attention_mask)?,
            "pixel_values" => Value::from_array(pixels)?,
        ])?;

        let (shape, logits) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        if dims.len() != 3 {
            return Err(ExtractError::classifier(format!(
                "unexpected logits shape {dims:?}"
            )));
        }
        let (seq_len, num_labels) = (dims[1], dims[2]);

        let mut max_probability = 0.0f32;
        let mut position_labels: Vec<usize> = Vec::with_capacity(seq_len);
        for position in 0..seq_len {
            let row = &logits[position * num_labels..(position + 1) * num_labels];
            let max_logit = row.iter().copied().fold(f32::MIN, f32::max);
            let exp_sum: f32 = row.iter().map(|&l| (l - max_logit).exp()).sum();

            let mut best = 0;
            for (index, &logit) in row.iter().enumerate() {
                let probability = (logit - max_logit).exp() / exp_sum;
                if probability > max_probability {
                    max_probability = probability;
                }
                if logit > row[best] {
                    best = index;
                }
            }
            position_labels.push(best);
        }

        let labels = encoded
            .word_positions
            .iter()
            .filter(|&&position| position < seq_len)
            .map(|&position| {
                self.id2label
                    .get(&position_labels[position])
                    .cloned()
                    .unwrap_or_else(|| "O".to_string())
            })
            .collect();

        Ok(LabelPrediction {
            labels,
            max_probability,
        })
    }
}

/// Reads the `id2label` table out of a HuggingFace-style `config.json`.
fn load_id2label(config_path: &Path) -> Result<HashMap<usize, String>, ExtractError> {
    let raw = std::fs::read_to_string(config_path)?;
    let config: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
        ExtractError::classifier(format!(
            "invalid model config '{}': {}",
            config_path.display(),
            e
        ))
    })?;

    let table = config
        .get("id2label")
        .and_then(|v| v.as_object())
        .ok_or_else(|| {
            ExtractError::classifier(format!(
                "model config '{}' has no id2label table",
                config_path.display()
            ))
        })?;

    let mut id2label = HashMap::with_capacity(table.len());
    for (id, label) in table {
        let id = id.parse::<usize>().map_err(|e| {
            ExtractError::classifier(format!("invalid label id '{id}' in model config: {e}"))
        })?;
        let label = label.as_str().ok_or_else(|| {
            ExtractError::classifier(format!("label for id {id} is not a string"))
        })?;
        id2label.insert(id, label.to_string());
    }

    Ok(id2label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id2label_parses_funsd_style_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{"id2label": {"0": "O", "1": "B-HEADER", "2": "I-HEADER", "3": "B-QUESTION"}}"#,
        )
        .expect("write config");

        let table = load_id2label(&config_path).expect("parse");
        assert_eq!(table.len(), 4);
        assert_eq!(table[&0], "O");
        assert_eq!(table[&3], "B-QUESTION");
    }

    #[test]
    fn missing_id2label_is_a_classifier_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"model_type": "layoutlmv3"}"#).expect("write config");

        let err = load_id2label(&config_path).expect_err("should fail");
        assert!(matches!(err, ExtractError::Classifier { .. }));
    }

    #[test]
    fn load_fails_cleanly_when_files_are_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = OnnxLabelModel::load(dir.path()).expect_err("should fail");
        assert!(matches!(err, ExtractError::Classifier { .. }));
    }
}
