//! Field records: the uniform output unit of both classification strategies.

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy tag for results produced by the layout label model.
pub const MODEL_LAYOUT: &str = "layoutlmv3";
/// Strategy tag for results produced by the heuristic OCR path.
pub const MODEL_HEURISTIC: &str = "tesseract";

/// A bounding box in the producing strategy's coordinate space.
///
/// The heuristic path emits pixel coordinates of the preprocessed image; the
/// model path emits 0–1000 normalized coordinates. The strategy tag on
/// [`ExtractionResult`] tells callers which space applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// The semantic type of an extracted field.
///
/// The heuristic path produces the four lowercase kinds; the model path
/// produces whatever entity labels the label model was trained on (e.g.
/// `HEADER`, `QUESTION`, `ANSWER` for FUNSD-style models), carried verbatim
/// in [`FieldKind::Label`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Header,
    Question,
    Answer,
    Other,
    /// A model-specific entity label, serialized verbatim.
    Label(String),
}

impl FieldKind {
    /// Returns the wire representation of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::Header => "header",
            FieldKind::Question => "question",
            FieldKind::Answer => "answer",
            FieldKind::Other => "other",
            FieldKind::Label(label) => label,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for FieldKind {
    fn from(value: &str) -> Self {
        match value {
            "header" => FieldKind::Header,
            "question" => FieldKind::Question,
            "answer" => FieldKind::Answer,
            "other" => FieldKind::Other,
            label => FieldKind::Label(label.to_string()),
        }
    }
}

impl Serialize for FieldKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KindVisitor;

        impl Visitor<'_> for KindVisitor {
            type Value = FieldKind;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a field type string")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<FieldKind, E> {
                Ok(FieldKind::from(value))
            }
        }

        deserializer.deserialize_str(KindVisitor)
    }
}

/// A labeled text region extracted from a document page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// The text content of the region.
    pub text: String,
    /// The semantic type assigned by the producing classifier.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Confidence of the classification.
    ///
    /// Scale differs by strategy: the model path reports 0.0–1.0, the
    /// heuristic path reports the engine's 0–100 scale. Preserved from the
    /// original service contract; unifying the scales is a versioned
    /// contract change.
    pub confidence: f32,
    /// Bounding box in the producing strategy's coordinate space.
    pub bbox: BBox,
}

/// Final artifact of one extraction call: the producing strategy plus the
/// ordered field list.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Which strategy produced the fields: [`MODEL_LAYOUT`] or
    /// [`MODEL_HEURISTIC`].
    pub model: &'static str,
    /// The extracted fields, in emission order.
    pub fields: Vec<Field>,
}

impl ExtractionResult {
    /// Returns true if the layout model produced this result.
    pub fn used_layout_model(&self) -> bool {
        self.model == MODEL_LAYOUT
    }
}
