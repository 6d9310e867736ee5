//! Extraction orchestrator.
//!
//! Builds the pipeline once at startup and runs it per request: preprocess,
//! then the model strategy when a label model is available, falling back to
//! the heuristic strategy on any model-path failure. Model availability is
//! decided exactly once at build time and held as an immutable field: a
//! failed load never retries for the process lifetime, while a per-request
//! model failure falls back without changing process-wide state.

use crate::classify::{HeuristicClassifier, HeuristicConfig, ModelClassifier, Strategy};
use crate::core::errors::ExtractError;
use crate::domain::field::{ExtractionResult, Field};
use crate::engine::{OcrEngine, TesseractConfig, TesseractEngine};
use crate::model::{LabelModel, OnnxLabelModel};
use crate::processors::{normalize, PreprocessConfig, Preprocessor};
use image::{GrayImage, RgbImage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// The configured extraction pipeline.
///
/// Cheap to share behind an `Arc`; requests run end-to-end synchronously and
/// independently, the only shared state being the read-only model handle.
pub struct FieldExtractor {
    engine: Arc<dyn OcrEngine>,
    model: Option<ModelClassifier>,
    preprocessor: Preprocessor,
    heuristic: HeuristicClassifier,
}

impl FieldExtractor {
    pub fn builder() -> FieldExtractorBuilder {
        FieldExtractorBuilder::new()
    }

    /// Returns true if the label model loaded and the model strategy will be
    /// attempted first.
    pub fn model_available(&self) -> bool {
        self.model.is_some()
    }

    /// Extracts typed fields from one page image.
    ///
    /// An OCR engine failure is fatal to the request (both strategies need
    /// the engine); a model-path failure is absorbed and the heuristic
    /// strategy answers instead. Zero detected fields is a success with an
    /// empty list, never an error.
    pub fn extract(&self, image: &RgbImage) -> Result<ExtractionResult, ExtractError> {
        let preprocessed = self.preprocessor.run(image);

        if let Some(classifier) = &self.model {
            match self.run_model_path(classifier, image, &preprocessed) {
                Ok(fields) => {
                    return Ok(ExtractionResult {
                        model: Strategy::Model.tag(),
                        fields,
                    });
                }
                Err(err) => {
                    warn!(error = %err, "model path failed, falling back to heuristic");
                }
            }
        }

        let tokens = self.engine.recognize(&preprocessed)?;
        let fields = self.heuristic.classify(&tokens);
        info!(fields = fields.len(), strategy = Strategy::Heuristic.tag(), "extraction complete");

        Ok(ExtractionResult {
            model: Strategy::Heuristic.tag(),
            fields,
        })
    }

    /// The model strategy: OCR on the preprocessed page, normalization, then
    /// model classification against the original image.
    fn run_model_path(
        &self,
        classifier: &ModelClassifier,
        original: &RgbImage,
        preprocessed: &GrayImage,
    ) -> Result<Vec<Field>, ExtractError> {
        let raw = self.engine.recognize(preprocessed)?;
        let tokens = normalize::normalize_tokens(&raw, preprocessed.width(), preprocessed.height());
        let fields = classifier.classify(original, &tokens)?;
        info!(fields = fields.len(), strategy = Strategy::Model.tag(), "extraction complete");
        Ok(fields)
    }
}

/// Builder for [`FieldExtractor`].
///
/// The label model is optional: pointing the builder at a model directory
/// attempts a load during `build`, and a load failure downgrades the
/// extractor to heuristic-only with a warning instead of failing the build.
pub struct FieldExtractorBuilder {
    engine: Option<Arc<dyn OcrEngine>>,
    tesseract: TesseractConfig,
    label_model_dir: Option<PathBuf>,
    label_model: Option<Arc<dyn LabelModel>>,
    preprocess: PreprocessConfig,
    heuristic: HeuristicConfig,
}

impl FieldExtractorBuilder {
    pub fn new() -> Self {
        Self {
            engine: None,
            tesseract: TesseractConfig::default(),
            label_model_dir: None,
            label_model: None,
            preprocess: PreprocessConfig::default(),
            heuristic: HeuristicConfig::default(),
        }
    }

    /// Uses a custom OCR engine instead of the default Tesseract subprocess.
    pub fn with_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Configures the default Tesseract engine.
    pub fn tesseract(mut self, config: TesseractConfig) -> Self {
        self.tesseract = config;
        self
    }

    /// Attempts to load an ONNX label model from `dir` during `build`.
    pub fn with_label_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.label_model_dir = Some(dir.into());
        self
    }

    /// Uses an already-constructed label model.
    pub fn with_label_model(mut self, model: Arc<dyn LabelModel>) -> Self {
        self.label_model = Some(model);
        self
    }

    /// Sets the preprocessing configuration.
    pub fn preprocess(mut self, config: PreprocessConfig) -> Self {
        self.preprocess = config;
        self
    }

    /// Sets the heuristic classifier configuration.
    pub fn heuristic(mut self, config: HeuristicConfig) -> Self {
        self.heuristic = config;
        self
    }

    /// Builds the extractor, deciding model availability once.
    pub fn build(self) -> Result<FieldExtractor, ExtractError> {
        let engine = self
            .engine
            .unwrap_or_else(|| Arc::new(TesseractEngine::new(self.tesseract)));

        let model = match (self.label_model, self.label_model_dir) {
            (Some(model), _) => Some(model),
            (None, Some(dir)) => match OnnxLabelModel::load(&dir) {
                Ok(model) => Some(Arc::new(model) as Arc<dyn LabelModel>),
                Err(err) => {
                    warn!(
                        error = %err,
                        dir = %dir.display(),
                        "label model unavailable, running heuristic-only"
                    );
                    None
                }
            },
            (None, None) => None,
        };

        if model.is_some() {
            info!("label model loaded, model strategy enabled");
        }

        Ok(FieldExtractor {
            engine,
            model: model.map(ModelClassifier::new),
            preprocessor: Preprocessor::new(self.preprocess),
            heuristic: HeuristicClassifier::new(self.heuristic),
        })
    }
}

impl Default for FieldExtractorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
