//! Configuration types shared between CLI and server modes.

use std::path::PathBuf;

/// Extraction pipeline configuration.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Directory holding `model.onnx`, `tokenizer.json`, and `config.json`;
    /// `None` runs heuristic-only.
    pub model_dir: Option<PathBuf>,
    /// Tesseract binary path or name.
    pub tesseract_bin: String,
    /// OCR language(s).
    pub language: String,
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub extract: ExtractConfig,
    pub host: String,
    pub port: u16,
}
