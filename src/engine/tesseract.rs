//! Tesseract subprocess engine.
//!
//! Writes the image to a temporary PNG and runs `tesseract <img> stdout tsv`,
//! parsing the word-level rows of the TSV output. The temporary file is
//! removed on all exit paths by `tempfile`'s RAII guard.

use crate::core::errors::ExtractError;
use crate::domain::token::RawToken;
use crate::engine::OcrEngine;
use image::GrayImage;
use std::process::Command;
use tracing::debug;

/// TSV row level for word entries (page=1, block=2, par=3, line=4, word=5).
const WORD_LEVEL: u32 = 5;

/// Configuration for the Tesseract subprocess engine.
#[derive(Debug, Clone)]
pub struct TesseractConfig {
    /// Path or name of the tesseract binary.
    pub binary: String,
    /// Recognition language(s), e.g. `eng` or `eng+deu`.
    pub language: String,
    /// Page segmentation mode; `None` uses the binary's default.
    pub page_segmentation_mode: Option<u32>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: "eng".to_string(),
            page_segmentation_mode: None,
        }
    }
}

/// OCR engine backed by the `tesseract` command-line binary.
#[derive(Debug, Clone, Default)]
pub struct TesseractEngine {
    config: TesseractConfig,
}

impl TesseractEngine {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<RawToken>, ExtractError> {
        let tmp = tempfile::Builder::new()
            .prefix("docfield-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| ExtractError::engine_with_source("failed to create temp image", e))?;

        image
            .save(tmp.path())
            .map_err(|e| ExtractError::engine_with_source("failed to write temp image", e))?;

        let mut command = Command::new(&self.config.binary);
        command
            .arg(tmp.path())
            .arg("stdout")
            .args(["-l", &self.config.language]);
        if let Some(psm) = self.config.page_segmentation_mode {
            command.args(["--psm", &psm.to_string()]);
        }
        command.arg("tsv");

        let output = command.output().map_err(|e| {
            ExtractError::engine_with_source(
                format!("failed to run '{}'", self.config.binary),
                e,
            )
        })?;

        if !output.status.success() {
            return Err(ExtractError::engine(format!(
                "'{}' exited with {}: {}",
                self.config.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let tokens = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        debug!(tokens = tokens.len(), "tesseract recognition complete");
        Ok(tokens)
    }
}

/// Parses word-level rows out of Tesseract TSV output.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num, left,
/// top, width, height, conf, text. Malformed rows are skipped.
fn parse_tsv(tsv: &str) -> Vec<RawToken> {
    let mut tokens = Vec::new();

    for line in tsv.lines().skip(1) {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 12 {
            continue;
        }
        if columns[0].parse::<u32>() != Ok(WORD_LEVEL) {
            continue;
        }

        let (Ok(left), Ok(top), Ok(width), Ok(height)) = (
            columns[6].parse::<u32>(),
            columns[7].parse::<u32>(),
            columns[8].parse::<u32>(),
            columns[9].parse::<u32>(),
        ) else {
            continue;
        };
        let Ok(confidence) = columns[10].parse::<f32>() else {
            continue;
        };

        tokens.push(RawToken::new(
            columns[11].to_string(),
            left,
            top,
            width,
            height,
            confidence,
        ));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
1\t1\t0\t0\t0\t0\t0\t0\t640\t480\t-1\t\n\
4\t1\t1\t1\t1\t0\t10\t10\t200\t20\t-1\t\n\
5\t1\t1\t1\t1\t1\t10\t10\t60\t20\t96.5\tName:\n\
5\t1\t1\t1\t1\t2\t80\t10\t90\t20\t91.0\tAlice\n\
5\t1\t1\t1\t2\t1\t10\t40\t70\t18\t22.1\tsmudge\n";

    #[test]
    fn parses_word_level_rows_only() {
        let tokens = parse_tsv(SAMPLE_TSV);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "Name:");
        assert_eq!(tokens[0].left, 10);
        assert_eq!(tokens[0].top, 10);
        assert_eq!(tokens[1].text, "Alice");
        assert!((tokens[2].confidence - 22.1).abs() < f32::EPSILON);
    }

    #[test]
    fn skips_malformed_rows() {
        let tokens = parse_tsv("level\tgarbage\n5\tnot-enough-columns\n");
        assert!(tokens.is_empty());
    }
}
