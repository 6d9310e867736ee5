//! CLI single-document processing.

use crate::config::ExtractConfig;
use crate::loader;
use docfield::domain::field::ExtractionResult;
use docfield::engine::TesseractConfig;
use docfield::FieldExtractorBuilder;
use std::path::Path;
use tracing::info;

/// Builds an extractor from the CLI configuration.
fn build_extractor(
    config: &ExtractConfig,
) -> Result<docfield::FieldExtractor, Box<dyn std::error::Error + Send + Sync>> {
    let mut builder = FieldExtractorBuilder::new().tesseract(TesseractConfig {
        binary: config.tesseract_bin.clone(),
        language: config.language.clone(),
        page_segmentation_mode: None,
    });
    if let Some(dir) = &config.model_dir {
        builder = builder.with_label_model_dir(dir);
    }
    Ok(builder.build()?)
}

/// Processes a local file and prints the result.
pub fn process_file(
    path: &Path,
    config: &ExtractConfig,
    output: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin");

    let image = loader::load_first_page(&bytes, filename)?;
    info!(
        width = image.width(),
        height = image.height(),
        "document page loaded"
    );

    let extractor = build_extractor(config)?;
    let result = extractor.extract(&image)?;
    print_result(&result, output)
}

/// Downloads a document from a URL, processes it, and prints the result.
pub async fn process_url(
    url: &str,
    config: &ExtractConfig,
    output: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        return Err(format!("HTTP error: {}", response.status()).into());
    }

    let filename = url.rsplit('/').next().unwrap_or("upload.bin").to_string();
    let bytes = response.bytes().await?;

    let image = loader::load_first_page(&bytes, &filename)?;
    let extractor = build_extractor(config)?;
    let result = extractor.extract(&image)?;
    print_result(&result, output)
}

/// Prints an extraction result as JSON or a human-readable listing.
fn print_result(
    result: &ExtractionResult,
    output: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match output {
        "json" => println!("{}", serde_json::to_string_pretty(result)?),
        _ => {
            println!("model: {}", result.model);
            println!("fields: {}", result.fields.len());
            for (index, field) in result.fields.iter().enumerate() {
                println!(
                    "  {:>3}. [{}] '{}' (confidence {:.2}, bbox {}x{} at {},{})",
                    index + 1,
                    field.kind,
                    field.text,
                    field.confidence,
                    field.bbox.width,
                    field.bbox.height,
                    field.bbox.x,
                    field.bbox.y,
                );
            }
        }
    }
    Ok(())
}
