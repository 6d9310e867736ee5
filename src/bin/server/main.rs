//! docfield server and CLI
//!
//! A cross-platform binary for document field extraction via CLI or HTTP
//! server.
//!
//! # Usage
//!
//! ## CLI Mode
//! ```bash
//! docfield-server extract --file form.pdf --model-dir models/layoutlmv3
//! docfield-server extract --url "https://example.com/form.png"
//! ```
//!
//! ## Server Mode
//! ```bash
//! docfield-server serve --model-dir models/layoutlmv3 --port 8080
//! ```

mod cli;
mod config;
mod loader;
mod server;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "docfield-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Document field extraction via CLI or HTTP server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a single document via CLI
    Extract {
        /// URL of the document to process
        #[arg(long, conflicts_with = "file")]
        url: Option<String>,

        /// Local file path of the document to process
        #[arg(long, conflicts_with = "url")]
        file: Option<PathBuf>,

        /// Directory with the ONNX label model (model.onnx, tokenizer.json,
        /// config.json); omit to run heuristic-only
        #[arg(long = "model-dir", env = "DOCFIELD_MODEL_DIR")]
        model_dir: Option<PathBuf>,

        /// Tesseract binary
        #[arg(long, default_value = "tesseract", env = "DOCFIELD_TESSERACT")]
        tesseract: String,

        /// OCR language(s)
        #[arg(long, default_value = "eng", env = "DOCFIELD_LANG")]
        lang: String,

        /// Output format (json, pretty)
        #[arg(long, default_value = "pretty")]
        output: String,
    },
    /// Start the HTTP server
    Serve {
        /// Directory with the ONNX label model; omit to run heuristic-only
        #[arg(long = "model-dir", env = "DOCFIELD_MODEL_DIR")]
        model_dir: Option<PathBuf>,

        /// Tesseract binary
        #[arg(long, default_value = "tesseract", env = "DOCFIELD_TESSERACT")]
        tesseract: String,

        /// OCR language(s)
        #[arg(long, default_value = "eng", env = "DOCFIELD_LANG")]
        lang: String,

        /// Port to listen on
        #[arg(long, short, default_value = "8080", env = "DOCFIELD_PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0", env = "DOCFIELD_HOST")]
        host: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    docfield::utils::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            url,
            file,
            model_dir,
            tesseract,
            lang,
            output,
        } => {
            let config = config::ExtractConfig {
                model_dir,
                tesseract_bin: tesseract,
                language: lang,
            };

            if let Some(url) = url {
                info!("processing URL: {url}");
                cli::process_url(&url, &config, &output).await?;
            } else if let Some(file) = file {
                info!("processing file: {}", file.display());
                cli::process_file(&file, &config, &output)?;
            } else {
                eprintln!("error: either --url or --file must be provided");
                std::process::exit(1);
            }
        }
        Commands::Serve {
            model_dir,
            tesseract,
            lang,
            port,
            host,
        } => {
            let config = config::ServerConfig {
                extract: config::ExtractConfig {
                    model_dir,
                    tesseract_bin: tesseract,
                    language: lang,
                },
                host,
                port,
            };

            info!("starting server on {}:{}", config.host, config.port);
            server::run_server(config).await?;
        }
    }

    Ok(())
}
