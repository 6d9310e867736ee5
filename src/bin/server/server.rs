//! HTTP server for document field extraction.

use crate::config::ServerConfig;
use crate::loader::{self, LoadError};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use docfield::domain::field::Field;
use docfield::engine::TesseractConfig;
use docfield::{FieldExtractor, FieldExtractorBuilder};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Maximum accepted upload size (50 MB).
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Application state shared across handlers.
struct AppState {
    extractor: FieldExtractor,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    model_available: bool,
}

/// Response from field extraction.
#[derive(Serialize)]
struct ExtractResponse {
    success: bool,
    model: String,
    fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    processing_time_ms: Option<f64>,
}

impl ExtractResponse {
    fn error(message: String) -> Self {
        Self {
            success: false,
            model: String::new(),
            fields: Vec::new(),
            error: Some(message),
            processing_time_ms: None,
        }
    }
}

/// Runs the HTTP server until shutdown.
pub async fn run_server(
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("initializing extraction pipeline");
    let mut builder = FieldExtractorBuilder::new().tesseract(TesseractConfig {
        binary: config.extract.tesseract_bin.clone(),
        language: config.extract.language.clone(),
        page_segmentation_mode: None,
    });
    if let Some(dir) = &config.extract.model_dir {
        builder = builder.with_label_model_dir(dir);
    }
    let extractor = builder.build()?;
    info!(
        model_available = extractor.model_available(),
        "extraction pipeline ready"
    );

    let state = Arc::new(AppState { extractor });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/extract", post(extract_handler))
        .route("/api/v1/extract", post(extract_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("invalid address: {e}"))?;

    info!("server listening on http://{addr}");
    info!("  GET  /health          - health check");
    info!("  POST /extract         - field extraction");
    info!("  POST /api/v1/extract  - field extraction (versioned API)");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shutdown complete");
    Ok(())
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_available: state.extractor.model_available(),
    })
}

/// Field extraction endpoint: accepts one multipart file upload.
async fn extract_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let request_id = uuid::Uuid::new_v4().to_string();
    let start = Instant::now();

    let (filename, bytes) = match read_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ExtractResponse::error(message)),
            );
        }
    };

    info!(
        request_id = %request_id,
        filename = %filename,
        bytes = bytes.len(),
        "processing extraction request"
    );

    let image = match loader::load_first_page(&bytes, &filename) {
        Ok(image) => image,
        Err(err) => {
            error!(request_id = %request_id, error = %err, "failed to load document");
            let status = match err {
                LoadError::Unsupported(_) => StatusCode::BAD_REQUEST,
                LoadError::Conversion(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            return (status, Json(ExtractResponse::error(err.to_string())));
        }
    };

    let result = match state.extractor.extract(&image) {
        Ok(result) => result,
        Err(err) => {
            error!(request_id = %request_id, error = %err, "extraction failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ExtractResponse::error(err.to_string())),
            );
        }
    };

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    info!(
        request_id = %request_id,
        model = result.model,
        fields = result.fields.len(),
        total_ms = elapsed_ms,
        "extraction complete"
    );

    (
        StatusCode::OK,
        Json(ExtractResponse {
            success: true,
            model: result.model.to_string(),
            fields: result.fields,
            error: None,
            processing_time_ms: Some(elapsed_ms),
        }),
    )
}

/// Reads the first file field out of the multipart body.
async fn read_upload(multipart: &mut Multipart) -> Result<(String, Vec<u8>), String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("invalid multipart body: {e}"))?
    {
        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| format!("failed to read upload: {e}"))?;
        return Ok((filename, bytes.to_vec()));
    }

    Err("no file field in request".to_string())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("received SIGTERM, starting graceful shutdown");
        }
    }
}
