//! HTTP surface
//!
//! Axum router exposing the pipeline stages individually (for the mobile
//! client's step-by-step flow) and end to end via `/api/dreams`.

pub mod handlers;
pub mod response;

pub use response::ApiError;

use crate::config::{ChatProvider, Config, StorageBackend};
use crate::pipeline::DreamPipeline;
use crate::storage::local::UPLOADS_ROUTE;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Server-level settings the handlers need besides the pipeline.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub development: bool,
    pub dry_run: bool,
    pub max_upload_bytes: u64,
    /// Directory served at `/uploads` when storage is on local disk.
    pub upload_dir: Option<PathBuf>,
    pub public_base_url: String,
    pub fal_configured: bool,
    pub interpret_provider: &'static str,
}

impl ServerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            development: config.development,
            dry_run: config.dry_run,
            max_upload_bytes: config.max_upload_bytes,
            upload_dir: (config.storage_backend == StorageBackend::Local)
                .then(|| config.upload_dir.clone()),
            public_base_url: config.public_base_url.clone(),
            fal_configured: config.fal_key.is_some(),
            interpret_provider: match config.chat_provider {
                ChatProvider::OpenAi => "openai",
                ChatProvider::Gemini => "gemini",
            },
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DreamPipeline>,
    pub settings: Arc<ServerSettings>,
}

impl AppState {
    pub fn new(pipeline: DreamPipeline, settings: ServerSettings) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            settings: Arc::new(settings),
        }
    }

    pub(crate) fn fail(&self, context: &str, err: crate::Error) -> ApiError {
        ApiError::from_error(context, err, self.settings.development)
    }
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = usize::try_from(state.settings.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let mut router = Router::new()
        .route("/", get(handlers::health))
        .route(
            "/api/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/stt", post(handlers::transcribe))
        .route("/api/generate-image", post(handlers::generate_image))
        .route("/api/generate-video", post(handlers::generate_video))
        .route("/api/analyze-dream", post(handlers::analyze_dream))
        .route("/api/dreams", post(handlers::run_dream))
        .route("/api/test", get(handlers::echo));

    if let Some(dir) = &state.settings.upload_dir {
        router = router.nest_service(UPLOADS_ROUTE, ServeDir::new(dir));
    }

    router
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until Ctrl+C.
pub async fn serve(config: &Config, state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Dream Visualizer backend listening on {}", addr);
    info!("Public base URL: {}", config.public_base_url);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
