//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use poster_core::TemplateCatalog;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api;
use crate::models::AppConfig;
use crate::services::{
    upload::MAX_UPLOAD_BYTES, FilePosterStore, ImageProcessor, LlmService, PosterGenerator,
    PosterStore, RenderService,
};

/// Request bodies above this are refused before reaching a handler. Leaves
/// room for multipart framing around a maximum-size upload.
const BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 2 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<TemplateCatalog>,
    pub llm: Arc<LlmService>,
    pub generator: Arc<PosterGenerator>,
    pub renderer: Arc<RenderService>,
    pub store: Arc<dyn PosterStore>,
    pub uploads: Arc<ImageProcessor>,
}

/// Create application state, resolving fonts from the configuration.
pub async fn create_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let renderer = RenderService::from_config(&config);
    tracing::info!(fonts = renderer.font_count(), "Renderer ready");
    create_app_state_with_renderer(config, renderer).await
}

/// Create application state around an existing renderer.
pub async fn create_app_state_with_renderer(
    config: AppConfig,
    renderer: RenderService,
) -> anyhow::Result<AppState> {
    let config = Arc::new(config);

    let catalog = Arc::new(match &config.templates_dir {
        Some(dir) => TemplateCatalog::with_directory(dir),
        None => TemplateCatalog::builtin(),
    });
    let llm = Arc::new(
        LlmService::new(config.llm.clone())
            .map_err(|e| anyhow::anyhow!("Failed to create language model client: {e}"))?,
    );
    let generator = Arc::new(PosterGenerator::new(
        catalog.clone(),
        llm.clone(),
        config.clone(),
    ));
    let store: Arc<dyn PosterStore> = Arc::new(
        FilePosterStore::open(&config.data_dir)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open poster store: {e}"))?,
    );

    tracing::info!(
        templates = catalog.len(),
        llm_enabled = llm.is_enabled(),
        provider = %config.llm.provider,
        data_dir = %config.data_dir.display(),
        "Application state created"
    );

    Ok(AppState {
        config,
        catalog,
        llm,
        generator,
        renderer: Arc::new(renderer),
        store,
        uploads: Arc::new(ImageProcessor::default()),
    })
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(api::handle_health))
        .route("/generate", post(api::handle_generate))
        .route("/templates", get(api::handle_list_templates))
        .route("/templates/:id", get(api::handle_get_template))
        .route("/upload/image", post(api::handle_upload_image))
        .route("/poster/:id", get(api::handle_get_poster))
        .route("/poster/:id/update", put(api::handle_update_poster))
        .route("/poster/:id/image", get(api::handle_poster_image))
        .route("/poster/:id/export", post(api::handle_export_poster))
        .route("/image/:id", get(api::handle_get_image))
}

/// Build the API router with all endpoints and middleware.
///
/// Every route is also served under `/api`, the prefix used in the URLs
/// the API hands out.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes())
        .nest("/api", routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
