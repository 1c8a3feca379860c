use axum::{extract::State, response::Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::server::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "ok" when the server answers
    pub status: String,
    pub llm_api: LlmStatus,
    pub services: ServiceStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LlmStatus {
    pub available: bool,
    /// Configured provider, null when the model is disabled
    pub provider: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceStatus {
    pub template: bool,
    pub renderer: bool,
    pub image: bool,
    /// PDF export compiled in
    pub pdf: bool,
}

/// Service health and language model status
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse),
    ),
    tag = "Health"
)]
pub async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let enabled = state.llm.is_enabled();

    Json(HealthResponse {
        status: "ok".to_string(),
        llm_api: LlmStatus {
            available: state.llm.is_available(),
            provider: enabled.then(|| state.llm.provider_name().to_string()),
            enabled,
        },
        services: ServiceStatus {
            template: !state.catalog.is_empty(),
            renderer: true,
            image: true,
            pdf: poster_core::pdf_supported(),
        },
    })
}
