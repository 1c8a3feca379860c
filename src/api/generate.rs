use axum::{extract::State, response::Json};
use chrono::Utc;
use poster_core::{PosterDocument, RasterFormat};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::PosterId;
use crate::server::AppState;
use crate::services::PosterRecord;

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateRequest {
    /// What the poster is about
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenerateResponse {
    #[schema(value_type = String)]
    pub poster_id: PosterId,
    /// Where the rendered PNG can be fetched
    pub poster_url: String,
    #[schema(value_type = Object)]
    pub poster_data: PosterDocument,
    /// "success" when the language model designed it, "fallback" otherwise
    pub status: String,
}

pub(crate) fn poster_url(id: &PosterId) -> String {
    format!("/api/poster/{id}/image")
}

/// Generate a poster from a prompt
///
/// Asks the language model for a design, falls back to a title-only design
/// when the model is unavailable, renders the PNG and stores both.
#[utoipa::path(
    post,
    path = "/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Poster generated", body = GenerateResponse),
        (status = 400, description = "Prompt missing or blank"),
    ),
    tag = "Posters"
)]
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::BadRequest("Prompt is required".to_string()));
    }

    let generated = state.generator.generate(prompt).await?;
    let png = state
        .renderer
        .render(generated.document.clone(), RasterFormat::Png)
        .await?;

    let poster_id = PosterId::generate();
    let now = Utc::now();
    let record = PosterRecord {
        poster_id: poster_id.clone(),
        prompt: Some(prompt.to_string()),
        poster_data: generated.document,
        created_at: now,
        updated_at: now,
    };
    state.store.put(&record, &png).await?;

    tracing::info!(
        poster_id = %poster_id,
        template = %record.poster_data.id,
        status = generated.source.status(),
        "Poster generated"
    );

    Ok(Json(GenerateResponse {
        poster_url: poster_url(&poster_id),
        poster_id,
        poster_data: record.poster_data,
        status: generated.source.status().to_string(),
    }))
}
