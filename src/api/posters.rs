use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use poster_core::{PosterDocument, RasterFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::generate::poster_url;
use crate::error::ApiError;
use crate::models::PosterId;
use crate::server::AppState;
use crate::services::PosterRecord;

#[derive(Debug, Serialize, ToSchema)]
pub struct PosterResponse {
    #[schema(value_type = String)]
    pub poster_id: PosterId,
    #[schema(value_type = Object)]
    pub poster_data: PosterDocument,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePosterRequest {
    /// Full poster document, usually an edited copy of `poster_data`
    #[serde(default)]
    #[schema(value_type = Object)]
    pub poster_data: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdatePosterResponse {
    #[schema(value_type = String)]
    pub poster_id: PosterId,
    pub poster_url: String,
    #[schema(value_type = Object)]
    pub poster_data: PosterDocument,
    pub message: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ExportRequest {
    /// png (default), jpeg, jpg or pdf
    #[serde(default)]
    pub format: Option<String>,
}

/// Output format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Raster(RasterFormat),
    Pdf,
}

impl ExportFormat {
    /// Unknown names export as PNG
    pub fn parse(name: Option<&str>) -> Self {
        match name.map(|n| n.trim().to_ascii_lowercase()).as_deref() {
            Some("pdf") => ExportFormat::Pdf,
            Some("jpeg") | Some("jpg") => ExportFormat::Raster(RasterFormat::Jpeg),
            _ => ExportFormat::Raster(RasterFormat::Png),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Raster(format) => format.mime_type(),
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Raster(format) => format.extension(),
            ExportFormat::Pdf => "pdf",
        }
    }
}

async fn load_record(state: &AppState, id: &PosterId) -> Result<PosterRecord, ApiError> {
    state
        .store
        .get(id)
        .await?
        .ok_or(ApiError::NotFound("Poster"))
}

/// Get a stored poster document
#[utoipa::path(
    get,
    path = "/poster/{id}",
    params(("id" = String, Path, description = "Poster id")),
    responses(
        (status = 200, description = "Stored poster document", body = PosterResponse),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Poster not found"),
    ),
    tag = "Posters"
)]
pub async fn handle_get_poster(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PosterResponse>, ApiError> {
    let id = PosterId::parse(&id)?;
    let record = load_record(&state, &id).await?;

    Ok(Json(PosterResponse {
        poster_id: record.poster_id,
        poster_data: record.poster_data,
    }))
}

/// Replace a poster document and re-render it
///
/// Creates the poster when the id is unknown.
#[utoipa::path(
    put,
    path = "/poster/{id}/update",
    params(("id" = String, Path, description = "Poster id")),
    request_body = UpdatePosterRequest,
    responses(
        (status = 200, description = "Poster re-rendered and stored", body = UpdatePosterResponse),
        (status = 400, description = "Missing or invalid poster_data"),
    ),
    tag = "Posters"
)]
pub async fn handle_update_poster(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePosterRequest>,
) -> Result<Json<UpdatePosterResponse>, ApiError> {
    let id = PosterId::parse(&id)?;
    let value = request
        .poster_data
        .filter(|v| v.as_object().is_some_and(|o| !o.is_empty()))
        .ok_or_else(|| ApiError::BadRequest("poster_data is required".to_string()))?;
    let document: PosterDocument = serde_json::from_value(value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid poster_data: {e}")))?;

    let png = state
        .renderer
        .render(document.clone(), RasterFormat::Png)
        .await?;

    let now = Utc::now();
    let existing = state.store.get(&id).await?;
    let record = PosterRecord {
        poster_id: id.clone(),
        prompt: existing.as_ref().and_then(|r| r.prompt.clone()),
        poster_data: document,
        created_at: existing.map_or(now, |r| r.created_at),
        updated_at: now,
    };
    state.store.put(&record, &png).await?;

    tracing::info!(poster_id = %id, "Poster updated");

    Ok(Json(UpdatePosterResponse {
        poster_url: poster_url(&id),
        poster_id: id,
        poster_data: record.poster_data,
        message: "Poster updated successfully".to_string(),
    }))
}

/// Rendered PNG of a stored poster
#[utoipa::path(
    get,
    path = "/poster/{id}/image",
    params(("id" = String, Path, description = "Poster id")),
    responses(
        (status = 200, description = "PNG image", content_type = "image/png"),
        (status = 404, description = "Poster not found"),
    ),
    tag = "Posters"
)]
pub async fn handle_poster_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = PosterId::parse(&id)?;
    let png = state
        .store
        .get_png(&id)
        .await?
        .ok_or(ApiError::NotFound("Poster"))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CONTENT_LENGTH, &png.len().to_string()),
        ],
        Bytes::from(png),
    )
        .into_response())
}

/// Export a stored poster as PNG, JPEG or PDF
#[utoipa::path(
    post,
    path = "/poster/{id}/export",
    params(("id" = String, Path, description = "Poster id")),
    request_body = ExportRequest,
    responses(
        (status = 200, description = "File download"),
        (status = 404, description = "Poster not found"),
        (status = 501, description = "PDF support not compiled in"),
    ),
    tag = "Posters"
)]
pub async fn handle_export_poster(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Option<Json<ExportRequest>>,
) -> Result<Response, ApiError> {
    let id = PosterId::parse(&id)?;
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let format = ExportFormat::parse(request.format.as_deref());
    let record = load_record(&state, &id).await?;

    let bytes = match format {
        ExportFormat::Raster(raster) => state.renderer.render(record.poster_data, raster).await?,
        ExportFormat::Pdf => state.renderer.render_pdf(record.poster_data).await?,
    };

    tracing::info!(poster_id = %id, format = format.extension(), bytes = bytes.len(), "Poster exported");

    let disposition = format!("attachment; filename=\"{id}.{}\"", format.extension());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.mime_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, bytes.len().to_string()),
        ],
        Bytes::from(bytes),
    )
        .into_response())
}
