use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::ImageId;
use crate::server::AppState;
use crate::services::UploadError;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    #[schema(value_type = String)]
    pub image_id: ImageId,
    /// Usable as an image element `url`
    pub url: String,
    pub message: String,
}

/// Upload an image for use in posters
///
/// Accepts png, jpg, jpeg, gif and webp up to 10 MiB in the multipart field
/// `file`. The image is shrunk to fit 1920x1920 and re-encoded.
#[utoipa::path(
    post,
    path = "/upload/image",
    request_body(content_type = "multipart/form-data", description = "Form with a `file` field"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing file, bad type or undecodable image"),
        (status = 413, description = "File too large"),
    ),
    tag = "Images"
)]
pub async fn handle_upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or(UploadError::MissingFile)?;
    if filename.is_empty() {
        return Err(UploadError::MissingFile.into());
    }

    let processor = state.uploads.clone();
    let image = tokio::task::spawn_blocking(move || processor.process(&data, &filename))
        .await
        .map_err(|e| ApiError::Internal(format!("Upload task failed: {e}")))??;

    let image_id = ImageId::generate();
    state.store.put_image(&image_id, &image).await?;

    tracing::info!(
        image_id = %image_id,
        format = image.format.extension(),
        bytes = image.bytes.len(),
        "Image uploaded"
    );

    Ok(Json(UploadResponse {
        url: format!("/api/image/{image_id}"),
        image_id,
        message: "Image uploaded successfully".to_string(),
    }))
}

/// Get an uploaded image
#[utoipa::path(
    get,
    path = "/image/{id}",
    params(("id" = String, Path, description = "Image id")),
    responses(
        (status = 200, description = "Stored image bytes"),
        (status = 404, description = "Image not found"),
    ),
    tag = "Images"
)]
pub async fn handle_get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = ImageId::parse(&id)?;
    let image = state
        .store
        .get_image(&id)
        .await?
        .ok_or(ApiError::NotFound("Image"))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, image.format.mime_type().to_string()),
            (header::CONTENT_LENGTH, image.bytes.len().to_string()),
        ],
        Bytes::from(image.bytes),
    )
        .into_response())
}
