use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use poster_core::{Template, TemplateSummary};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct TemplateQuery {
    /// Only templates of this category
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateListResponse {
    #[schema(value_type = Vec<Object>)]
    pub templates: Vec<TemplateSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateResponse {
    #[schema(value_type = Object)]
    pub template: Template,
}

/// List available templates
#[utoipa::path(
    get,
    path = "/templates",
    params(TemplateQuery),
    responses(
        (status = 200, description = "Template summaries ordered by id", body = TemplateListResponse),
    ),
    tag = "Templates"
)]
pub async fn handle_list_templates(
    State(state): State<AppState>,
    Query(query): Query<TemplateQuery>,
) -> Json<TemplateListResponse> {
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    Json(TemplateListResponse {
        templates: state.catalog.list(category),
    })
}

/// Get one template
#[utoipa::path(
    get,
    path = "/templates/{id}",
    params(("id" = String, Path, description = "Template id, e.g. template_001")),
    responses(
        (status = 200, description = "Full template document", body = TemplateResponse),
        (status = 404, description = "Unknown template id"),
    ),
    tag = "Templates"
)]
pub async fn handle_get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TemplateResponse>, ApiError> {
    let template = state
        .catalog
        .get(&id)
        .cloned()
        .ok_or(ApiError::NotFound("Template"))?;
    Ok(Json(TemplateResponse { template }))
}
