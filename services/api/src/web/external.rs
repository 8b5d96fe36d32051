//! services/api/src/web/external.rs
//!
//! Pass-through search and single-record import from the external metadata provider.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::web::extract::{ApiPath, ApiQuery};
use crate::web::models::{CreatedResponse, ExternalSearchQuery};
use crate::web::state::AppState;

/// Proxy a search to the metadata provider and return its JSON untouched.
#[utoipa::path(
    get,
    path = "/api/external/search",
    params(ExternalSearchQuery),
    responses(
        (status = 200, description = "Raw provider response", content_type = "application/json"),
        (status = 500, description = "Provider failed", body = crate::error::ErrorBody)
    ),
    tag = "external"
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ExternalSearchQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let results = state
        .importer
        .search(&query.q, query.page.unwrap_or(1))
        .await?;
    Ok(Json(results))
}

/// Import one provider record into the catalog.
#[utoipa::path(
    post,
    path = "/api/external/import/{external_id}",
    params(("external_id" = i64, Path, description = "Provider record id")),
    responses(
        (status = 200, description = "Title imported", body = CreatedResponse),
        (status = 400, description = "Already imported", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown to the provider", body = crate::error::ErrorBody)
    ),
    tag = "external"
)]
pub async fn import_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(external_id): ApiPath<i64>,
) -> ApiResult<Json<CreatedResponse>> {
    let title = state.importer.import(external_id).await?;
    Ok(Json(CreatedResponse {
        id: title.id,
        message: "Title imported successfully".to_string(),
    }))
}
