//! services/api/src/web/titles.rs
//!
//! Catalog handlers: title listing, shelves, CRUD and the nested episode list.

use axum::{extract::State, Json};
use std::sync::Arc;
use uuid::Uuid;

use anistream_core::domain::{PageRequest, TitleFilter, DEFAULT_PAGE_SIZE};

use crate::error::ApiResult;
use crate::web::extract::{ApiJson, ApiPath, ApiQuery};
use crate::web::models::{
    titles_response, CreatedResponse, EpisodeDto, MessageResponse, TitleInput, TitleListQuery,
    TitlePageResponse, TitleResponse,
};
use crate::web::state::AppState;

//=========================================================================================
// Listing
//=========================================================================================

/// List titles, filtered and paginated.
///
/// Filters combine with AND. Results are in creation order.
#[utoipa::path(
    get,
    path = "/api/titles",
    params(TitleListQuery),
    responses(
        (status = 200, description = "One page of titles", body = TitlePageResponse),
        (status = 422, description = "Page or limit out of range", body = crate::error::ErrorBody)
    ),
    tag = "titles"
)]
pub async fn list_titles_handler(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<TitleListQuery>,
) -> ApiResult<Json<TitlePageResponse>> {
    let page = PageRequest::new(
        query.page.unwrap_or(1),
        query.limit.unwrap_or(i64::from(DEFAULT_PAGE_SIZE)),
    )?;
    let filter = TitleFilter::new(query.genre, query.status, query.search, query.featured);
    let page = state.catalog.list(&filter, page).await?;
    Ok(Json(page.into()))
}

/// Featured titles for the hero banner.
#[utoipa::path(
    get,
    path = "/api/titles/featured",
    responses((status = 200, description = "Up to 10 featured titles", body = [TitleResponse])),
    tag = "titles"
)]
pub async fn featured_titles_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<TitleResponse>>> {
    Ok(Json(titles_response(state.catalog.featured().await?)))
}

/// Highest rated titles.
#[utoipa::path(
    get,
    path = "/api/titles/trending",
    responses((status = 200, description = "Up to 10 titles by rating", body = [TitleResponse])),
    tag = "titles"
)]
pub async fn trending_titles_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<TitleResponse>>> {
    Ok(Json(titles_response(state.catalog.trending().await?)))
}

/// Most recently added titles.
#[utoipa::path(
    get,
    path = "/api/titles/recent",
    responses((status = 200, description = "Up to 10 newest titles", body = [TitleResponse])),
    tag = "titles"
)]
pub async fn recent_titles_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<TitleResponse>>> {
    Ok(Json(titles_response(state.catalog.recent().await?)))
}

/// Every genre used in the catalog, sorted.
#[utoipa::path(
    get,
    path = "/api/titles/genres",
    responses((status = 200, description = "Sorted genre names", body = [String])),
    tag = "titles"
)]
pub async fn genres_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.catalog.genres().await?))
}

//=========================================================================================
// Single title CRUD
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/titles/{id}",
    params(("id" = Uuid, Path, description = "Title id")),
    responses(
        (status = 200, description = "The title", body = TitleResponse),
        (status = 400, description = "Malformed id", body = crate::error::ErrorBody),
        (status = 404, description = "No such title", body = crate::error::ErrorBody)
    ),
    tag = "titles"
)]
pub async fn get_title_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<TitleResponse>> {
    Ok(Json(state.catalog.get(id).await?.into()))
}

#[utoipa::path(
    post,
    path = "/api/titles",
    request_body = TitleInput,
    responses(
        (status = 200, description = "Title created", body = CreatedResponse),
        (status = 422, description = "Malformed body", body = crate::error::ErrorBody)
    ),
    tag = "titles"
)]
pub async fn create_title_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<TitleInput>,
) -> ApiResult<Json<CreatedResponse>> {
    let title = state.catalog.create(input.into()).await?;
    Ok(Json(CreatedResponse {
        id: title.id,
        message: "Title created successfully".to_string(),
    }))
}

/// Replace every mutable field of a title.
#[utoipa::path(
    put,
    path = "/api/titles/{id}",
    params(("id" = Uuid, Path, description = "Title id")),
    request_body = TitleInput,
    responses(
        (status = 200, description = "Title updated", body = CreatedResponse),
        (status = 404, description = "No such title", body = crate::error::ErrorBody)
    ),
    tag = "titles"
)]
pub async fn update_title_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<TitleInput>,
) -> ApiResult<Json<CreatedResponse>> {
    let title = state.catalog.update(id, input.into()).await?;
    Ok(Json(CreatedResponse {
        id: title.id,
        message: "Title updated successfully".to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/titles/{id}",
    params(("id" = Uuid, Path, description = "Title id")),
    responses(
        (status = 200, description = "Title deleted", body = MessageResponse),
        (status = 404, description = "No such title", body = crate::error::ErrorBody)
    ),
    tag = "titles"
)]
pub async fn delete_title_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.catalog.delete(id).await?;
    Ok(Json(MessageResponse::new("Title deleted successfully")))
}

//=========================================================================================
// Episodes
//=========================================================================================

/// Append an episode. Numbers are not required to be unique.
#[utoipa::path(
    post,
    path = "/api/titles/{id}/episodes",
    params(("id" = Uuid, Path, description = "Title id")),
    request_body = EpisodeDto,
    responses(
        (status = 200, description = "Episode added", body = MessageResponse),
        (status = 404, description = "No such title", body = crate::error::ErrorBody)
    ),
    tag = "episodes"
)]
pub async fn add_episode_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(episode): ApiJson<EpisodeDto>,
) -> ApiResult<Json<MessageResponse>> {
    state.catalog.add_episode(id, episode.into()).await?;
    Ok(Json(MessageResponse::new("Episode added successfully")))
}

#[utoipa::path(
    get,
    path = "/api/titles/{id}/episodes",
    params(("id" = Uuid, Path, description = "Title id")),
    responses(
        (status = 200, description = "Episodes in insertion order", body = [EpisodeDto]),
        (status = 404, description = "No such title", body = crate::error::ErrorBody)
    ),
    tag = "episodes"
)]
pub async fn list_episodes_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<EpisodeDto>>> {
    let episodes = state.catalog.episodes(id).await?;
    Ok(Json(episodes.into_iter().map(EpisodeDto::from).collect()))
}

/// Remove every episode carrying the given number.
#[utoipa::path(
    delete,
    path = "/api/titles/{id}/episodes/{number}",
    params(
        ("id" = Uuid, Path, description = "Title id"),
        ("number" = i32, Path, description = "Episode number")
    ),
    responses(
        (status = 200, description = "Matching episodes removed", body = MessageResponse),
        (status = 404, description = "No such title", body = crate::error::ErrorBody)
    ),
    tag = "episodes"
)]
pub async fn remove_episode_handler(
    State(state): State<Arc<AppState>>,
    ApiPath((id, number)): ApiPath<(Uuid, i32)>,
) -> ApiResult<Json<MessageResponse>> {
    state.catalog.remove_episode(id, number).await?;
    Ok(Json(MessageResponse::new("Episode deleted successfully")))
}
