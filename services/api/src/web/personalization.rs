//! services/api/src/web/personalization.rs
//!
//! Per-user watchlist, favorites and watch history.

use axum::{extract::State, Json};
use std::sync::Arc;
use uuid::Uuid;

use anistream_core::domain::EdgeKind;

use crate::error::ApiResult;
use crate::web::extract::{ApiPath, QueryOrJson};
use crate::web::models::{
    titles_response, FavoritesCheckResponse, HistoryInput, HistoryResponse, MessageResponse,
    TitleResponse, WatchlistCheckResponse,
};
use crate::web::state::AppState;

async fn list_edge(state: &AppState, kind: EdgeKind, user_id: Uuid) -> ApiResult<Json<Vec<TitleResponse>>> {
    let titles = state.personalization.list(kind, user_id).await?;
    Ok(Json(titles_response(titles)))
}

//=========================================================================================
// Watchlist
//=========================================================================================

/// The user's watchlist, oldest addition first.
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/watchlist",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses((status = 200, description = "Titles on the watchlist", body = [TitleResponse])),
    tag = "personalization"
)]
pub async fn get_watchlist_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<TitleResponse>>> {
    list_edge(&state, EdgeKind::Watchlist, user_id).await
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/watchlist/{title_id}",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
        ("title_id" = Uuid, Path, description = "Title id")
    ),
    responses(
        (status = 200, description = "Added", body = MessageResponse),
        (status = 400, description = "Already on the watchlist", body = crate::error::ErrorBody)
    ),
    tag = "personalization"
)]
pub async fn add_to_watchlist_handler(
    State(state): State<Arc<AppState>>,
    ApiPath((user_id, title_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .personalization
        .add(EdgeKind::Watchlist, user_id, title_id)
        .await?;
    Ok(Json(MessageResponse::new("Added to watchlist")))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/watchlist/{title_id}",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
        ("title_id" = Uuid, Path, description = "Title id")
    ),
    responses(
        (status = 200, description = "Removed", body = MessageResponse),
        (status = 404, description = "Not on the watchlist", body = crate::error::ErrorBody)
    ),
    tag = "personalization"
)]
pub async fn remove_from_watchlist_handler(
    State(state): State<Arc<AppState>>,
    ApiPath((user_id, title_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .personalization
        .remove(EdgeKind::Watchlist, user_id, title_id)
        .await?;
    Ok(Json(MessageResponse::new("Removed from watchlist")))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/watchlist/{title_id}/check",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
        ("title_id" = Uuid, Path, description = "Title id")
    ),
    responses((status = 200, description = "Membership flag", body = WatchlistCheckResponse)),
    tag = "personalization"
)]
pub async fn check_watchlist_handler(
    State(state): State<Arc<AppState>>,
    ApiPath((user_id, title_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<WatchlistCheckResponse>> {
    let in_watchlist = state
        .personalization
        .check(EdgeKind::Watchlist, user_id, title_id)
        .await?;
    Ok(Json(WatchlistCheckResponse { in_watchlist }))
}

//=========================================================================================
// Favorites
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/favorites",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses((status = 200, description = "Favorite titles", body = [TitleResponse])),
    tag = "personalization"
)]
pub async fn get_favorites_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<TitleResponse>>> {
    list_edge(&state, EdgeKind::Favorites, user_id).await
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/favorites/{title_id}",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
        ("title_id" = Uuid, Path, description = "Title id")
    ),
    responses(
        (status = 200, description = "Added", body = MessageResponse),
        (status = 400, description = "Already a favorite", body = crate::error::ErrorBody)
    ),
    tag = "personalization"
)]
pub async fn add_to_favorites_handler(
    State(state): State<Arc<AppState>>,
    ApiPath((user_id, title_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .personalization
        .add(EdgeKind::Favorites, user_id, title_id)
        .await?;
    Ok(Json(MessageResponse::new("Added to favorites")))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/favorites/{title_id}",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
        ("title_id" = Uuid, Path, description = "Title id")
    ),
    responses(
        (status = 200, description = "Removed", body = MessageResponse),
        (status = 404, description = "Not a favorite", body = crate::error::ErrorBody)
    ),
    tag = "personalization"
)]
pub async fn remove_from_favorites_handler(
    State(state): State<Arc<AppState>>,
    ApiPath((user_id, title_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .personalization
        .remove(EdgeKind::Favorites, user_id, title_id)
        .await?;
    Ok(Json(MessageResponse::new("Removed from favorites")))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/favorites/{title_id}/check",
    params(
        ("user_id" = Uuid, Path, description = "User id"),
        ("title_id" = Uuid, Path, description = "Title id")
    ),
    responses((status = 200, description = "Membership flag", body = FavoritesCheckResponse)),
    tag = "personalization"
)]
pub async fn check_favorites_handler(
    State(state): State<Arc<AppState>>,
    ApiPath((user_id, title_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<FavoritesCheckResponse>> {
    let in_favorites = state
        .personalization
        .check(EdgeKind::Favorites, user_id, title_id)
        .await?;
    Ok(Json(FavoritesCheckResponse { in_favorites }))
}

//=========================================================================================
// History
//=========================================================================================

/// Watch history, most recent first, each entry with its title.
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/history",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses((status = 200, description = "History entries", body = [HistoryResponse])),
    tag = "personalization"
)]
pub async fn get_history_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<HistoryResponse>>> {
    let items = state.personalization.history(user_id).await?;
    Ok(Json(items.into_iter().map(HistoryResponse::from).collect()))
}

/// Record progress on an episode. Repeat writes refresh the same entry.
///
/// The fields may be sent as query parameters or as a JSON body.
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/history",
    params(("user_id" = Uuid, Path, description = "User id"), HistoryInput),
    request_body(content = HistoryInput, description = "Used when the query string is empty"),
    responses(
        (status = 200, description = "History updated", body = MessageResponse),
        (status = 422, description = "Malformed input", body = crate::error::ErrorBody)
    ),
    tag = "personalization"
)]
pub async fn record_history_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<Uuid>,
    QueryOrJson(input): QueryOrJson<HistoryInput>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .personalization
        .record_history(user_id, input.title_id, input.episode_number, input.progress)
        .await?;
    Ok(Json(MessageResponse::new("History updated")))
}
