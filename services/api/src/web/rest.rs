//! services/api/src/web/rest.rs
//!
//! Service-level handlers and the master definition for the OpenAPI specification.

use axum::{extract::State, Json};
use std::sync::Arc;
use utoipa::OpenApi;

use anistream_core::services::SeedOutcome;

use crate::error::{ApiResult, ErrorBody};
use crate::web::models::{
    CreatedResponse, EpisodeDto, FavoritesCheckResponse, HistoryInput, HistoryResponse,
    LoginResponse, MessageResponse, SessionResponse, TitleInput, TitlePageResponse, TitleResponse,
    UserResponse, WatchlistCheckResponse,
};
use crate::web::state::AppState;
use crate::web::{auth, external, personalization, titles};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        root_handler,
        seed_handler,
        auth::login_handler,
        auth::callback_handler,
        auth::get_user_handler,
        titles::list_titles_handler,
        titles::featured_titles_handler,
        titles::trending_titles_handler,
        titles::recent_titles_handler,
        titles::genres_handler,
        titles::get_title_handler,
        titles::create_title_handler,
        titles::update_title_handler,
        titles::delete_title_handler,
        titles::add_episode_handler,
        titles::list_episodes_handler,
        titles::remove_episode_handler,
        personalization::get_watchlist_handler,
        personalization::add_to_watchlist_handler,
        personalization::remove_from_watchlist_handler,
        personalization::check_watchlist_handler,
        personalization::get_favorites_handler,
        personalization::add_to_favorites_handler,
        personalization::remove_from_favorites_handler,
        personalization::check_favorites_handler,
        personalization::get_history_handler,
        personalization::record_history_handler,
        external::search_handler,
        external::import_handler,
    ),
    components(
        schemas(
            ErrorBody,
            MessageResponse,
            CreatedResponse,
            TitleResponse,
            TitleInput,
            TitlePageResponse,
            EpisodeDto,
            LoginResponse,
            SessionResponse,
            UserResponse,
            WatchlistCheckResponse,
            FavoritesCheckResponse,
            HistoryInput,
            HistoryResponse,
        )
    ),
    tags(
        (name = "AniStream API", description = "Catalog, personalization and login endpoints for the AniStream site."),
        (name = "titles", description = "Catalog titles"),
        (name = "episodes", description = "Episodes nested under a title"),
        (name = "personalization", description = "Watchlist, favorites and watch history"),
        (name = "auth", description = "OAuth login"),
        (name = "external", description = "External metadata search and import")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Service banner.
#[utoipa::path(
    get,
    path = "/api/",
    responses((status = 200, description = "Service name and version", body = MessageResponse)),
    tag = "AniStream API"
)]
pub async fn root_handler() -> Json<MessageResponse> {
    Json(MessageResponse::new("AniStream API v1.0"))
}

/// Fill an empty catalog with the sample titles.
///
/// Does nothing if any title already exists.
#[utoipa::path(
    post,
    path = "/api/seed",
    responses((status = 200, description = "Seed result", body = MessageResponse)),
    tag = "AniStream API"
)]
pub async fn seed_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<MessageResponse>> {
    let message = match state.catalog.seed().await? {
        SeedOutcome::AlreadySeeded => "Database already seeded".to_string(),
        SeedOutcome::Seeded(count) => format!("Seeded {} titles", count),
    };
    Ok(Json(MessageResponse::new(message)))
}
