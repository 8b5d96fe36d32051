//! services/api/src/web/auth.rs
//!
//! OAuth login endpoints: redirect construction, code callback and public profiles.

use axum::{extract::State, Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::web::extract::{ApiPath, ApiQuery};
use crate::web::models::{CallbackQuery, LoginResponse, SessionResponse, UserResponse};
use crate::web::state::AppState;

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/auth/login - Build the identity provider's authorize URL
#[utoipa::path(
    get,
    path = "/api/auth/login",
    responses((status = 200, description = "Provider redirect and state token", body = LoginResponse)),
    tag = "auth"
)]
pub async fn login_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<LoginResponse>> {
    let redirect = state.identity.begin_login().await?;
    Ok(Json(LoginResponse {
        auth_url: redirect.auth_url,
        state: redirect.state,
    }))
}

/// GET /api/auth/callback - Exchange the authorization code for a session
#[utoipa::path(
    get,
    path = "/api/auth/callback",
    params(CallbackQuery),
    responses(
        (status = 200, description = "Login completed", body = SessionResponse),
        (status = 400, description = "Provider rejected the code or the state is unknown", body = crate::error::ErrorBody),
        (status = 500, description = "Provider unreachable", body = crate::error::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn callback_handler(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<CallbackQuery>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state
        .identity
        .complete_login(&query.code, query.state.as_deref())
        .await?;
    Ok(Json(session.into()))
}

/// GET /api/auth/user/{id} - Public profile of a user
#[utoipa::path(
    get,
    path = "/api/auth/user/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "No such user", body = crate::error::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(state.identity.user(id).await?.into()))
}
