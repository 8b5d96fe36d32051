//! services/api/src/web/models.rs
//!
//! Request and response payloads for the REST API. Domain types never cross the
//! HTTP boundary directly; these structs own the wire shape.

use anistream_core::domain::{
    Episode, HistoryItem, Title, TitleDraft, TitlePage, TitleStatus, User, UserSession,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Catalog
//=========================================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EpisodeDto {
    pub number: i32,
    pub title: String,
    pub video_url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

impl From<Episode> for EpisodeDto {
    fn from(episode: Episode) -> Self {
        Self {
            number: episode.number,
            title: episode.title,
            video_url: episode.video_url,
            thumbnail: episode.thumbnail,
            duration: episode.duration,
        }
    }
}

impl From<EpisodeDto> for Episode {
    fn from(dto: EpisodeDto) -> Self {
        Self {
            number: dto.number,
            title: dto.title,
            video_url: dto.video_url,
            thumbnail: dto.thumbnail,
            duration: dto.duration,
        }
    }
}

/// A catalog title as returned by every title endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct TitleResponse {
    pub id: Uuid,
    pub external_id: Option<i64>,
    pub name: String,
    pub name_native: Option<String>,
    pub synopsis: Option<String>,
    pub cover_image: Option<String>,
    pub banner_image: Option<String>,
    pub genres: Vec<String>,
    #[schema(example = "ongoing")]
    pub status: String,
    pub rating: Option<f64>,
    pub release_year: Option<i32>,
    pub episodes: Vec<EpisodeDto>,
    pub total_episode_count: Option<i32>,
    pub is_featured: bool,
    #[schema(example = "manual")]
    pub origin: String,
    pub created_at: DateTime<Utc>,
}

impl From<Title> for TitleResponse {
    fn from(title: Title) -> Self {
        Self {
            id: title.id,
            external_id: title.external_id,
            name: title.name,
            name_native: title.name_native,
            synopsis: title.synopsis,
            cover_image: title.cover_image,
            banner_image: title.banner_image,
            genres: title.genres,
            status: title.status.as_str().to_string(),
            rating: title.rating,
            release_year: title.release_year,
            episodes: title.episodes.into_iter().map(EpisodeDto::from).collect(),
            total_episode_count: title.total_episode_count,
            is_featured: title.is_featured,
            origin: title.origin.as_str().to_string(),
            created_at: title.created_at,
        }
    }
}

pub fn titles_response(titles: Vec<Title>) -> Vec<TitleResponse> {
    titles.into_iter().map(TitleResponse::from).collect()
}

/// Body of a title create or full update.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TitleInput {
    pub name: String,
    #[serde(default)]
    pub name_native: Option<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub banner_image: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Defaults to `ongoing`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub total_episode_count: Option<i32>,
    #[serde(default)]
    pub is_featured: bool,
}

impl From<TitleInput> for TitleDraft {
    fn from(input: TitleInput) -> Self {
        Self {
            name: input.name,
            name_native: input.name_native,
            synopsis: input.synopsis,
            cover_image: input.cover_image,
            banner_image: input.banner_image,
            genres: input.genres,
            status: input
                .status
                .as_deref()
                .map(TitleStatus::from)
                .unwrap_or_default(),
            rating: input.rating,
            release_year: input.release_year,
            total_episode_count: input.total_episode_count,
            is_featured: input.is_featured,
        }
    }
}

/// Query parameters of the catalog listing.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TitleListQuery {
    /// 1-based page number. Defaults to 1.
    pub page: Option<i64>,
    /// Page size, 1 to 100. Defaults to 20.
    pub limit: Option<i64>,
    pub genre: Option<String>,
    pub status: Option<String>,
    /// Case-insensitive substring of the name or native name.
    pub search: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TitlePageResponse {
    pub data: Vec<TitleResponse>,
    pub total: u64,
    pub page: u32,
    pub pages: u64,
}

impl From<TitlePage> for TitlePageResponse {
    fn from(page: TitlePage) -> Self {
        Self {
            data: titles_response(page.items),
            total: page.total,
            page: page.page,
            pages: page.pages,
        }
    }
}

//=========================================================================================
// Generic acknowledgements
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Acknowledgement for writes that create or touch a title.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedResponse {
    pub id: Uuid,
    pub message: String,
}

//=========================================================================================
// Identity
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub auth_url: String,
    pub state: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    pub code: String,
    pub state: Option<String>,
}

/// Returned once by the login callback. The only response carrying a token.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
    pub email: Option<String>,
    pub access_token: String,
}

impl From<UserSession> for SessionResponse {
    fn from(session: UserSession) -> Self {
        Self {
            user_id: session.user_id,
            username: session.username,
            avatar: session.avatar,
            email: session.email,
            access_token: session.access_token,
        }
    }
}

/// Public user profile, without provider tokens.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub provider_subject_id: String,
    pub username: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            provider_subject_id: user.provider_subject_id,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
            created_at: user.created_at,
        }
    }
}

//=========================================================================================
// Personalization
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct WatchlistCheckResponse {
    pub in_watchlist: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoritesCheckResponse {
    pub in_favorites: bool,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryInput {
    pub title_id: Uuid,
    pub episode_number: i32,
    /// Defaults to 0.
    #[serde(default)]
    pub progress: f64,
}

/// A history entry with its title inlined.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title_id: Uuid,
    pub episode_number: i32,
    pub progress: f64,
    pub watched_at: DateTime<Utc>,
    pub title: TitleResponse,
}

impl From<HistoryItem> for HistoryResponse {
    fn from(item: HistoryItem) -> Self {
        Self {
            id: item.entry.id,
            user_id: item.entry.user_id,
            title_id: item.entry.title_id,
            episode_number: item.entry.episode_number,
            progress: item.entry.progress,
            watched_at: item.entry.watched_at,
            title: item.title.into(),
        }
    }
}

//=========================================================================================
// External metadata
//=========================================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExternalSearchQuery {
    pub q: String,
    /// Defaults to 1.
    pub page: Option<u32>,
}
