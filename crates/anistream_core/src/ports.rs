//! crates/anistream_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage engines and third-party HTTP APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Edge, EdgeKind, Episode, ExternalTitle, HistoryEntry, PageRequest, Title, TitleDraft,
    TitleFilter, User, UserUpsert,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Upstream service failed: {0}")]
    Upstream(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait CatalogStore: Send + Sync {
    // --- Listing ---
    /// Returns one page of matching titles in stable catalog order, plus the filtered total.
    async fn list_titles(&self, filter: &TitleFilter, page: PageRequest) -> PortResult<(Vec<Title>, u64)>;

    async fn featured_titles(&self, limit: usize) -> PortResult<Vec<Title>>;

    async fn trending_titles(&self, limit: usize) -> PortResult<Vec<Title>>;

    async fn recent_titles(&self, limit: usize) -> PortResult<Vec<Title>>;

    /// Deduplicated union of every title's genres, sorted.
    async fn list_genres(&self) -> PortResult<Vec<String>>;

    async fn count_titles(&self) -> PortResult<u64>;

    // --- Single titles ---
    async fn get_title(&self, id: Uuid) -> PortResult<Title>;

    /// Fetches every existing title among `ids`; missing ids are skipped.
    async fn get_titles_by_ids(&self, ids: &[Uuid]) -> PortResult<Vec<Title>>;

    async fn find_by_external_id(&self, external_id: i64) -> PortResult<Option<Title>>;

    /// Persists a fully built title. Fails with `Conflict` if its external id is taken.
    async fn insert_title(&self, title: Title) -> PortResult<Title>;

    async fn update_title(&self, id: Uuid, draft: TitleDraft) -> PortResult<Title>;

    async fn delete_title(&self, id: Uuid) -> PortResult<()>;

    // --- Episodes (whole-list atomic rewrites) ---
    async fn add_episode(&self, title_id: Uuid, episode: Episode) -> PortResult<()>;

    async fn list_episodes(&self, title_id: Uuid) -> PortResult<Vec<Episode>>;

    /// Removes every episode with the given number.
    async fn remove_episodes(&self, title_id: Uuid, number: i32) -> PortResult<()>;
}

#[async_trait]
pub trait PersonalizationStore: Send + Sync {
    // --- Watchlist / Favorites ---
    async fn has_edge(&self, kind: EdgeKind, user_id: Uuid, title_id: Uuid) -> PortResult<bool>;

    /// Inserts the pair. Fails with `Conflict` if it already exists.
    async fn add_edge(&self, kind: EdgeKind, user_id: Uuid, title_id: Uuid) -> PortResult<()>;

    /// Deletes the pair. Fails with `NotFound` if it does not exist.
    async fn remove_edge(&self, kind: EdgeKind, user_id: Uuid, title_id: Uuid) -> PortResult<()>;

    /// All edges of the user, oldest first.
    async fn list_edges(&self, kind: EdgeKind, user_id: Uuid) -> PortResult<Vec<Edge>>;

    // --- History ---
    /// Atomic upsert keyed by (user, title, episode).
    async fn record_history(
        &self,
        user_id: Uuid,
        title_id: Uuid,
        episode_number: i32,
        progress: f64,
    ) -> PortResult<HistoryEntry>;

    /// All history entries of the user, most recently watched first.
    async fn list_history(&self, user_id: Uuid) -> PortResult<Vec<HistoryEntry>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates or refreshes the user keyed by the provider subject id.
    async fn upsert_user(&self, profile: UserUpsert) -> PortResult<User>;

    async fn get_user(&self, id: Uuid) -> PortResult<User>;
}

//=========================================================================================
// External Service Ports (Traits)
//=========================================================================================

/// Tokens returned by the identity provider's code exchange.
#[derive(Debug, Clone)]
pub struct ProviderTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// The authenticated profile reported by the identity provider.
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    pub subject_id: String,
    pub username: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Builds the provider's login URL carrying the given state token.
    fn authorization_url(&self, state: &str) -> PortResult<String>;

    /// Exchanges an authorization code for tokens.
    async fn exchange_code(&self, code: &str) -> PortResult<ProviderTokens>;

    /// Fetches the profile belonging to a bearer token.
    async fn fetch_profile(&self, access_token: &str) -> PortResult<ProviderProfile>;
}

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Raw search passthrough.
    async fn search(&self, query: &str, page: u32) -> PortResult<serde_json::Value>;

    /// Fetches one record. `Ok(None)` means the provider reported it missing.
    async fn fetch(&self, external_id: i64) -> PortResult<Option<ExternalTitle>>;
}
