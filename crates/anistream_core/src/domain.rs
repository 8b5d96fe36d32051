//! crates/anistream_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::ports::{PortError, PortResult};

/// Largest page size accepted by the paginated catalog listing.
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Size of the fixed featured/trending/recent shelves.
pub const SHELF_SIZE: usize = 10;

//=========================================================================================
// Catalog
//=========================================================================================

/// Airing status of a title. Anything other than the two known values is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TitleStatus {
    #[default]
    Ongoing,
    Completed,
    Other(String),
}

impl TitleStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TitleStatus::Ongoing => "ongoing",
            TitleStatus::Completed => "completed",
            TitleStatus::Other(s) => s,
        }
    }
}

impl From<&str> for TitleStatus {
    fn from(value: &str) -> Self {
        match value {
            "ongoing" => TitleStatus::Ongoing,
            "completed" => TitleStatus::Completed,
            other => TitleStatus::Other(other.to_string()),
        }
    }
}

/// Where a title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleOrigin {
    Manual,
    Imported,
}

impl TitleOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            TitleOrigin::Manual => "manual",
            TitleOrigin::Imported => "imported",
        }
    }

    pub fn parse(value: &str) -> PortResult<Self> {
        match value {
            "manual" => Ok(TitleOrigin::Manual),
            "imported" => Ok(TitleOrigin::Imported),
            other => Err(PortError::Unexpected(format!("unknown title origin '{}'", other))),
        }
    }
}

/// A single episode, owned by exactly one title.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    pub number: i32,
    pub title: String,
    pub video_url: String,
    pub thumbnail: Option<String>,
    pub duration: Option<String>,
}

/// A catalog media entity with its embedded episode list.
#[derive(Debug, Clone, PartialEq)]
pub struct Title {
    pub id: Uuid,
    pub external_id: Option<i64>,
    pub name: String,
    pub name_native: Option<String>,
    pub synopsis: Option<String>,
    pub cover_image: Option<String>,
    pub banner_image: Option<String>,
    pub genres: Vec<String>,
    pub status: TitleStatus,
    pub rating: Option<f64>,
    pub release_year: Option<i32>,
    pub episodes: Vec<Episode>,
    pub total_episode_count: Option<i32>,
    pub is_featured: bool,
    pub origin: TitleOrigin,
    pub created_at: DateTime<Utc>,
}

/// The caller-editable fields of a title, used for both create and full update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TitleDraft {
    pub name: String,
    pub name_native: Option<String>,
    pub synopsis: Option<String>,
    pub cover_image: Option<String>,
    pub banner_image: Option<String>,
    pub genres: Vec<String>,
    pub status: TitleStatus,
    pub rating: Option<f64>,
    pub release_year: Option<i32>,
    pub total_episode_count: Option<i32>,
    pub is_featured: bool,
}

impl Title {
    /// Builds a brand new manual title from a draft.
    pub fn from_draft(draft: TitleDraft) -> Self {
        let mut title = Title {
            id: Uuid::new_v4(),
            external_id: None,
            name: String::new(),
            name_native: None,
            synopsis: None,
            cover_image: None,
            banner_image: None,
            genres: Vec::new(),
            status: TitleStatus::Ongoing,
            rating: None,
            release_year: None,
            episodes: Vec::new(),
            total_episode_count: None,
            is_featured: false,
            origin: TitleOrigin::Manual,
            created_at: Utc::now(),
        };
        title.apply(draft);
        title
    }

    /// Replaces every mutable field with the draft's values.
    /// Identity, origin, episodes and `created_at` are left alone.
    pub fn apply(&mut self, draft: TitleDraft) {
        self.name = draft.name;
        self.name_native = draft.name_native;
        self.synopsis = draft.synopsis;
        self.cover_image = draft.cover_image;
        self.banner_image = draft.banner_image;
        self.genres = draft.genres;
        self.status = draft.status;
        self.rating = draft.rating;
        self.release_year = draft.release_year;
        self.total_episode_count = draft.total_episode_count;
        self.is_featured = draft.is_featured;
    }
}

/// Catalog listing filters. Every field is optional and all present fields AND together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleFilter {
    pub genre: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

impl TitleFilter {
    /// Builds a filter, treating empty strings as "not supplied".
    pub fn new(
        genre: Option<String>,
        status: Option<String>,
        search: Option<String>,
        featured: Option<bool>,
    ) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            genre: non_empty(genre),
            status: non_empty(status),
            search: non_empty(search),
            featured,
        }
    }

    /// Evaluates the filter against a title in memory.
    pub fn matches(&self, title: &Title) -> bool {
        if let Some(genre) = &self.genre {
            if !title.genres.iter().any(|g| g == genre) {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if title.status.as_str() != status {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_name = title.name.to_lowercase().contains(&needle);
            let in_native = title
                .name_native
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&needle));
            if !in_name && !in_native {
                return false;
            }
        }
        if let Some(featured) = self.featured {
            if title.is_featured != featured {
                return false;
            }
        }
        true
    }
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Validates raw paging input. Out-of-range values are rejected, never clamped.
    pub fn new(page: i64, limit: i64) -> PortResult<Self> {
        if page < 1 || page > i64::from(u32::MAX) {
            return Err(PortError::Validation(format!(
                "page must be between 1 and {}, got {}",
                u32::MAX,
                page
            )));
        }
        if limit < 1 || limit > i64::from(MAX_PAGE_SIZE) {
            return Err(PortError::Validation(format!(
                "limit must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, limit
            )));
        }
        Ok(Self {
            page: page as u32,
            limit: limit as u32,
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// `ceil(total / limit)`.
    pub fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of a filtered catalog listing.
#[derive(Debug, Clone)]
pub struct TitlePage {
    pub items: Vec<Title>,
    pub total: u64,
    pub page: u32,
    pub pages: u64,
}

/// Stable catalog order: oldest first, ties by id.
pub fn catalog_order(a: &Title, b: &Title) -> Ordering {
    a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
}

/// Trending order: rating descending with unrated titles last, then catalog order.
pub fn trending_order(a: &Title, b: &Title) -> Ordering {
    match (a.rating, b.rating) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| catalog_order(a, b))
}

/// Recent order: newest first, ties by id.
pub fn recent_order(a: &Title, b: &Title) -> Ordering {
    b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id))
}

//=========================================================================================
// Users
//=========================================================================================

// Represents a user - tokens never leave the service except on the login callback
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub provider_subject_id: String,
    pub username: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Profile and tokens reported by the identity provider on login.
#[derive(Debug, Clone)]
pub struct UserUpsert {
    pub provider_subject_id: String,
    pub username: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// What the login callback hands back to the caller.
#[derive(Debug, Clone)]
pub struct UserSession {
    pub user_id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
    pub email: Option<String>,
    pub access_token: String,
}

/// Provider redirect for starting a login.
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    pub auth_url: String,
    pub state: String,
}

//=========================================================================================
// Personalization
//=========================================================================================

/// The two set-like per-user relations. History has its own contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Watchlist,
    Favorites,
}

impl EdgeKind {
    pub fn label(&self) -> &'static str {
        match self {
            EdgeKind::Watchlist => "watchlist",
            EdgeKind::Favorites => "favorites",
        }
    }
}

/// A watchlist or favorites row.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub user_id: Uuid,
    pub title_id: Uuid,
    pub added_at: DateTime<Utc>,
}

/// A single watch-history row, unique per (user, title, episode).
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title_id: Uuid,
    pub episode_number: i32,
    pub progress: f64,
    pub watched_at: DateTime<Utc>,
}

/// A history entry joined with its title.
#[derive(Debug, Clone)]
pub struct HistoryItem {
    pub entry: HistoryEntry,
    pub title: Title,
}

//=========================================================================================
// External metadata
//=========================================================================================

/// The fields consumed from an external metadata record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalTitle {
    pub external_id: i64,
    pub name: String,
    pub name_native: Option<String>,
    pub synopsis: Option<String>,
    pub image_url: Option<String>,
    pub genres: Vec<String>,
    pub airing: bool,
    pub score: Option<f64>,
    pub year: Option<i32>,
    pub episodes: Option<i32>,
}

impl ExternalTitle {
    /// Projects the external record into a new imported title. Episodes are never populated.
    pub fn into_title(self) -> Title {
        let status = if self.airing {
            TitleStatus::Ongoing
        } else {
            TitleStatus::Completed
        };
        let mut title = Title::from_draft(TitleDraft {
            name: self.name,
            name_native: self.name_native,
            synopsis: self.synopsis,
            cover_image: self.image_url.clone(),
            banner_image: self.image_url,
            genres: self.genres,
            status,
            rating: self.score,
            release_year: self.year,
            total_episode_count: self.episodes,
            is_featured: false,
        });
        title.external_id = Some(self.external_id);
        title.origin = TitleOrigin::Imported;
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn title(name: &str) -> Title {
        Title::from_draft(TitleDraft {
            name: name.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn page_request_rejects_out_of_range_limits() {
        assert!(matches!(PageRequest::new(1, 0), Err(PortError::Validation(_))));
        assert!(matches!(PageRequest::new(1, 101), Err(PortError::Validation(_))));
        assert!(matches!(PageRequest::new(0, 20), Err(PortError::Validation(_))));
        match PageRequest::new(i64::from(u32::MAX) + 1, 20) {
            Err(PortError::Validation(detail)) => {
                assert_eq!(detail, "page must be between 1 and 4294967295, got 4294967296");
            }
            other => panic!("expected a validation error, got {:?}", other),
        }
        assert!(PageRequest::new(i64::from(u32::MAX), 20).is_ok());
        assert!(PageRequest::new(1, 1).is_ok());
        assert!(PageRequest::new(3, 100).is_ok());
    }

    #[test]
    fn page_count_rounds_up() {
        let page = PageRequest::new(2, 20).unwrap();
        assert_eq!(page.offset(), 20);
        assert_eq!(page.page_count(0), 0);
        assert_eq!(page.page_count(20), 1);
        assert_eq!(page.page_count(21), 2);
        assert_eq!(page.page_count(45), 3);
    }

    #[test]
    fn filter_combines_fields_with_and() {
        let mut t = title("Attack on Titan");
        t.name_native = Some("進撃の巨人".to_string());
        t.genres = vec!["Action".to_string(), "Drama".to_string()];
        t.status = TitleStatus::Completed;
        t.is_featured = true;

        assert!(TitleFilter::default().matches(&t));
        assert!(TitleFilter::new(Some("Drama".into()), None, None, None).matches(&t));
        assert!(!TitleFilter::new(Some("Comedy".into()), None, None, None).matches(&t));
        assert!(TitleFilter::new(None, Some("completed".into()), Some("TITAN".into()), Some(true)).matches(&t));
        assert!(!TitleFilter::new(None, Some("ongoing".into()), Some("titan".into()), None).matches(&t));
        assert!(TitleFilter::new(None, None, Some("巨人".into()), None).matches(&t));
        assert!(!TitleFilter::new(None, None, None, Some(false)).matches(&t));
    }

    #[test]
    fn empty_filter_values_are_ignored() {
        let filter = TitleFilter::new(Some(String::new()), Some(String::new()), Some(String::new()), None);
        assert_eq!(filter, TitleFilter::default());
    }

    #[test]
    fn trending_puts_unrated_last() {
        let mut high = title("high");
        high.rating = Some(9.1);
        let mut low = title("low");
        low.rating = Some(7.0);
        let unrated = title("unrated");

        let mut titles = vec![unrated.clone(), low.clone(), high.clone()];
        titles.sort_by(trending_order);
        let names: Vec<_> = titles.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["high", "low", "unrated"]);
    }

    #[test]
    fn recent_is_newest_first() {
        let mut old = title("old");
        old.created_at = Utc::now() - Duration::days(3);
        let new = title("new");
        let mut titles = vec![old, new];
        titles.sort_by(recent_order);
        assert_eq!(titles[0].name, "new");
    }

    #[test]
    fn apply_keeps_identity_and_episodes() {
        let mut t = title("before");
        t.episodes.push(Episode {
            number: 1,
            title: "Pilot".into(),
            video_url: "https://example.com/1.mp4".into(),
            thumbnail: None,
            duration: None,
        });
        let id = t.id;
        let created = t.created_at;
        t.apply(TitleDraft {
            name: "after".into(),
            status: "hiatus".into(),
            ..Default::default()
        });
        assert_eq!(t.id, id);
        assert_eq!(t.created_at, created);
        assert_eq!(t.episodes.len(), 1);
        assert_eq!(t.name, "after");
        assert_eq!(t.status, TitleStatus::Other("hiatus".into()));
    }

    #[test]
    fn external_projection_maps_airing_and_images() {
        let external = ExternalTitle {
            external_id: 16498,
            name: "Shingeki no Kyojin".into(),
            image_url: Some("https://cdn.example/l.jpg".into()),
            airing: false,
            score: Some(8.5),
            episodes: Some(25),
            ..Default::default()
        };
        let t = external.into_title();
        assert_eq!(t.external_id, Some(16498));
        assert_eq!(t.origin, TitleOrigin::Imported);
        assert_eq!(t.status, TitleStatus::Completed);
        assert_eq!(t.cover_image, t.banner_image);
        assert_eq!(t.total_episode_count, Some(25));
        assert!(t.episodes.is_empty());
    }
}
