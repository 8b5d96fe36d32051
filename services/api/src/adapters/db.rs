//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete PostgreSQL
//! implementation of the storage ports from the `core` crate. It handles all
//! interactions with the database using `sqlx`.
//!
//! Episodes live in a JSONB column on `titles`; every episode mutation is a
//! single UPDATE statement so the whole list is rewritten atomically.

use anistream_core::domain::{
    Edge, EdgeKind, Episode, HistoryEntry, PageRequest, Title, TitleDraft, TitleFilter,
    TitleOrigin, TitleStatus, User, UserUpsert,
};
use anistream_core::ports::{CatalogStore, PersonalizationStore, PortError, PortResult, UserStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports on PostgreSQL.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Closes the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

const TITLE_COLUMNS: &str = "id, external_id, name, name_native, synopsis, cover_image, \
     banner_image, genres, status, rating, release_year, episodes, total_episode_count, \
     is_featured, origin, created_at";

const HISTORY_COLUMNS: &str = "id, user_id, title_id, episode_number, progress, watched_at";

const USER_COLUMNS: &str =
    "id, provider_subject_id, username, email, avatar, access_token, refresh_token, created_at";

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn title_not_found(id: Uuid) -> PortError {
    PortError::NotFound(format!("Title {} not found", id))
}

fn edge_table(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Watchlist => "watchlist",
        EdgeKind::Favorites => "favorites",
    }
}

/// Escapes LIKE wildcards so the search term matches as a plain substring.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(Serialize, Deserialize)]
struct EpisodeRecord {
    number: i32,
    title: String,
    video_url: String,
    thumbnail: Option<String>,
    duration: Option<String>,
}
impl EpisodeRecord {
    fn from_domain(episode: Episode) -> Self {
        Self {
            number: episode.number,
            title: episode.title,
            video_url: episode.video_url,
            thumbnail: episode.thumbnail,
            duration: episode.duration,
        }
    }

    fn to_domain(self) -> Episode {
        Episode {
            number: self.number,
            title: self.title,
            video_url: self.video_url,
            thumbnail: self.thumbnail,
            duration: self.duration,
        }
    }
}

#[derive(FromRow)]
struct TitleRecord {
    id: Uuid,
    external_id: Option<i64>,
    name: String,
    name_native: Option<String>,
    synopsis: Option<String>,
    cover_image: Option<String>,
    banner_image: Option<String>,
    genres: Vec<String>,
    status: String,
    rating: Option<f64>,
    release_year: Option<i32>,
    episodes: Json<Vec<EpisodeRecord>>,
    total_episode_count: Option<i32>,
    is_featured: bool,
    origin: String,
    created_at: DateTime<Utc>,
}
impl TitleRecord {
    fn to_domain(self) -> PortResult<Title> {
        Ok(Title {
            id: self.id,
            external_id: self.external_id,
            name: self.name,
            name_native: self.name_native,
            synopsis: self.synopsis,
            cover_image: self.cover_image,
            banner_image: self.banner_image,
            genres: self.genres,
            status: TitleStatus::from(self.status.as_str()),
            rating: self.rating,
            release_year: self.release_year,
            episodes: self.episodes.0.into_iter().map(EpisodeRecord::to_domain).collect(),
            total_episode_count: self.total_episode_count,
            is_featured: self.is_featured,
            origin: TitleOrigin::parse(&self.origin)?,
            created_at: self.created_at,
        })
    }
}

fn titles_to_domain(records: Vec<TitleRecord>) -> PortResult<Vec<Title>> {
    records.into_iter().map(TitleRecord::to_domain).collect()
}

#[derive(FromRow)]
struct EdgeRecord {
    user_id: Uuid,
    title_id: Uuid,
    added_at: DateTime<Utc>,
}
impl EdgeRecord {
    fn to_domain(self) -> Edge {
        Edge {
            user_id: self.user_id,
            title_id: self.title_id,
            added_at: self.added_at,
        }
    }
}

#[derive(FromRow)]
struct HistoryRecord {
    id: Uuid,
    user_id: Uuid,
    title_id: Uuid,
    episode_number: i32,
    progress: f64,
    watched_at: DateTime<Utc>,
}
impl HistoryRecord {
    fn to_domain(self) -> HistoryEntry {
        HistoryEntry {
            id: self.id,
            user_id: self.user_id,
            title_id: self.title_id,
            episode_number: self.episode_number,
            progress: self.progress,
            watched_at: self.watched_at,
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    provider_subject_id: String,
    username: String,
    email: Option<String>,
    avatar: Option<String>,
    access_token: String,
    refresh_token: Option<String>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            provider_subject_id: self.provider_subject_id,
            username: self.username,
            email: self.email,
            avatar: self.avatar,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            created_at: self.created_at,
        }
    }
}

/// Appends the WHERE clause for a listing filter.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &TitleFilter) {
    builder.push(" WHERE TRUE");
    if let Some(genre) = &filter.genre {
        builder.push(" AND ").push_bind(genre.clone()).push(" = ANY(genres)");
    }
    if let Some(status) = &filter.status {
        builder.push(" AND status = ").push_bind(status.clone());
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR name_native ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(featured) = filter.featured {
        builder.push(" AND is_featured = ").push_bind(featured);
    }
}

//=========================================================================================
// `CatalogStore` Trait Implementation
//=========================================================================================

impl DbAdapter {
    async fn fetch_titles(&self, sql: &str, limit: usize) -> PortResult<Vec<Title>> {
        let records = sqlx::query_as::<_, TitleRecord>(sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        titles_to_domain(records)
    }
}

#[async_trait]
impl CatalogStore for DbAdapter {
    async fn list_titles(&self, filter: &TitleFilter, page: PageRequest) -> PortResult<(Vec<Title>, u64)> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM titles");
        push_filter(&mut count_query, filter);

        let mut page_query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM titles", TITLE_COLUMNS));
        push_filter(&mut page_query, filter);
        page_query
            .push(" ORDER BY created_at, id LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let (total, records) = futures::try_join!(
            count_query.build_query_scalar::<i64>().fetch_one(&self.pool),
            page_query.build_query_as::<TitleRecord>().fetch_all(&self.pool),
        )
        .map_err(unexpected)?;

        Ok((titles_to_domain(records)?, total.max(0) as u64))
    }

    async fn featured_titles(&self, limit: usize) -> PortResult<Vec<Title>> {
        let sql = format!(
            "SELECT {} FROM titles WHERE is_featured ORDER BY created_at, id LIMIT $1",
            TITLE_COLUMNS
        );
        self.fetch_titles(&sql, limit).await
    }

    async fn trending_titles(&self, limit: usize) -> PortResult<Vec<Title>> {
        let sql = format!(
            "SELECT {} FROM titles ORDER BY rating DESC NULLS LAST, created_at, id LIMIT $1",
            TITLE_COLUMNS
        );
        self.fetch_titles(&sql, limit).await
    }

    async fn recent_titles(&self, limit: usize) -> PortResult<Vec<Title>> {
        let sql = format!(
            "SELECT {} FROM titles ORDER BY created_at DESC, id LIMIT $1",
            TITLE_COLUMNS
        );
        self.fetch_titles(&sql, limit).await
    }

    async fn list_genres(&self) -> PortResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT genre FROM titles, unnest(genres) AS genre ORDER BY genre",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn count_titles(&self) -> PortResult<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM titles")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(count.max(0) as u64)
    }

    async fn get_title(&self, id: Uuid) -> PortResult<Title> {
        let sql = format!("SELECT {} FROM titles WHERE id = $1", TITLE_COLUMNS);
        sqlx::query_as::<_, TitleRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| title_not_found(id))?
            .to_domain()
    }

    async fn get_titles_by_ids(&self, ids: &[Uuid]) -> PortResult<Vec<Title>> {
        let sql = format!(
            "SELECT {} FROM titles WHERE id = ANY($1) ORDER BY created_at, id",
            TITLE_COLUMNS
        );
        let records = sqlx::query_as::<_, TitleRecord>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        titles_to_domain(records)
    }

    async fn find_by_external_id(&self, external_id: i64) -> PortResult<Option<Title>> {
        let sql = format!("SELECT {} FROM titles WHERE external_id = $1", TITLE_COLUMNS);
        sqlx::query_as::<_, TitleRecord>(&sql)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .map(TitleRecord::to_domain)
            .transpose()
    }

    async fn insert_title(&self, title: Title) -> PortResult<Title> {
        let sql = format!(
            "INSERT INTO titles ({cols}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {cols}",
            cols = TITLE_COLUMNS
        );
        let episodes: Vec<EpisodeRecord> = title
            .episodes
            .into_iter()
            .map(EpisodeRecord::from_domain)
            .collect();
        let external_id = title.external_id;
        sqlx::query_as::<_, TitleRecord>(&sql)
            .bind(title.id)
            .bind(title.external_id)
            .bind(title.name)
            .bind(title.name_native)
            .bind(title.synopsis)
            .bind(title.cover_image)
            .bind(title.banner_image)
            .bind(title.genres)
            .bind(title.status.as_str().to_string())
            .bind(title.rating)
            .bind(title.release_year)
            .bind(Json(episodes))
            .bind(title.total_episode_count)
            .bind(title.is_featured)
            .bind(title.origin.as_str())
            .bind(title.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => match external_id {
                    Some(external_id) => PortError::Conflict(format!(
                        "Title with external id {} already exists",
                        external_id
                    )),
                    None => PortError::Conflict("Title already exists".to_string()),
                },
                _ => unexpected(e),
            })?
            .to_domain()
    }

    async fn update_title(&self, id: Uuid, draft: TitleDraft) -> PortResult<Title> {
        let sql = format!(
            "UPDATE titles SET name = $2, name_native = $3, synopsis = $4, cover_image = $5, \
             banner_image = $6, genres = $7, status = $8, rating = $9, release_year = $10, \
             total_episode_count = $11, is_featured = $12 \
             WHERE id = $1 RETURNING {}",
            TITLE_COLUMNS
        );
        sqlx::query_as::<_, TitleRecord>(&sql)
            .bind(id)
            .bind(draft.name)
            .bind(draft.name_native)
            .bind(draft.synopsis)
            .bind(draft.cover_image)
            .bind(draft.banner_image)
            .bind(draft.genres)
            .bind(draft.status.as_str().to_string())
            .bind(draft.rating)
            .bind(draft.release_year)
            .bind(draft.total_episode_count)
            .bind(draft.is_featured)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| title_not_found(id))?
            .to_domain()
    }

    async fn delete_title(&self, id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(title_not_found(id));
        }
        Ok(())
    }

    async fn add_episode(&self, title_id: Uuid, episode: Episode) -> PortResult<()> {
        let result = sqlx::query("UPDATE titles SET episodes = episodes || $2 WHERE id = $1")
            .bind(title_id)
            .bind(Json(vec![EpisodeRecord::from_domain(episode)]))
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(title_not_found(title_id));
        }
        Ok(())
    }

    async fn list_episodes(&self, title_id: Uuid) -> PortResult<Vec<Episode>> {
        let episodes = sqlx::query_scalar::<_, Json<Vec<EpisodeRecord>>>(
            "SELECT episodes FROM titles WHERE id = $1",
        )
        .bind(title_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| title_not_found(title_id))?;
        Ok(episodes.0.into_iter().map(EpisodeRecord::to_domain).collect())
    }

    async fn remove_episodes(&self, title_id: Uuid, number: i32) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE titles SET episodes = COALESCE(( \
                 SELECT jsonb_agg(e.value ORDER BY e.ordinality) \
                 FROM jsonb_array_elements(episodes) WITH ORDINALITY AS e(value, ordinality) \
                 WHERE (e.value->>'number')::int <> $2 \
             ), '[]'::jsonb) \
             WHERE id = $1",
        )
        .bind(title_id)
        .bind(number)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(title_not_found(title_id));
        }
        Ok(())
    }
}

//=========================================================================================
// `PersonalizationStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl PersonalizationStore for DbAdapter {
    async fn has_edge(&self, kind: EdgeKind, user_id: Uuid, title_id: Uuid) -> PortResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE user_id = $1 AND title_id = $2)",
            edge_table(kind)
        );
        sqlx::query_scalar::<_, bool>(&sql)
            .bind(user_id)
            .bind(title_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn add_edge(&self, kind: EdgeKind, user_id: Uuid, title_id: Uuid) -> PortResult<()> {
        // The primary key makes concurrent adds of the same pair collapse into one row.
        let sql = format!(
            "INSERT INTO {} (user_id, title_id, added_at) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
            edge_table(kind)
        );
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(title_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::Conflict(format!("Already in {}", kind.label())));
        }
        Ok(())
    }

    async fn remove_edge(&self, kind: EdgeKind, user_id: Uuid, title_id: Uuid) -> PortResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE user_id = $1 AND title_id = $2",
            edge_table(kind)
        );
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(title_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Not in {}", kind.label())));
        }
        Ok(())
    }

    async fn list_edges(&self, kind: EdgeKind, user_id: Uuid) -> PortResult<Vec<Edge>> {
        let sql = format!(
            "SELECT user_id, title_id, added_at FROM {} WHERE user_id = $1 ORDER BY added_at, title_id",
            edge_table(kind)
        );
        let records = sqlx::query_as::<_, EdgeRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(EdgeRecord::to_domain).collect())
    }

    async fn record_history(
        &self,
        user_id: Uuid,
        title_id: Uuid,
        episode_number: i32,
        progress: f64,
    ) -> PortResult<HistoryEntry> {
        let sql = format!(
            "INSERT INTO watch_history ({cols}) VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id, title_id, episode_number) \
             DO UPDATE SET progress = EXCLUDED.progress, watched_at = EXCLUDED.watched_at \
             RETURNING {cols}",
            cols = HISTORY_COLUMNS
        );
        let record = sqlx::query_as::<_, HistoryRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(title_id)
            .bind(episode_number)
            .bind(progress)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_history(&self, user_id: Uuid) -> PortResult<Vec<HistoryEntry>> {
        let sql = format!(
            "SELECT {} FROM watch_history WHERE user_id = $1 ORDER BY watched_at DESC, id",
            HISTORY_COLUMNS
        );
        let records = sqlx::query_as::<_, HistoryRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(HistoryRecord::to_domain).collect())
    }
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for DbAdapter {
    async fn upsert_user(&self, profile: UserUpsert) -> PortResult<User> {
        let sql = format!(
            "INSERT INTO users ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (provider_subject_id) DO UPDATE SET \
                 username = EXCLUDED.username, email = EXCLUDED.email, avatar = EXCLUDED.avatar, \
                 access_token = EXCLUDED.access_token, refresh_token = EXCLUDED.refresh_token \
             RETURNING {cols}",
            cols = USER_COLUMNS
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(profile.provider_subject_id)
            .bind(profile.username)
            .bind(profile.email)
            .bind(profile.avatar)
            .bind(profile.access_token)
            .bind(profile.refresh_token)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_user(&self, id: Uuid) -> PortResult<User> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", id)))?;
        Ok(record.to_domain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("titan"), "%titan%");
        assert_eq!(like_pattern("100%_real"), "%100\\%\\_real%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn filters_render_in_order() {
        let filter = TitleFilter::new(
            Some("Action".into()),
            Some("ongoing".into()),
            Some("hero".into()),
            Some(true),
        );
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM titles");
        push_filter(&mut builder, &filter);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM titles WHERE TRUE AND $1 = ANY(genres) AND status = $2 \
             AND (name ILIKE $3 OR name_native ILIKE $4) AND is_featured = $5"
        );
    }
}
