//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the storage ports. Titles are kept in
//! insertion order; every mutation happens under a single write lock, which
//! makes check-then-insert and upserts atomic.

use std::collections::{BTreeSet, HashMap};

use anistream_core::domain::{
    catalog_order, recent_order, trending_order, Edge, EdgeKind, Episode, HistoryEntry,
    PageRequest, Title, TitleDraft, TitleFilter, User, UserUpsert,
};
use anistream_core::ports::{CatalogStore, PersonalizationStore, PortError, PortResult, UserStore};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    titles: Vec<Title>,
    users: HashMap<Uuid, User>,
    watchlist: Vec<Edge>,
    favorites: Vec<Edge>,
    history: Vec<HistoryEntry>,
}

impl MemoryState {
    fn title(&self, id: Uuid) -> PortResult<&Title> {
        self.titles
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| title_not_found(id))
    }

    fn title_mut(&mut self, id: Uuid) -> PortResult<&mut Title> {
        self.titles
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| title_not_found(id))
    }

    fn edges(&self, kind: EdgeKind) -> &Vec<Edge> {
        match kind {
            EdgeKind::Watchlist => &self.watchlist,
            EdgeKind::Favorites => &self.favorites,
        }
    }

    fn edges_mut(&mut self, kind: EdgeKind) -> &mut Vec<Edge> {
        match kind {
            EdgeKind::Watchlist => &mut self.watchlist,
            EdgeKind::Favorites => &mut self.favorites,
        }
    }

    /// Titles sorted by an ordering, truncated to `limit`.
    fn sorted_titles<F>(&self, limit: usize, order: F) -> Vec<Title>
    where
        F: FnMut(&Title, &Title) -> std::cmp::Ordering,
    {
        let mut titles = self.titles.clone();
        titles.sort_by(order);
        titles.truncate(limit);
        titles
    }
}

fn title_not_found(id: Uuid) -> PortError {
    PortError::NotFound(format!("Title {} not found", id))
}

/// A storage adapter that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

//=========================================================================================
// `CatalogStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_titles(&self, filter: &TitleFilter, page: PageRequest) -> PortResult<(Vec<Title>, u64)> {
        let state = self.state.read().await;
        let mut matching: Vec<&Title> = state.titles.iter().filter(|t| filter.matches(t)).collect();
        matching.sort_by(|a, b| catalog_order(a, b));
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn featured_titles(&self, limit: usize) -> PortResult<Vec<Title>> {
        let state = self.state.read().await;
        let mut featured: Vec<Title> = state.titles.iter().filter(|t| t.is_featured).cloned().collect();
        featured.sort_by(catalog_order);
        featured.truncate(limit);
        Ok(featured)
    }

    async fn trending_titles(&self, limit: usize) -> PortResult<Vec<Title>> {
        Ok(self.state.read().await.sorted_titles(limit, trending_order))
    }

    async fn recent_titles(&self, limit: usize) -> PortResult<Vec<Title>> {
        Ok(self.state.read().await.sorted_titles(limit, recent_order))
    }

    async fn list_genres(&self) -> PortResult<Vec<String>> {
        let state = self.state.read().await;
        let genres: BTreeSet<&String> = state.titles.iter().flat_map(|t| t.genres.iter()).collect();
        Ok(genres.into_iter().cloned().collect())
    }

    async fn count_titles(&self) -> PortResult<u64> {
        Ok(self.state.read().await.titles.len() as u64)
    }

    async fn get_title(&self, id: Uuid) -> PortResult<Title> {
        self.state.read().await.title(id).cloned()
    }

    async fn get_titles_by_ids(&self, ids: &[Uuid]) -> PortResult<Vec<Title>> {
        let state = self.state.read().await;
        Ok(state
            .titles
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn find_by_external_id(&self, external_id: i64) -> PortResult<Option<Title>> {
        let state = self.state.read().await;
        Ok(state
            .titles
            .iter()
            .find(|t| t.external_id == Some(external_id))
            .cloned())
    }

    async fn insert_title(&self, title: Title) -> PortResult<Title> {
        let mut state = self.state.write().await;
        if let Some(external_id) = title.external_id {
            if state.titles.iter().any(|t| t.external_id == Some(external_id)) {
                return Err(PortError::Conflict(format!(
                    "Title with external id {} already exists",
                    external_id
                )));
            }
        }
        if state.titles.iter().any(|t| t.id == title.id) {
            return Err(PortError::Conflict(format!("Title {} already exists", title.id)));
        }
        state.titles.push(title.clone());
        Ok(title)
    }

    async fn update_title(&self, id: Uuid, draft: TitleDraft) -> PortResult<Title> {
        let mut state = self.state.write().await;
        let title = state.title_mut(id)?;
        title.apply(draft);
        Ok(title.clone())
    }

    async fn delete_title(&self, id: Uuid) -> PortResult<()> {
        let mut state = self.state.write().await;
        let before = state.titles.len();
        state.titles.retain(|t| t.id != id);
        if state.titles.len() == before {
            return Err(title_not_found(id));
        }
        Ok(())
    }

    async fn add_episode(&self, title_id: Uuid, episode: Episode) -> PortResult<()> {
        let mut state = self.state.write().await;
        state.title_mut(title_id)?.episodes.push(episode);
        Ok(())
    }

    async fn list_episodes(&self, title_id: Uuid) -> PortResult<Vec<Episode>> {
        Ok(self.state.read().await.title(title_id)?.episodes.clone())
    }

    async fn remove_episodes(&self, title_id: Uuid, number: i32) -> PortResult<()> {
        let mut state = self.state.write().await;
        state
            .title_mut(title_id)?
            .episodes
            .retain(|e| e.number != number);
        Ok(())
    }
}

//=========================================================================================
// `PersonalizationStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl PersonalizationStore for MemoryStore {
    async fn has_edge(&self, kind: EdgeKind, user_id: Uuid, title_id: Uuid) -> PortResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .edges(kind)
            .iter()
            .any(|e| e.user_id == user_id && e.title_id == title_id))
    }

    async fn add_edge(&self, kind: EdgeKind, user_id: Uuid, title_id: Uuid) -> PortResult<()> {
        let mut state = self.state.write().await;
        let edges = state.edges_mut(kind);
        if edges.iter().any(|e| e.user_id == user_id && e.title_id == title_id) {
            return Err(PortError::Conflict(format!("Already in {}", kind.label())));
        }
        edges.push(Edge {
            user_id,
            title_id,
            added_at: Utc::now(),
        });
        Ok(())
    }

    async fn remove_edge(&self, kind: EdgeKind, user_id: Uuid, title_id: Uuid) -> PortResult<()> {
        let mut state = self.state.write().await;
        let edges = state.edges_mut(kind);
        let before = edges.len();
        edges.retain(|e| !(e.user_id == user_id && e.title_id == title_id));
        if edges.len() == before {
            return Err(PortError::NotFound(format!("Not in {}", kind.label())));
        }
        Ok(())
    }

    async fn list_edges(&self, kind: EdgeKind, user_id: Uuid) -> PortResult<Vec<Edge>> {
        let state = self.state.read().await;
        // Vec order is insertion order, which is `added_at` order.
        Ok(state
            .edges(kind)
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn record_history(
        &self,
        user_id: Uuid,
        title_id: Uuid,
        episode_number: i32,
        progress: f64,
    ) -> PortResult<HistoryEntry> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let position = state.history.iter().position(|h| {
            h.user_id == user_id && h.title_id == title_id && h.episode_number == episode_number
        });
        match position {
            Some(index) => {
                let entry = &mut state.history[index];
                entry.progress = progress;
                entry.watched_at = now;
                Ok(entry.clone())
            }
            None => {
                let entry = HistoryEntry {
                    id: Uuid::new_v4(),
                    user_id,
                    title_id,
                    episode_number,
                    progress,
                    watched_at: now,
                };
                state.history.push(entry.clone());
                Ok(entry)
            }
        }
    }

    async fn list_history(&self, user_id: Uuid) -> PortResult<Vec<HistoryEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<HistoryEntry> = state
            .history
            .iter()
            .filter(|h| h.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.watched_at.cmp(&a.watched_at));
        Ok(entries)
    }
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for MemoryStore {
    async fn upsert_user(&self, profile: UserUpsert) -> PortResult<User> {
        let mut state = self.state.write().await;
        let existing = state
            .users
            .values()
            .find(|u| u.provider_subject_id == profile.provider_subject_id)
            .map(|u| u.id);
        if let Some(user) = existing.and_then(|id| state.users.get_mut(&id)) {
            user.username = profile.username;
            user.email = profile.email;
            user.avatar = profile.avatar;
            user.access_token = profile.access_token;
            user.refresh_token = profile.refresh_token;
            return Ok(user.clone());
        }

        let user = User {
            id: Uuid::new_v4(),
            provider_subject_id: profile.provider_subject_id,
            username: profile.username,
            email: profile.email,
            avatar: profile.avatar,
            access_token: profile.access_token,
            refresh_token: profile.refresh_token,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> PortResult<User> {
        self.state
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn draft(name: &str) -> TitleDraft {
        TitleDraft {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn episode(number: i32) -> Episode {
        Episode {
            number,
            title: format!("Episode {}", number),
            video_url: format!("https://videos.test/{}.mp4", number),
            thumbnail: None,
            duration: Some("24:00".to_string()),
        }
    }

    #[tokio::test]
    async fn duplicate_edges_conflict_and_leave_one_row() {
        let store = MemoryStore::new();
        let (user, title) = (Uuid::new_v4(), Uuid::new_v4());

        store.add_edge(EdgeKind::Favorites, user, title).await.unwrap();
        let second = store.add_edge(EdgeKind::Favorites, user, title).await;
        assert!(matches!(second, Err(PortError::Conflict(_))));
        assert_eq!(store.list_edges(EdgeKind::Favorites, user).await.unwrap().len(), 1);
        // The relations are independent.
        assert!(!store.has_edge(EdgeKind::Watchlist, user, title).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_duplicate_adds_yield_one_conflict() {
        let store = Arc::new(MemoryStore::new());
        let (user, title) = (Uuid::new_v4(), Uuid::new_v4());

        let tasks: Vec<_> = (0..2)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.add_edge(EdgeKind::Watchlist, user, title).await })
            })
            .collect();
        let mut outcomes = Vec::new();
        for task in tasks {
            outcomes.push(task.await.unwrap());
        }

        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(PortError::Conflict(_)))));
        assert_eq!(store.list_edges(EdgeKind::Watchlist, user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn removing_twice_reports_not_found() {
        let store = MemoryStore::new();
        let (user, title) = (Uuid::new_v4(), Uuid::new_v4());

        store.add_edge(EdgeKind::Watchlist, user, title).await.unwrap();
        store.remove_edge(EdgeKind::Watchlist, user, title).await.unwrap();
        let again = store.remove_edge(EdgeKind::Watchlist, user, title).await;
        assert!(matches!(again, Err(PortError::NotFound(_))));
        store.add_edge(EdgeKind::Watchlist, user, title).await.unwrap();
    }

    #[tokio::test]
    async fn history_upserts_by_triple() {
        let store = MemoryStore::new();
        let (user, title) = (Uuid::new_v4(), Uuid::new_v4());

        let first = store.record_history(user, title, 5, 0.1).await.unwrap();
        let second = store.record_history(user, title, 5, 0.9).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(second.watched_at >= first.watched_at);

        let entries = store.list_history(user).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].progress, 0.9);

        store.record_history(user, title, 6, 0.0).await.unwrap();
        let entries = store.list_history(user).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].episode_number, 6);
    }

    #[tokio::test]
    async fn remove_episodes_drops_every_match() {
        let store = MemoryStore::new();
        let title = store.insert_title(Title::from_draft(draft("X"))).await.unwrap();

        store.add_episode(title.id, episode(1)).await.unwrap();
        store.add_episode(title.id, episode(2)).await.unwrap();
        store.add_episode(title.id, episode(1)).await.unwrap();

        store.remove_episodes(title.id, 1).await.unwrap();
        let remaining = store.list_episodes(title.id).await.unwrap();
        assert_eq!(remaining.iter().map(|e| e.number).collect::<Vec<_>>(), vec![2]);

        // No match is a no-op, a missing title is not.
        store.remove_episodes(title.id, 9).await.unwrap();
        let missing = store.remove_episodes(Uuid::new_v4(), 1).await;
        assert!(matches!(missing, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn external_ids_are_unique() {
        let store = MemoryStore::new();
        let mut first = Title::from_draft(draft("A"));
        first.external_id = Some(7);
        let mut second = Title::from_draft(draft("B"));
        second.external_id = Some(7);

        store.insert_title(first).await.unwrap();
        let result = store.insert_title(second).await;
        assert!(matches!(result, Err(PortError::Conflict(_))));
        assert!(store.find_by_external_id(7).await.unwrap().is_some());
        assert_eq!(store.count_titles().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn listing_pages_in_stable_order() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .insert_title(Title::from_draft(draft(&format!("T{}", i))))
                .await
                .unwrap();
        }
        let page = PageRequest::new(2, 2).unwrap();
        let (first, total) = store.list_titles(&TitleFilter::default(), page).await.unwrap();
        let (again, _) = store.list_titles(&TitleFilter::default(), page).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(first.len(), 2);
        assert_eq!(first, again);
    }

    #[tokio::test]
    async fn upsert_user_refreshes_profile_and_keeps_id() {
        let store = MemoryStore::new();
        let profile = |name: &str, token: &str| UserUpsert {
            provider_subject_id: "80351110224678912".to_string(),
            username: name.to_string(),
            email: None,
            avatar: None,
            access_token: token.to_string(),
            refresh_token: None,
        };

        let created = store.upsert_user(profile("nelly", "t1")).await.unwrap();
        let updated = store.upsert_user(profile("nelly2", "t2")).await.unwrap();
        assert_eq!(created.id, updated.id);
        assert_eq!(created.created_at, updated.created_at);

        let fetched = store.get_user(created.id).await.unwrap();
        assert_eq!(fetched.username, "nelly2");
        assert_eq!(fetched.access_token, "t2");
    }
}
