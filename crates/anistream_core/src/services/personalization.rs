//! Watchlist, favorites and watch history, joined back to the catalog on read.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{EdgeKind, HistoryEntry, HistoryItem, Title};
use crate::ports::{CatalogStore, PersonalizationStore, PortResult};

pub struct PersonalizationService {
    edges: Arc<dyn PersonalizationStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl PersonalizationService {
    pub fn new(edges: Arc<dyn PersonalizationStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { edges, catalog }
    }

    pub async fn check(&self, kind: EdgeKind, user_id: Uuid, title_id: Uuid) -> PortResult<bool> {
        self.edges.has_edge(kind, user_id, title_id).await
    }

    pub async fn add(&self, kind: EdgeKind, user_id: Uuid, title_id: Uuid) -> PortResult<()> {
        self.edges.add_edge(kind, user_id, title_id).await
    }

    pub async fn remove(&self, kind: EdgeKind, user_id: Uuid, title_id: Uuid) -> PortResult<()> {
        self.edges.remove_edge(kind, user_id, title_id).await
    }

    /// Titles referenced by the user's edges, in edge order. Orphaned edges are dropped.
    pub async fn list(&self, kind: EdgeKind, user_id: Uuid) -> PortResult<Vec<Title>> {
        let edges = self.edges.list_edges(kind, user_id).await?;
        let ids: Vec<Uuid> = edges.iter().map(|e| e.title_id).collect();
        let mut titles = self.titles_by_id(&ids).await?;
        Ok(ids.iter().filter_map(|id| titles.remove(id)).collect())
    }

    pub async fn record_history(
        &self,
        user_id: Uuid,
        title_id: Uuid,
        episode_number: i32,
        progress: f64,
    ) -> PortResult<HistoryEntry> {
        self.edges
            .record_history(user_id, title_id, episode_number, progress)
            .await
    }

    /// History entries, most recent first, each joined with its title. Orphans are dropped.
    pub async fn history(&self, user_id: Uuid) -> PortResult<Vec<HistoryItem>> {
        let entries = self.edges.list_history(user_id).await?;
        let mut ids: Vec<Uuid> = entries.iter().map(|e| e.title_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let titles = self.titles_by_id(&ids).await?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let title = titles.get(&entry.title_id)?.clone();
                Some(HistoryItem { entry, title })
            })
            .collect())
    }

    async fn titles_by_id(&self, ids: &[Uuid]) -> PortResult<HashMap<Uuid, Title>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let titles = self.catalog.get_titles_by_ids(ids).await?;
        Ok(titles.into_iter().map(|t| (t.id, t)).collect())
    }
}
