//! Catalog operations over a `CatalogStore`.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::{Episode, PageRequest, Title, TitleDraft, TitleFilter, TitlePage, SHELF_SIZE};
use crate::ports::{CatalogStore, PortResult};
use crate::seed::sample_titles;

/// Result of a seed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    AlreadySeeded,
    Seeded(usize),
}

pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, filter: &TitleFilter, page: PageRequest) -> PortResult<TitlePage> {
        let (items, total) = self.store.list_titles(filter, page).await?;
        Ok(TitlePage {
            items,
            total,
            page: page.page(),
            pages: page.page_count(total),
        })
    }

    pub async fn featured(&self) -> PortResult<Vec<Title>> {
        self.store.featured_titles(SHELF_SIZE).await
    }

    pub async fn trending(&self) -> PortResult<Vec<Title>> {
        self.store.trending_titles(SHELF_SIZE).await
    }

    pub async fn recent(&self) -> PortResult<Vec<Title>> {
        self.store.recent_titles(SHELF_SIZE).await
    }

    pub async fn genres(&self) -> PortResult<Vec<String>> {
        self.store.list_genres().await
    }

    pub async fn get(&self, id: Uuid) -> PortResult<Title> {
        self.store.get_title(id).await
    }

    pub async fn create(&self, draft: TitleDraft) -> PortResult<Title> {
        let title = self.store.insert_title(Title::from_draft(draft)).await?;
        info!(title_id = %title.id, name = %title.name, "Created title");
        Ok(title)
    }

    pub async fn update(&self, id: Uuid, draft: TitleDraft) -> PortResult<Title> {
        self.store.update_title(id, draft).await
    }

    pub async fn delete(&self, id: Uuid) -> PortResult<()> {
        self.store.delete_title(id).await?;
        info!(title_id = %id, "Deleted title");
        Ok(())
    }

    pub async fn add_episode(&self, title_id: Uuid, episode: Episode) -> PortResult<()> {
        self.store.add_episode(title_id, episode).await
    }

    pub async fn episodes(&self, title_id: Uuid) -> PortResult<Vec<Episode>> {
        self.store.list_episodes(title_id).await
    }

    pub async fn remove_episode(&self, title_id: Uuid, number: i32) -> PortResult<()> {
        self.store.remove_episodes(title_id, number).await
    }

    /// Fills an empty catalog with the sample titles.
    pub async fn seed(&self) -> PortResult<SeedOutcome> {
        if self.store.count_titles().await? > 0 {
            return Ok(SeedOutcome::AlreadySeeded);
        }
        let samples = sample_titles();
        let count = samples.len();
        for title in samples {
            self.store.insert_title(title).await?;
        }
        info!(count, "Seeded catalog");
        Ok(SeedOutcome::Seeded(count))
    }
}
