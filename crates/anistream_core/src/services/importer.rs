//! Search passthrough and one-shot import from the external metadata provider.

use std::sync::Arc;

use tracing::info;

use crate::domain::Title;
use crate::ports::{CatalogStore, MetadataProvider, PortError, PortResult};

pub struct MetadataImporter {
    provider: Arc<dyn MetadataProvider>,
    catalog: Arc<dyn CatalogStore>,
}

impl MetadataImporter {
    pub fn new(provider: Arc<dyn MetadataProvider>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { provider, catalog }
    }

    pub async fn search(&self, query: &str, page: u32) -> PortResult<serde_json::Value> {
        self.provider.search(query, page).await
    }

    /// Imports a single external record. Duplicates are rejected before the upstream call;
    /// the store enforces the same uniqueness again on insert.
    pub async fn import(&self, external_id: i64) -> PortResult<Title> {
        if self.catalog.find_by_external_id(external_id).await?.is_some() {
            return Err(PortError::Conflict(format!(
                "Title with external id {} already imported",
                external_id
            )));
        }

        let external = self.provider.fetch(external_id).await?.ok_or_else(|| {
            PortError::NotFound(format!("External title {} not found", external_id))
        })?;

        let title = self.catalog.insert_title(external.into_title()).await?;
        info!(title_id = %title.id, external_id, "Imported title");
        Ok(title)
    }
}
