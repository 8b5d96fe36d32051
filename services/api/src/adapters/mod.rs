pub mod db;
pub mod discord;
pub mod jikan;
pub mod memory;

pub use db::DbAdapter;
pub use discord::DiscordAdapter;
pub use jikan::JikanAdapter;
pub use memory::MemoryStore;

use anistream_core::ports::{CatalogStore, PersonalizationStore, UserStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

use crate::config::StorageBackend;
use crate::error::ApiError;

/// The three storage ports, all served by the same backend.
#[derive(Clone)]
pub struct Storage {
    pub catalog: Arc<dyn CatalogStore>,
    pub personalization: Arc<dyn PersonalizationStore>,
    pub users: Arc<dyn UserStore>,
    db: Option<Arc<DbAdapter>>,
}

impl Storage {
    /// Connects to the configured backend, running migrations for PostgreSQL.
    pub async fn connect(backend: &StorageBackend) -> Result<Self, ApiError> {
        match backend {
            StorageBackend::Postgres {
                database_url,
                max_connections,
            } => {
                info!("Connecting to database...");
                let pool = PgPoolOptions::new()
                    .max_connections(*max_connections)
                    .connect(database_url)
                    .await?;
                let db = Arc::new(DbAdapter::new(pool));
                info!("Running database migrations...");
                db.run_migrations().await?;
                info!("Database migrations complete.");
                Ok(Self {
                    catalog: db.clone(),
                    personalization: db.clone(),
                    users: db.clone(),
                    db: Some(db),
                })
            }
            StorageBackend::Memory => {
                info!("Using the in-memory store; data is lost on shutdown");
                Ok(Self::in_memory(Arc::new(MemoryStore::new())))
            }
        }
    }

    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            catalog: store.clone(),
            personalization: store.clone(),
            users: store,
            db: None,
        }
    }

    /// Releases backend resources. A no-op for the in-memory store.
    pub async fn close(&self) {
        if let Some(db) = &self.db {
            info!("Closing database pool");
            db.close().await;
        }
    }
}
