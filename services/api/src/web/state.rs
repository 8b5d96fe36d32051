//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::adapters::Storage;
use crate::config::Config;
use anistream_core::ports::{IdentityProvider, MetadataProvider};
use anistream_core::services::{
    CatalogService, IdentityGateway, MetadataImporter, PersonalizationService,
};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<CatalogService>,
    pub personalization: Arc<PersonalizationService>,
    pub identity: Arc<IdentityGateway>,
    pub importer: Arc<MetadataImporter>,
}

impl AppState {
    /// Wires the core services on top of the storage backend and the two upstream providers.
    pub fn new(
        config: Arc<Config>,
        storage: &Storage,
        identity_provider: Arc<dyn IdentityProvider>,
        metadata_provider: Arc<dyn MetadataProvider>,
    ) -> Self {
        let catalog = Arc::new(CatalogService::new(storage.catalog.clone()));
        let personalization = Arc::new(PersonalizationService::new(
            storage.personalization.clone(),
            storage.catalog.clone(),
        ));
        let identity = Arc::new(IdentityGateway::new(
            identity_provider,
            storage.users.clone(),
            config.verify_oauth_state,
        ));
        let importer = Arc::new(MetadataImporter::new(metadata_provider, storage.catalog.clone()));

        Self {
            config,
            catalog,
            personalization,
            identity,
            importer,
        }
    }
}
