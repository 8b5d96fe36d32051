pub mod domain;
pub mod ports;
pub mod seed;
pub mod services;

pub use domain::{
    Edge, EdgeKind, Episode, ExternalTitle, HistoryEntry, HistoryItem, LoginRedirect, PageRequest,
    Title, TitleDraft, TitleFilter, TitleOrigin, TitlePage, TitleStatus, User, UserSession,
    UserUpsert,
};
pub use ports::{
    CatalogStore, IdentityProvider, MetadataProvider, PersonalizationStore, PortError, PortResult,
    ProviderProfile, ProviderTokens, UserStore,
};
pub use services::{CatalogService, IdentityGateway, MetadataImporter, PersonalizationService, SeedOutcome};
