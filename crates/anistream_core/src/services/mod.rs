//! crates/anistream_core/src/services/mod.rs
//!
//! Backend-agnostic application services. Each one owns the business rules of a
//! component and talks to storage and third parties only through the ports.

pub mod catalog;
pub mod identity;
pub mod importer;
pub mod personalization;

pub use catalog::{CatalogService, SeedOutcome};
pub use identity::IdentityGateway;
pub use importer::MetadataImporter;
pub use personalization::PersonalizationService;
