pub mod auth;
pub mod external;
pub mod extract;
pub mod models;
pub mod personalization;
pub mod rest;
pub mod routes;
pub mod state;
pub mod titles;

// Re-export the router builder so the binary and the integration tests share one route table.
pub use routes::router;
pub use state::AppState;
