//! services/api/src/lib.rs
//!
//! The HTTP service: storage and provider adapters, configuration, error mapping
//! and the axum web layer. The binaries and the integration tests build on this.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
