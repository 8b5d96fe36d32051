//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::fmt;
use std::net::SocketAddr;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which persistence backend serves the catalog, personalization and user stores.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres { database_url: String, max_connections: u32 },
    Memory,
}

/// OAuth client settings for the identity provider.
#[derive(Clone)]
pub struct DiscordConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub api_base: String,
}

// Custom Debug implementation to avoid exposing the client secret
impl fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub storage: StorageBackend,
    pub log_filter: String,
    pub cors_origins: Vec<String>,
    pub discord: DiscordConfig,
    pub verify_oauth_state: bool,
    pub metadata_api_base: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:8001");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_filter = var_or("RUST_LOG", "info");

        let cors_origins = var_or("CORS_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // --- Storage ---
        let storage = match var_or("STORAGE_BACKEND", "postgres").to_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            "postgres" => {
                let database_url = lookup("DATABASE_URL")
                    .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;
                let max_connections = var_or("DATABASE_MAX_CONNECTIONS", "5")
                    .parse::<u32>()
                    .map_err(|e| {
                        ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS".to_string(), e.to_string())
                    })?;
                StorageBackend::Postgres {
                    database_url,
                    max_connections,
                }
            }
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORAGE_BACKEND".to_string(),
                    format!("'{}' is not one of postgres, memory", other),
                ))
            }
        };

        // --- Identity provider ---
        let discord = DiscordConfig {
            client_id: var_or("DISCORD_CLIENT_ID", ""),
            client_secret: var_or("DISCORD_CLIENT_SECRET", ""),
            redirect_uri: var_or("DISCORD_REDIRECT_URI", ""),
            api_base: var_or("DISCORD_API_BASE", "https://discord.com/api"),
        };

        let verify_str = var_or("OAUTH_VERIFY_STATE", "true");
        let verify_oauth_state = parse_bool(&verify_str).ok_or_else(|| {
            ConfigError::InvalidValue(
                "OAUTH_VERIFY_STATE".to_string(),
                format!("'{}' is not a boolean", verify_str),
            )
        })?;

        // --- Metadata provider ---
        let metadata_api_base = var_or("METADATA_API_BASE", "https://api.jikan.moe/v4");

        Ok(Self {
            bind_address,
            storage,
            log_filter,
            cors_origins,
            discord,
            verify_oauth_state,
            metadata_api_base,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
