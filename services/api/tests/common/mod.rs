//! Test infrastructure for AniStream API integration tests.
//!
//! Provides a `TestApp` wrapper around `axum_test::TestServer` backed by the
//! in-memory store, with `wiremock` servers standing in for the identity and
//! metadata providers.

#![allow(dead_code)]

use axum_test::TestServer;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use wiremock::MockServer;

use api_lib::adapters::{DiscordAdapter, JikanAdapter, MemoryStore, Storage};
use api_lib::config::Config;
use api_lib::web::{router, AppState};

/// Test application wrapper around axum_test::TestServer.
pub struct TestApp {
    server: TestServer,
    pub discord: MockServer,
    pub jikan: MockServer,
}

impl TestApp {
    /// Create a new test application with state verification enabled.
    pub async fn new() -> Self {
        Self::with_vars(&[]).await
    }

    /// Create a test application, overriding configuration variables.
    ///
    /// Storage is always in-memory and both provider base URLs point at
    /// per-test mock servers.
    pub async fn with_vars(overrides: &[(&str, &str)]) -> Self {
        let discord = MockServer::start().await;
        let jikan = MockServer::start().await;

        let mut vars: HashMap<String, String> = HashMap::from([
            ("STORAGE_BACKEND".to_string(), "memory".to_string()),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("DISCORD_CLIENT_ID".to_string(), "test-client".to_string()),
            ("DISCORD_CLIENT_SECRET".to_string(), "test-secret".to_string()),
            (
                "DISCORD_REDIRECT_URI".to_string(),
                "http://localhost:3000/auth/callback".to_string(),
            ),
            ("DISCORD_API_BASE".to_string(), discord.uri()),
            ("METADATA_API_BASE".to_string(), jikan.uri()),
        ]);
        for (key, value) in overrides {
            vars.insert(key.to_string(), value.to_string());
        }
        let config = Arc::new(
            Config::from_lookup(|key| vars.get(key).cloned()).expect("Invalid test configuration"),
        );

        let storage = Storage::in_memory(Arc::new(MemoryStore::new()));
        let http = reqwest::Client::new();
        let state = Arc::new(AppState::new(
            config.clone(),
            &storage,
            Arc::new(DiscordAdapter::new(http.clone(), config.discord.clone())),
            Arc::new(JikanAdapter::new(http, config.metadata_api_base.clone())),
        ));

        let server = TestServer::new(router(state)).expect("Failed to create test server");

        Self {
            server,
            discord,
            jikan,
        }
    }

    pub fn server(&self) -> &TestServer {
        &self.server
    }

    /// Create a title through the API and return its id.
    pub async fn create_title(&self, body: Value) -> Uuid {
        let response = self.server.post("/api/titles").json(&body).await;
        response.assert_status_ok();
        let body: Value = response.json();
        body["id"]
            .as_str()
            .and_then(|id| Uuid::parse_str(id).ok())
            .expect("create response carries an id")
    }

    /// Create a minimal title with the given name.
    pub async fn create_named(&self, name: &str) -> Uuid {
        self.create_title(json!({ "name": name })).await
    }
}
