//! services/api/src/adapters/discord.rs
//!
//! This module contains the adapter for Discord's OAuth2 API.
//! It implements the `IdentityProvider` port from the `core` crate.

use anistream_core::ports::{IdentityProvider, PortError, PortResult, ProviderProfile, ProviderTokens};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::config::DiscordConfig;

const AVATAR_CDN: &str = "https://cdn.discordapp.com/avatars";
const SCOPES: &str = "identify email";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `IdentityProvider` using the Discord OAuth2 endpoints.
#[derive(Clone)]
pub struct DiscordAdapter {
    client: Client,
    config: DiscordConfig,
}

impl DiscordAdapter {
    /// Creates a new `DiscordAdapter`.
    pub fn new(client: Client, config: DiscordConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
    email: Option<String>,
    avatar: Option<String>,
}

impl DiscordUser {
    fn into_profile(self) -> ProviderProfile {
        let avatar_url = self
            .avatar
            .as_ref()
            .map(|hash| format!("{}/{}/{}.png", AVATAR_CDN, self.id, hash));
        ProviderProfile {
            subject_id: self.id,
            username: self.username,
            email: self.email,
            avatar_url,
        }
    }
}

//=========================================================================================
// `IdentityProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityProvider for DiscordAdapter {
    fn authorization_url(&self, state: &str) -> PortResult<String> {
        let url = Url::parse_with_params(
            &self.endpoint("/oauth2/authorize"),
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("state", state),
            ],
        )
        .map_err(|e| PortError::Unexpected(format!("Invalid authorize URL: {}", e)))?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> PortResult<ProviderTokens> {
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self
            .client
            .post(self.endpoint("/oauth2/token"))
            .form(&form)
            .send()
            .await
            .map_err(|e| PortError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "Discord token exchange rejected");
            return Err(PortError::Auth("Failed to get access token".to_string()));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| PortError::Upstream(format!("Malformed token response: {}", e)))?;

        Ok(ProviderTokens {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> PortResult<ProviderProfile> {
        let response = self
            .client
            .get(self.endpoint("/users/@me"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| PortError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "Discord profile request rejected");
            return Err(PortError::Auth("Failed to get user info".to_string()));
        }

        let user: DiscordUser = response
            .json()
            .await
            .map_err(|e| PortError::Upstream(format!("Malformed user response: {}", e)))?;
        Ok(user.into_profile())
    }
}
