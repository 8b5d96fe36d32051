//! Login through the external identity provider.
//!
//! The gateway issues a state token with every login redirect and, unless
//! verification is switched off, only accepts callbacks that return one of the
//! tokens it issued. Each token is single use and expires after ten minutes.

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{LoginRedirect, User, UserSession, UserUpsert};
use crate::ports::{IdentityProvider, PortError, PortResult, UserStore};

const STATE_TTL_MINUTES: i64 = 10;
/// Upper bound on outstanding state tokens; the oldest is evicted beyond it.
const MAX_PENDING_STATES: usize = 10_000;

pub struct IdentityGateway {
    provider: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserStore>,
    verify_state: bool,
    pending: Mutex<HashMap<String, DateTime<Utc>>>,
    max_pending: usize,
}

impl IdentityGateway {
    pub fn new(provider: Arc<dyn IdentityProvider>, users: Arc<dyn UserStore>, verify_state: bool) -> Self {
        Self {
            provider,
            users,
            verify_state,
            pending: Mutex::new(HashMap::new()),
            max_pending: MAX_PENDING_STATES,
        }
    }

    /// Builds the provider redirect with a fresh state token.
    pub async fn begin_login(&self) -> PortResult<LoginRedirect> {
        let state = new_state_token();
        let auth_url = self.provider.authorization_url(&state)?;

        let now = Utc::now();
        let mut pending = self.pending.lock().await;
        pending.retain(|_, expires_at| *expires_at > now);
        if pending.len() >= self.max_pending {
            let oldest = pending
                .iter()
                .min_by_key(|(_, expires_at)| **expires_at)
                .map(|(token, _)| token.clone());
            if let Some(oldest) = oldest {
                pending.remove(&oldest);
                warn!("Too many pending logins, evicted the oldest state");
            }
        }
        pending.insert(state.clone(), now + Duration::minutes(STATE_TTL_MINUTES));

        Ok(LoginRedirect { auth_url, state })
    }

    /// Exchanges the code, fetches the profile and upserts the local user.
    pub async fn complete_login(&self, code: &str, state: Option<&str>) -> PortResult<UserSession> {
        if self.verify_state {
            self.consume_state(state).await?;
        }

        let tokens = self.provider.exchange_code(code).await?;
        let profile = self.provider.fetch_profile(&tokens.access_token).await?;

        let user = self
            .users
            .upsert_user(UserUpsert {
                provider_subject_id: profile.subject_id,
                username: profile.username,
                email: profile.email,
                avatar: profile.avatar_url,
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            })
            .await?;
        info!(user_id = %user.id, "User logged in");

        Ok(UserSession {
            user_id: user.id,
            username: user.username,
            avatar: user.avatar,
            email: user.email,
            access_token: user.access_token,
        })
    }

    pub async fn user(&self, id: Uuid) -> PortResult<User> {
        self.users.get_user(id).await
    }

    async fn consume_state(&self, state: Option<&str>) -> PortResult<()> {
        let state = state.ok_or_else(|| PortError::Auth("Missing state parameter".to_string()))?;
        let expires_at = self.pending.lock().await.remove(state);
        match expires_at {
            Some(expires_at) if expires_at > Utc::now() => Ok(()),
            _ => {
                warn!("Rejected login callback with unknown or expired state");
                Err(PortError::Auth("Invalid or expired state".to_string()))
            }
        }
    }
}

/// 16 random bytes, URL-safe base64.
fn new_state_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
