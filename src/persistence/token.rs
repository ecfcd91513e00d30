//! Firebase session tokens
//!
//! Anonymous sign-in returns a short-lived id token and a refresh token.
//! The database handle swaps in a new id token shortly before the current
//! one lapses, or after the store rejects it.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Secure Token endpoint for exchanging a refresh token
pub const REFRESH_URL: &str = "https://securetoken.googleapis.com/v1/token";

/// Refresh this long before the provider's stated expiry
pub const EXPIRY_MARGIN_MS: u64 = 60_000;

/// Lifetime assumed when the provider omits or garbles `expiresIn`
const DEFAULT_LIFETIME_SECS: u64 = 3600;

/// `accounts:signUp` reply
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub local_id: String,
    pub id_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<String>,
}

/// Secure Token reply; unlike sign-up it uses snake_case
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub id_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<String>,
    pub user_id: String,
}

/// Credentials for one signed-in player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    user_id: String,
    id_token: String,
    refresh_token: String,
    expires_at_ms: u64,
}

fn expiry(expires_in: Option<&str>, now_ms: u64) -> u64 {
    let secs = expires_in
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_LIFETIME_SECS);
    now_ms.saturating_add(secs.saturating_mul(1000))
}

impl SessionToken {
    pub fn from_sign_up(resp: &SignUpResponse, now_ms: u64) -> Self {
        Self {
            user_id: resp.local_id.clone(),
            id_token: resp.id_token.clone(),
            refresh_token: resp.refresh_token.clone(),
            expires_at_ms: expiry(resp.expires_in.as_deref(), now_ms),
        }
    }

    pub fn id_token(&self) -> &str {
        &self.id_token
    }

    pub fn expires_at_ms(&self) -> u64 {
        self.expires_at_ms
    }

    pub fn needs_refresh(&self, now_ms: u64) -> bool {
        now_ms.saturating_add(EXPIRY_MARGIN_MS) >= self.expires_at_ms
    }

    /// Form body for the Secure Token exchange
    pub fn refresh_body(&self) -> String {
        format!("grant_type=refresh_token&refresh_token={}", self.refresh_token)
    }

    /// Take the new tokens from a refresh reply.
    ///
    /// The player keeps their identity, so a reply for another user is
    /// rejected and the current tokens are left alone.
    pub fn apply_refresh(&mut self, resp: RefreshResponse, now_ms: u64) -> Result<()> {
        if resp.user_id != self.user_id {
            return Err(Error::AuthUnavailable(format!(
                "token refresh returned user {}",
                resp.user_id
            )));
        }
        self.expires_at_ms = expiry(resp.expires_in.as_deref(), now_ms);
        self.id_token = resp.id_token;
        self.refresh_token = resp.refresh_token;
        Ok(())
    }
}
