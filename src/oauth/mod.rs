// OAuth credential management for the Vertex AI backend
// Author: kelexine (https://github.com/kelexine)

mod manager;

pub use manager::OAuthManager;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Authorized-user credentials as written by `gcloud auth application-default login`.
///
/// The access token and its expiry are not part of the gcloud file; they are
/// filled in after the first refresh and only kept in memory.
#[derive(Clone, Deserialize, Serialize, Zeroize)]
#[zeroize(drop)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub access_token: String,
    /// Expiry as unix millis; `0` when no access token has been issued yet.
    #[serde(default)]
    pub expiry_date: i64,
    #[serde(default, rename = "type")]
    pub credential_type: String,
    #[serde(default)]
    pub quota_project_id: String,
}

// Custom Debug impl that never logs secrets
impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .field("expiry_date", &self.expiry_date)
            .field("type", &self.credential_type)
            .field("quota_project_id", &self.quota_project_id)
            .finish()
    }
}

impl OAuthCredentials {
    /// Check if token is missing, expired, or will expire within buffer seconds
    pub fn is_expired(&self, buffer_seconds: i64) -> bool {
        if self.access_token.is_empty() {
            return true;
        }
        let now = chrono::Utc::now().timestamp_millis();
        self.expiry_date.saturating_sub(now) < buffer_seconds.saturating_mul(1000)
    }

    /// Get remaining time until expiry in seconds
    pub fn expires_in_seconds(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        self.expiry_date.saturating_sub(now) / 1000
    }
}
