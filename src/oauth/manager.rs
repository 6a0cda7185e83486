//! Google OAuth2 token management for the Vertex AI backend.
//!
//! `OAuthManager` loads authorized-user credentials, hands out valid access
//! tokens, and refreshes them with a "double-checked locking" scheme so
//! concurrent requests never trigger redundant refreshes. Client handles
//! hold a clone of the manager, which is what keeps long-lived cached
//! handles usable after the first token expires.

// Author: kelexine (https://github.com/kelexine)

use super::OAuthCredentials;
use crate::config::OAuthConfig;
use crate::error::{GenMediaError, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Manages Google OAuth2 credentials and provides valid access tokens.
///
/// Cloning is cheap; all clones share the same token state.
#[derive(Clone)]
pub struct OAuthManager {
    /// In-memory copy of the current credentials.
    credentials: Arc<RwLock<OAuthCredentials>>,
    /// Serializes refresh attempts.
    refresh_lock: Arc<Mutex<()>>,
    config: OAuthConfig,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OAuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthManager")
            .field("credentials_path", &self.config.credentials_path)
            .field("token_url", &self.config.token_url)
            .finish_non_exhaustive()
    }
}

impl OAuthManager {
    /// Loads credentials from the configured path.
    ///
    /// # Errors
    ///
    /// Returns `GenMediaError::InvalidCredentials` if the file is missing or
    /// malformed.
    pub fn new(config: &OAuthConfig, http_client: reqwest::Client) -> Result<Self> {
        let credentials = Self::load_credentials(&config.credentials_path)?;
        debug!("Loaded OAuth credentials from {}", config.credentials_path);
        Ok(Self::from_credentials(credentials, config, http_client))
    }

    /// Builds a manager around credentials obtained elsewhere.
    pub fn from_credentials(
        credentials: OAuthCredentials,
        config: &OAuthConfig,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            credentials: Arc::new(RwLock::new(credentials)),
            refresh_lock: Arc::new(Mutex::new(())),
            config: config.clone(),
            http_client,
        }
    }

    fn load_credentials(path: &str) -> Result<OAuthCredentials> {
        let path = Path::new(path);

        if !path.exists() {
            return Err(GenMediaError::InvalidCredentials(format!(
                "Credentials file not found: {}",
                path.display()
            )));
        }

        Self::check_permissions(path)?;

        let contents = fs::read_to_string(path).map_err(|e| {
            GenMediaError::InvalidCredentials(format!("Failed to read credentials: {}", e))
        })?;

        let credentials: OAuthCredentials = serde_json::from_str(&contents).map_err(|e| {
            GenMediaError::InvalidCredentials(format!("Invalid credentials JSON format: {}", e))
        })?;

        if credentials.refresh_token.is_empty() {
            return Err(GenMediaError::InvalidCredentials(
                "Credentials file has no refresh_token".to_string(),
            ));
        }

        Ok(credentials)
    }

    /// Warns when the credentials file is readable by group or others.
    ///
    /// gcloud writes these files itself, so a loose mode is reported rather
    /// than rejected.
    fn check_permissions(path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mode = fs::metadata(path)?.permissions().mode() & 0o777;
            if mode & 0o077 != 0 {
                warn!(
                    "Credentials file {} is accessible by other users: {:o} (expected 0600)",
                    path.display(),
                    mode
                );
            }
        }

        Ok(())
    }

    /// Returns a valid access token, refreshing it first if necessary.
    ///
    /// 1. Shared read lock fast path.
    /// 2. On expiry, take the refresh mutex.
    /// 3. Re-check: another task may have refreshed meanwhile.
    /// 4. Refresh and publish the new token.
    pub async fn get_token(&self) -> Result<String> {
        {
            let creds = self.credentials.read().await;
            if !creds.is_expired(self.config.refresh_buffer_seconds) {
                return Ok(creds.access_token.clone());
            }
        }

        if !self.config.auto_refresh {
            return Err(GenMediaError::TokenExpired);
        }

        let _guard = self.refresh_lock.lock().await;

        {
            let creds = self.credentials.read().await;
            if !creds.is_expired(self.config.refresh_buffer_seconds) {
                debug!("Token already refreshed by another concurrent request.");
                return Ok(creds.access_token.clone());
            }
        }

        debug!("OAuth access token missing or expired; refreshing.");
        match self.refresh_token().await {
            Ok((access_token, expiry_date)) => {
                {
                    let mut creds = self.credentials.write().await;
                    creds.access_token = access_token.clone();
                    creds.expiry_date = expiry_date;
                }
                info!("OAuth access token refreshed");
                crate::metrics::record_oauth_refresh(true);
                Ok(access_token)
            }
            Err(e) => {
                crate::metrics::record_oauth_refresh(false);
                Err(e)
            }
        }
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// Returns the token and its expiry as unix millis.
    async fn refresh_token(&self) -> Result<(String, i64)> {
        let (client_id, client_secret, refresh_token) = {
            let creds = self.credentials.read().await;
            (
                creds.client_id.clone(),
                creds.client_secret.clone(),
                creds.refresh_token.clone(),
            )
        };

        let params = [
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let client = &self.http_client;
        let url = self.config.token_url.as_str();

        let request_logic = || async {
            let response = client
                .post(url)
                .form(&params)
                .send()
                .await
                .map_err(|e| (500, format!("Google OAuth2 network error: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown".to_string());
                return Err((status.as_u16(), error_text));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| (500, format!("Malformed JSON response: {}", e)))
        };

        let token_data = crate::utils::retry::with_retry("OAuth Refresh", request_logic)
            .await
            .map_err(|(status, body)| match status {
                429 => GenMediaError::TooManyRequests(body),
                503 | 504 => GenMediaError::ServiceUnavailable(body),
                _ => GenMediaError::OAuthRefresh(format!(
                    "HTTP {}: {}",
                    status,
                    crate::utils::logging::sanitize(&body)
                )),
            })?;

        let access_token = token_data
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                GenMediaError::OAuthRefresh("Missing access_token in Google response".to_string())
            })?
            .to_string();

        let expires_in = token_data
            .get("expires_in")
            .and_then(|v| v.as_i64())
            .unwrap_or(3600);

        debug!("Refreshed token expires in {} seconds", expires_in);
        Ok((
            access_token,
            chrono::Utc::now()
                .timestamp_millis()
                .saturating_add(expires_in.saturating_mul(1000)),
        ))
    }

    /// Seconds until expiry and whether the token is currently considered expired.
    pub async fn token_info(&self) -> (i64, bool) {
        let creds = self.credentials.read().await;
        (
            creds.expires_in_seconds(),
            creds.is_expired(self.config.refresh_buffer_seconds),
        )
    }

    /// Quota project to bill requests to, if the credentials name one.
    pub async fn quota_project(&self) -> Option<String> {
        let creds = self.credentials.read().await;
        Some(creds.quota_project_id.clone()).filter(|p| !p.is_empty())
    }
}
