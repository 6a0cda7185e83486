//! Configuration data structures for genmedia-clients.
//!
//! This module defines the schema for the application settings: default
//! client coordinates, the HTTP surface of the generative-AI services,
//! OAuth2 credentials for the Vertex backend, and logging.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Fallback project/location/model used when a caller omits one.
    #[serde(default)]
    pub defaults: ClientDefaults,

    /// HTTP settings for the generative-AI endpoints.
    #[serde(default)]
    pub genai: GenAiConfig,

    /// OAuth2 authentication settings (Vertex backend only).
    #[serde(default)]
    pub oauth: OAuthConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Deployment-wide fallback values for client acquisition.
///
/// An empty string means "not configured".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientDefaults {
    /// Google Cloud project ID.
    /// Default: empty (must be configured)
    #[serde(default)]
    pub project_id: String,

    /// Google Cloud region.
    /// Default: `us-central1`
    #[serde(default = "default_location")]
    pub location: String,

    /// Model used when a request names none.
    /// Default: `imagen-3.0-generate-002`
    #[serde(default = "default_model")]
    pub model_id: String,

    /// Target the Vertex AI (enterprise) backend instead of the public
    /// Generative Language API.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub use_vertexai: bool,
}

/// Settings for the HTTP connection to the generative-AI services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenAiConfig {
    /// Override for the Vertex AI base URL. When empty the regional
    /// endpoint is derived from project and location.
    #[serde(default)]
    pub vertex_base_url: String,

    /// Base URL of the public Generative Language API.
    /// Default: `https://generativelanguage.googleapis.com/v1beta`
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// API key for the public backend. Falls back to `GOOGLE_API_KEY`
    /// and `GEMINI_API_KEY`.
    #[serde(default)]
    pub api_key: String,

    /// Request timeout in seconds.
    /// Default: `300` (5 minutes)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Connect timeout in seconds.
    /// Default: `10`
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Maximum idle connections kept per host.
    /// Default: `10`
    #[serde(default = "default_pool_size")]
    pub pool_max_idle_per_host: usize,
}

/// Settings for Google Cloud OAuth2 authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Path to the authorized-user credentials JSON.
    /// Default: `~/.config/gcloud/application_default_credentials.json`
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,

    /// Google OAuth2 token endpoint.
    /// Default: `https://oauth2.googleapis.com/token`
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Whether to refresh the access token when it expires.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub auto_refresh: bool,

    /// Number of seconds before expiration to trigger a token refresh.
    /// Default: `300` (5 minutes)
    #[serde(default = "default_refresh_buffer")]
    pub refresh_buffer_seconds: i64,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for ClientDefaults {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            location: default_location(),
            model_id: default_model(),
            use_vertexai: true,
        }
    }
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            vertex_base_url: String::new(),
            public_base_url: default_public_base_url(),
            api_key: String::new(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            pool_max_idle_per_host: default_pool_size(),
        }
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            token_url: default_token_url(),
            auto_refresh: true,
            refresh_buffer_seconds: default_refresh_buffer(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Helper functions for serde defaults
fn default_location() -> String {
    "us-central1".to_string()
}

fn default_model() -> String {
    "imagen-3.0-generate-002".to_string()
}

fn default_true() -> bool {
    true
}

fn default_public_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout() -> u64 {
    300
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_pool_size() -> usize {
    10
}

fn default_credentials_path() -> String {
    dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("gcloud")
        .join("application_default_credentials.json")
        .to_string_lossy()
        .to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_refresh_buffer() -> i64 {
    300 // 5 minutes
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
