// Error types for genmedia-clients
// Author: kelexine (https://github.com/kelexine)

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenMediaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Client construction failed: {0}")]
    Construction(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("OAuth token refresh failed: {0}")]
    OAuthRefresh(String),

    #[error("Generative AI API error: {0}")]
    Api(String),

    #[error("Rate limited: {0}")]
    TooManyRequests(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),
}

impl GenMediaError {
    /// Whether a caller may reasonably try the same operation again.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenMediaError::TooManyRequests(_) | GenMediaError::ServiceUnavailable(_) => true,
            GenMediaError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Map an upstream HTTP status and body onto the error taxonomy.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => GenMediaError::InvalidCredentials(format!("HTTP {}: {}", status, body)),
            429 => GenMediaError::TooManyRequests(body),
            503 | 504 => GenMediaError::ServiceUnavailable(format!("Upstream unavailable: {}", body)),
            _ => GenMediaError::Api(format!("HTTP {}: {}", status, body)),
        }
    }
}

pub type Result<T> = std::result::Result<T, GenMediaError>;
