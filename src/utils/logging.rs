//! Structured logging and secret redaction.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::LoggingConfig;
use crate::error::{GenMediaError, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber.
///
/// `json` produces structured logs; anything else falls back to the pretty
/// formatter. `RUST_LOG` takes precedence over the configured level.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match config.format.as_str() {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    };

    installed.map_err(|e| GenMediaError::Config(format!("Failed to install logger: {}", e)))
}

/// Prefixes of Google secrets that must never reach a log sink, with the
/// placeholder each is replaced by.
const SECRET_PATTERNS: &[(&str, &str)] = &[
    ("ya29.", "[REDACTED_ACCESS_TOKEN]"),
    ("1//0", "[REDACTED_REFRESH_TOKEN]"),
    ("AIza", "[REDACTED_API_KEY]"),
];

/// Replaces every Google access token, refresh token, or API key found in
/// `input` with a placeholder.
pub fn sanitize(input: &str) -> String {
    let mut result = input.to_string();

    for (prefix, placeholder) in SECRET_PATTERNS {
        let mut search_from = 0;
        while let Some(offset) = result[search_from..].find(prefix) {
            let start = search_from + offset;
            let end = result[start..]
                .find(|c: char| c.is_whitespace() || c == '"' || c == '\'' || c == '&')
                .map(|i| start + i)
                .unwrap_or(result.len());
            result.replace_range(start..end, placeholder);
            search_from = start + placeholder.len();
        }
    }

    result
}
