// Retry logic with Google retryDelay hint support
// Author: kelexine (https://github.com/kelexine)

use backoff::{backoff::Backoff, ExponentialBackoff};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const MAX_ATTEMPTS: u32 = 5;

/// Longest delay accepted from a server-provided hint.
const MAX_HINTED_DELAY_SECS: f64 = 60.0;

/// Parse the `RetryInfo.retryDelay` hint (e.g. `"0.457639761s"`) out of a
/// Google error body.
pub fn parse_retry_delay(error_json: &str) -> Option<Duration> {
    let parsed: Value = serde_json::from_str(error_json).ok()?;
    let details = parsed.get("error")?.get("details")?.as_array()?;

    details
        .iter()
        .filter(|detail| {
            detail.get("@type").and_then(Value::as_str)
                == Some("type.googleapis.com/google.rpc.RetryInfo")
        })
        .find_map(|detail| detail.get("retryDelay").and_then(Value::as_str))
        .and_then(parse_duration_string)
}

/// Parse protobuf duration strings like `"40s"` or `"1.5s"`, capped at 60 seconds.
fn parse_duration_string(duration_str: &str) -> Option<Duration> {
    let seconds: f64 = duration_str.strip_suffix('s')?.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }

    let millis = (seconds.min(MAX_HINTED_DELAY_SECS) * 1000.0) as u64;
    Some(Duration::from_millis(millis))
}

/// Exponential backoff used when the server gives no hint.
pub fn create_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: Duration::from_millis(500),
        initial_interval: Duration::from_millis(500),
        randomization_factor: 0.3,
        multiplier: 2.0,
        max_interval: Duration::from_secs(30),
        max_elapsed_time: Some(Duration::from_secs(120)),
        ..Default::default()
    }
}

/// Determine if an HTTP status code is retryable
pub fn is_retryable(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Run `operation` until it succeeds, fails with a non-retryable status, or
/// `MAX_ATTEMPTS` is reached.
///
/// Errors are `(status, body)` pairs so the body can be searched for a
/// `retryDelay` hint before falling back to exponential backoff.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    mut operation: F,
) -> Result<T, (u16, String)>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, (u16, String)>>,
{
    let mut backoff = create_backoff();
    let mut attempt = 0;

    loop {
        attempt += 1;

        let (status, error_body) = match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(err) => err,
        };

        if !is_retryable(status) || attempt >= MAX_ATTEMPTS {
            return Err((status, error_body));
        }

        let delay = match parse_retry_delay(&error_body) {
            Some(hinted) => hinted,
            None => match backoff.next_backoff() {
                Some(delay) => delay,
                None => return Err((status, error_body)),
            },
        };

        debug!(
            "{} failed with {} (attempt {}), retrying after {}ms",
            operation_name,
            status,
            attempt,
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
    }
}
