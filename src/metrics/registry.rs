// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec_with_registry, register_gauge_with_registry, CounterVec, Encoder, Gauge,
    Opts, Registry, TextEncoder,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // CLIENT CACHE METRICS
    // ============================================================================

    /// Client cache operations
    pub static ref CLIENT_CACHE_OPERATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("client_cache_operations_total", "Total client cache operations"),
        &["operation"], // operation: hit, miss, construct, failure
        REGISTRY
    ).expect("client_cache_operations_total registers once");

    /// Cached client handles
    pub static ref CLIENT_CACHE_ENTRIES: Gauge = register_gauge_with_registry!(
        Opts::new("client_cache_entries", "Number of cached client handles"),
        REGISTRY
    ).expect("client_cache_entries registers once");

    // ============================================================================
    // OAUTH METRICS
    // ============================================================================

    /// OAuth token refresh events
    pub static ref OAUTH_REFRESHES: CounterVec = register_counter_vec_with_registry!(
        Opts::new("oauth_token_refreshes_total", "Total OAuth token refreshes"),
        &["status"], // status: success, failure
        REGISTRY
    ).expect("oauth_token_refreshes_total registers once");

    // ============================================================================
    // UPSTREAM API METRICS
    // ============================================================================

    /// Calls made through cached client handles
    pub static ref GENAI_API_CALLS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("genai_api_calls_total", "Total generative AI API calls"),
        &["model", "status_code"],
        REGISTRY
    ).expect("genai_api_calls_total registers once");
}

/// Gather all metrics and return them in Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        CLIENT_CACHE_OPERATIONS.with_label_values(&["hit"]).inc();
        OAUTH_REFRESHES.with_label_values(&["success"]).inc();
        GENAI_API_CALLS.with_label_values(&["veo-2.0-generate-001", "200"]).inc();
        CLIENT_CACHE_ENTRIES.inc();

        let metrics = gather_metrics();
        assert!(metrics.contains("client_cache_operations_total"));
        assert!(metrics.contains("client_cache_entries"));
        assert!(metrics.contains("oauth_token_refreshes_total"));
        assert!(metrics.contains("genai_api_calls_total"));
    }
}
