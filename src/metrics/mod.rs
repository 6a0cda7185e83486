// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics, CLIENT_CACHE_ENTRIES, CLIENT_CACHE_OPERATIONS, GENAI_API_CALLS,
    OAUTH_REFRESHES,
};

/// Helpers to record client cache operations
pub fn record_client_cache_hit() {
    CLIENT_CACHE_OPERATIONS.with_label_values(&["hit"]).inc();
}

pub fn record_client_cache_miss() {
    CLIENT_CACHE_OPERATIONS.with_label_values(&["miss"]).inc();
}

pub fn record_client_construct() {
    CLIENT_CACHE_OPERATIONS.with_label_values(&["construct"]).inc();
}

pub fn record_client_construct_failure() {
    CLIENT_CACHE_OPERATIONS.with_label_values(&["failure"]).inc();
}

/// Count a handle added to any cache. Entries are never evicted, so the
/// gauge only grows and sums over every cache in the process.
pub fn record_client_cache_insert() {
    CLIENT_CACHE_ENTRIES.inc();
}

/// Helper to record OAuth refresh outcomes
pub fn record_oauth_refresh(success: bool) {
    let status = if success { "success" } else { "failure" };
    OAUTH_REFRESHES.with_label_values(&[status]).inc();
}

/// Helper to record calls made through a client handle
pub fn record_api_call(model: &str, status_code: u16) {
    GENAI_API_CALLS
        .with_label_values(&[model, &status_code.to_string()])
        .inc();
}
