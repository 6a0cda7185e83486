//! Cross-cutting helpers for genmedia-clients.
//!
//! - `logging`: tracing initialization and secret redaction.
//! - `retry`: backoff that honours Google's `RetryInfo` hints.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
pub mod retry;
