//! Keys, entries, and statistics for the client cache.

// Author: kelexine (https://github.com/kelexine)

use crate::error::{GenMediaError, Result};
use std::fmt;
use std::sync::Arc;

/// Identifies one client configuration: `(project, location, model)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub project_id: String,
    pub location: String,
    pub model_id: String,
}

impl CacheKey {
    /// Build a key, rejecting any empty component.
    pub fn new(
        project_id: impl Into<String>,
        location: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Result<Self> {
        let key = Self {
            project_id: project_id.into(),
            location: location.into(),
            model_id: model_id.into(),
        };

        if key.project_id.is_empty() || key.location.is_empty() || key.model_id.is_empty() {
            return Err(GenMediaError::Config("All parameters must be set".to_string()));
        }

        Ok(key)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.project_id, self.location, self.model_id)
    }
}

/// Optional per-call overrides for [`super::ModelClientCache::acquire`].
///
/// `None` falls back to the configured default; `Some("")` is an explicit
/// empty value and is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientRequest {
    pub project_id: Option<String>,
    pub location: Option<String>,
    pub model_id: Option<String>,
}

impl ClientRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }
}

/// A constructed client handle and the model it was requested for.
#[derive(Debug)]
pub struct CacheEntry<C> {
    pub client: Arc<C>,
    pub model_id: String,
}

// Manual impl: cloning shares the handle, so `C: Clone` is not required.
impl<C> Clone for CacheEntry<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            model_id: self.model_id.clone(),
        }
    }
}

/// Statistics for client cache operations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls served from an existing handle.
    pub hits: u64,
    /// Calls that found no handle for their key.
    pub misses: u64,
    /// Successful constructions.
    pub constructions: u64,
    /// Constructions that returned an error.
    pub failures: u64,
    /// Handles currently cached.
    pub entries: usize,
}
