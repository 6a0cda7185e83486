// Client cache - memoizes generative AI client handles per (project, location, model)
// Author: kelexine (https://github.com/kelexine)

use crate::cache::models::{CacheEntry, CacheKey, CacheStats, ClientRequest};
use crate::config::ClientDefaults;
use crate::error::Result;
use crate::genai::{ClientFactory, ClientSpec};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

struct CacheState<C> {
    entries: HashMap<CacheKey, CacheEntry<C>>,
    stats: CacheStats,
}

/// Process-wide cache of client handles.
///
/// Each key moves from absent to cached at most once and is never evicted.
/// A single lock guards the whole map and is held while a client is
/// constructed, so cold starts are serialized across *all* keys. That is
/// cheap for the handful of project/location/model combinations a deployment
/// uses and guarantees one construction per key.
///
/// Clones share the same map: build one at start-up and hand clones to every
/// request handler.
pub struct ModelClientCache<F: ClientFactory> {
    factory: Arc<F>,
    defaults: ClientDefaults,
    state: Arc<Mutex<CacheState<F::Client>>>,
}

impl<F: ClientFactory> Clone for ModelClientCache<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            defaults: self.defaults.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<F: ClientFactory> ModelClientCache<F> {
    /// Create an empty cache
    pub fn new(factory: F, defaults: ClientDefaults) -> Self {
        Self {
            factory: Arc::new(factory),
            defaults,
            state: Arc::new(Mutex::new(CacheState {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            })),
        }
    }

    pub fn defaults(&self) -> &ClientDefaults {
        &self.defaults
    }

    /// Apply defaults to `request` and validate the resulting key.
    pub fn resolve(&self, request: &ClientRequest) -> Result<CacheKey> {
        let pick = |value: &Option<String>, default: &str| match value {
            Some(v) => v.clone(),
            None => default.to_string(),
        };

        CacheKey::new(
            pick(&request.project_id, &self.defaults.project_id),
            pick(&request.location, &self.defaults.location),
            pick(&request.model_id, &self.defaults.model_id),
        )
    }

    /// Return the shared client for `request`, constructing it on first use.
    ///
    /// Returns the handle together with the resolved model ID. Construction
    /// errors are returned exactly as the factory produced them and leave the
    /// key absent, so the next call tries again.
    pub async fn acquire(&self, request: &ClientRequest) -> Result<(Arc<F::Client>, String)> {
        let key = self.resolve(request)?;

        let mut state = self.state.lock().await;

        if let Some(entry) = state.entries.get(&key) {
            let entry = entry.clone();
            state.stats.hits += 1;
            crate::metrics::record_client_cache_hit();
            debug!("Reusing cached client for {}", key);
            return Ok((entry.client, entry.model_id));
        }

        state.stats.misses += 1;
        crate::metrics::record_client_cache_miss();
        debug!("Constructing new client for {}", key);

        let spec = ClientSpec {
            use_vertexai: self.defaults.use_vertexai,
            project_id: key.project_id.clone(),
            location: key.location.clone(),
        };

        let client = match self.factory.construct(&spec).await {
            Ok(client) => Arc::new(client),
            Err(e) => {
                state.stats.failures += 1;
                crate::metrics::record_client_construct_failure();
                warn!("Client construction for {} failed: {}", key, e);
                return Err(e);
            }
        };

        let model_id = key.model_id.clone();
        state.entries.insert(
            key,
            CacheEntry {
                client: Arc::clone(&client),
                model_id: model_id.clone(),
            },
        );
        state.stats.constructions += 1;
        state.stats.entries = state.entries.len();
        crate::metrics::record_client_construct();
        crate::metrics::record_client_cache_insert();

        Ok((client, model_id))
    }

    /// Whether a handle for `key` has already been constructed.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.state.lock().await.entries.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.state.lock().await.stats.clone()
    }
}
