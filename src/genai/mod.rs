// Generative AI client construction
// Author: kelexine (https://github.com/kelexine)

mod client;

pub use client::{GenAiClient, GenAiClientFactory};

use crate::error::Result;
use std::future::Future;

/// Which Google surface a client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Vertex AI, scoped to a project and region. Authenticated with OAuth.
    Vertex { project_id: String, location: String },
    /// The public Generative Language API. Authenticated with an API key.
    Public,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Vertex { .. } => "vertex",
            Backend::Public => "public",
        }
    }
}

/// Arguments handed to a [`ClientFactory`] on a cache miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSpec {
    /// Target the Vertex AI backend rather than the public API.
    pub use_vertexai: bool,
    pub project_id: String,
    pub location: String,
}

impl ClientSpec {
    pub fn backend(&self) -> Backend {
        if self.use_vertexai {
            Backend::Vertex {
                project_id: self.project_id.clone(),
                location: self.location.clone(),
            }
        } else {
            Backend::Public
        }
    }
}

/// Builds client handles for [`crate::cache::ModelClientCache`].
///
/// Construction may be slow and may fail; the cache calls it at most once
/// per key at a time and passes errors through untouched. Handles are shared
/// between tasks without further locking, hence `Send + Sync`.
pub trait ClientFactory: Send + Sync + 'static {
    type Client: Send + Sync + 'static;

    fn construct(&self, spec: &ClientSpec) -> impl Future<Output = Result<Self::Client>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_selects_backend() {
        let spec = ClientSpec {
            use_vertexai: true,
            project_id: "media-studio".to_string(),
            location: "us-central1".to_string(),
        };
        assert_eq!(
            spec.backend(),
            Backend::Vertex {
                project_id: "media-studio".to_string(),
                location: "us-central1".to_string(),
            }
        );

        let public = ClientSpec {
            use_vertexai: false,
            ..spec
        };
        assert_eq!(public.backend(), Backend::Public);
        assert_eq!(public.backend().as_str(), "public");
    }
}
