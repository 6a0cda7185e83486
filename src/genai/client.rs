// Google generative AI client handle and its factory
// Author: kelexine (https://github.com/kelexine)

use super::{Backend, ClientFactory, ClientSpec};
use crate::config::{AppConfig, GenAiConfig, OAuthConfig};
use crate::error::{GenMediaError, Result};
use crate::oauth::OAuthManager;
use crate::utils::logging::sanitize;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use zeroize::Zeroizing;

enum Credentials {
    OAuth(OAuthManager),
    ApiKey(Zeroizing<String>),
}

/// An authenticated handle to one Google generative AI backend.
///
/// Safe to share between tasks: the HTTP pool is internally synchronized and
/// OAuth tokens are refreshed behind the manager's own locks.
pub struct GenAiClient {
    http_client: Client,
    backend: Backend,
    base_url: String,
    credentials: Credentials,
}

impl std::fmt::Debug for GenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let auth = match self.credentials {
            Credentials::OAuth(_) => "oauth",
            Credentials::ApiKey(_) => "api_key",
        };
        f.debug_struct("GenAiClient")
            .field("backend", &self.backend)
            .field("base_url", &self.base_url)
            .field("auth", &auth)
            .finish()
    }
}

impl GenAiClient {
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resource URL of a publisher model on this backend.
    pub fn model_url(&self, model_id: &str) -> String {
        let model = urlencoding::encode(model_id);
        match self.backend {
            Backend::Vertex { .. } => format!("{}/publishers/google/models/{}", self.base_url, model),
            Backend::Public => format!("{}/models/{}", self.base_url, model),
        }
    }

    async fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        match &self.credentials {
            Credentials::OAuth(manager) => {
                let token = manager.get_token().await?;
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                    GenMediaError::InvalidCredentials("Access token is not a valid header".to_string())
                })?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);

                if let Some(project) = manager.quota_project().await {
                    if let Ok(value) = HeaderValue::from_str(&project) {
                        headers.insert("x-goog-user-project", value);
                    }
                }
            }
            Credentials::ApiKey(key) => {
                let mut value = HeaderValue::from_str(key.as_str()).map_err(|_| {
                    GenMediaError::InvalidCredentials("API key is not a valid header".to_string())
                })?;
                value.set_sensitive(true);
                headers.insert("x-goog-api-key", value);
            }
        }

        Ok(headers)
    }

    /// Fetch the model resource to confirm the backend is reachable and the
    /// credentials are accepted. Returns the round-trip latency.
    pub async fn check_model(&self, model_id: &str) -> Result<Duration> {
        let url = self.model_url(model_id);
        debug!("Checking model availability via {}", url);

        let headers = self.auth_headers().await?;
        let start = Instant::now();

        let response = self
            .http_client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| GenMediaError::Api(format!("Model check request failed: {}", e)))?;

        let status = response.status();
        crate::metrics::record_api_call(model_id, status.as_u16());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenMediaError::from_status(status.as_u16(), sanitize(&body)));
        }

        let latency = start.elapsed();
        debug!("Model {} reachable in {:?}", model_id, latency);
        Ok(latency)
    }

    /// POST `body` to the model's `:generateContent` method and return the
    /// raw JSON response. Rate limits and 5xx responses are retried.
    pub async fn generate_content(&self, model_id: &str, body: &Value) -> Result<Value> {
        let url = format!("{}:generateContent", self.model_url(model_id));
        debug!("Calling generateContent for model: {}", model_id);

        let headers = self.auth_headers().await?;
        let http_client = &self.http_client;
        let url = url.as_str();
        let headers = &headers;

        crate::utils::retry::with_retry("Generate Content", || async {
            let response = http_client
                .post(url)
                .headers(headers.clone())
                .json(body)
                .send()
                .await
                .map_err(|e| (500, format!("HTTP error: {}", e)))?;

            let status = response.status();
            crate::metrics::record_api_call(model_id, status.as_u16());

            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                error!(
                    "generateContent failed: HTTP {} - {}",
                    status,
                    sanitize(&error_text)
                );
                return Err((status.as_u16(), error_text));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| (500, format!("Invalid response: {}", e)))
        })
        .await
        .map_err(|(status, body)| GenMediaError::from_status(status, sanitize(&body)))
    }
}

/// Builds [`GenAiClient`] handles from application configuration.
#[derive(Clone)]
pub struct GenAiClientFactory {
    genai: GenAiConfig,
    oauth: OAuthConfig,
}

impl GenAiClientFactory {
    pub fn new(genai: GenAiConfig, oauth: OAuthConfig) -> Self {
        Self { genai, oauth }
    }

    /// Like [`GenAiClientFactory::new`], falling back to `GOOGLE_API_KEY` or
    /// `GEMINI_API_KEY` when no API key is configured.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut genai = config.genai.clone();
        if genai.api_key.is_empty() {
            genai.api_key = ["GOOGLE_API_KEY", "GEMINI_API_KEY"]
                .iter()
                .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
                .unwrap_or_default();
        }
        Self::new(genai, config.oauth.clone())
    }

    fn build_http_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(self.genai.timeout_seconds))
            .connect_timeout(Duration::from_secs(self.genai.connect_timeout_seconds))
            .pool_max_idle_per_host(self.genai.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .use_rustls_tls()
            .build()
            .map_err(|e| GenMediaError::Construction(format!("Failed to create HTTP client: {}", e)))
    }

    /// Regional Vertex AI endpoint for a project, or the configured override.
    pub fn vertex_base_url(&self, project_id: &str, location: &str) -> String {
        let root = if !self.genai.vertex_base_url.is_empty() {
            self.genai.vertex_base_url.trim_end_matches('/').to_string()
        } else if location == "global" {
            "https://aiplatform.googleapis.com/v1".to_string()
        } else {
            format!("https://{}-aiplatform.googleapis.com/v1", location)
        };

        format!(
            "{}/projects/{}/locations/{}",
            root,
            urlencoding::encode(project_id),
            urlencoding::encode(location)
        )
    }
}

impl ClientFactory for GenAiClientFactory {
    type Client = GenAiClient;

    fn construct(&self, spec: &ClientSpec) -> impl Future<Output = Result<GenAiClient>> + Send {
        async move {
            let http_client = self.build_http_client()?;
            let backend = spec.backend();

            let (base_url, credentials) = match &backend {
                Backend::Vertex {
                    project_id,
                    location,
                } => {
                    let manager = OAuthManager::new(&self.oauth, http_client.clone())?;
                    // Fails construction early on revoked or unusable credentials
                    manager.get_token().await?;
                    (
                        self.vertex_base_url(project_id, location),
                        Credentials::OAuth(manager),
                    )
                }
                Backend::Public => {
                    if self.genai.api_key.is_empty() {
                        return Err(GenMediaError::Construction(
                            "No API key configured for the public backend".to_string(),
                        ));
                    }
                    (
                        self.genai.public_base_url.trim_end_matches('/').to_string(),
                        Credentials::ApiKey(Zeroizing::new(self.genai.api_key.clone())),
                    )
                }
            };

            info!("Created {} client for {}", backend.as_str(), base_url);

            Ok(GenAiClient {
                http_client,
                backend,
                base_url,
                credentials,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn public_factory(base_url: String) -> GenAiClientFactory {
        GenAiClientFactory::new(
            GenAiConfig {
                public_base_url: base_url,
                api_key: "AIzaTestKey".to_string(),
                ..GenAiConfig::default()
            },
            OAuthConfig::default(),
        )
    }

    fn public_spec() -> ClientSpec {
        ClientSpec {
            use_vertexai: false,
            project_id: "media-studio".to_string(),
            location: "us-central1".to_string(),
        }
    }

    #[test]
    fn test_vertex_base_url() {
        let factory = GenAiClientFactory::new(GenAiConfig::default(), OAuthConfig::default());

        assert_eq!(
            factory.vertex_base_url("media-studio", "us-central1"),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/media-studio/locations/us-central1"
        );
        assert_eq!(
            factory.vertex_base_url("media-studio", "global"),
            "https://aiplatform.googleapis.com/v1/projects/media-studio/locations/global"
        );
    }

    #[test]
    fn test_vertex_base_url_override() {
        let factory = GenAiClientFactory::new(
            GenAiConfig {
                vertex_base_url: "http://localhost:9000/v1/".to_string(),
                ..GenAiConfig::default()
            },
            OAuthConfig::default(),
        );

        assert_eq!(
            factory.vertex_base_url("p", "l"),
            "http://localhost:9000/v1/projects/p/locations/l"
        );
    }

    #[tokio::test]
    async fn test_public_backend_requires_api_key() {
        let factory = GenAiClientFactory::new(GenAiConfig::default(), OAuthConfig::default());
        let err = factory.construct(&public_spec()).await.unwrap_err();
        assert!(matches!(err, GenMediaError::Construction(_)));
    }

    #[tokio::test]
    async fn test_public_client_check_and_generate() {
        let mut server = mockito::Server::new_async().await;
        let check = server
            .mock("GET", "/models/gemini-2.0-flash")
            .match_header("x-goog-api-key", "AIzaTestKey")
            .with_status(200)
            .with_body(r#"{"name":"models/gemini-2.0-flash"}"#)
            .create_async()
            .await;
        let generate = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_header("x-goog-api-key", "AIzaTestKey")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"hi"}]}}]}"#)
            .create_async()
            .await;

        let client = public_factory(server.url())
            .construct(&public_spec())
            .await
            .unwrap();
        assert_eq!(client.backend(), &Backend::Public);

        client.check_model("gemini-2.0-flash").await.unwrap();
        let response = client
            .generate_content(
                "gemini-2.0-flash",
                &serde_json::json!({"contents":[{"role":"user","parts":[{"text":"hi"}]}]}),
            )
            .await
            .unwrap();

        assert_eq!(response["candidates"][0]["content"]["parts"][0]["text"], "hi");
        check.assert_async().await;
        generate.assert_async().await;
    }

    #[tokio::test]
    async fn test_check_model_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/models/missing-model")
            .with_status(404)
            .with_body(r#"{"error":{"message":"not found"}}"#)
            .create_async()
            .await;

        let client = public_factory(server.url())
            .construct(&public_spec())
            .await
            .unwrap();

        let err = client.check_model("missing-model").await.unwrap_err();
        assert!(matches!(err, GenMediaError::Api(_)));
    }

    #[tokio::test]
    async fn test_vertex_client_uses_refreshed_token() {
        let mut server = mockito::Server::new_async().await;
        let token = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.vertex","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;
        let model = server
            .mock(
                "GET",
                "/v1/projects/media-studio/locations/us-central1/publishers/google/models/imagen-3.0-generate-002",
            )
            .match_header("authorization", "Bearer ya29.vertex")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let mut creds = NamedTempFile::new().unwrap();
        write!(
            creds,
            r#"{{"client_id":"a","client_secret":"b","refresh_token":"1//0r","type":"authorized_user"}}"#
        )
        .unwrap();

        let factory = GenAiClientFactory::new(
            GenAiConfig {
                vertex_base_url: format!("{}/v1", server.url()),
                ..GenAiConfig::default()
            },
            OAuthConfig {
                credentials_path: creds.path().to_string_lossy().to_string(),
                token_url: format!("{}/token", server.url()),
                ..OAuthConfig::default()
            },
        );

        let client = factory
            .construct(&ClientSpec {
                use_vertexai: true,
                project_id: "media-studio".to_string(),
                location: "us-central1".to_string(),
            })
            .await
            .unwrap();

        client.check_model("imagen-3.0-generate-002").await.unwrap();
        token.assert_async().await;
        model.assert_async().await;
    }

    #[tokio::test]
    async fn test_vertex_construction_fails_without_credentials() {
        let factory = GenAiClientFactory::new(
            GenAiConfig::default(),
            OAuthConfig {
                credentials_path: "/nonexistent/adc.json".to_string(),
                ..OAuthConfig::default()
            },
        );

        let err = factory
            .construct(&ClientSpec {
                use_vertexai: true,
                project_id: "p".to_string(),
                location: "l".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GenMediaError::InvalidCredentials(_)));
    }
}
