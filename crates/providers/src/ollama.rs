//! Ollama HTTP client.
//!
//! Talks to a local Ollama daemon:
//! - `GET  /api/tags`: availability check, lists pulled models
//! - `POST /api/generate`: non-streaming text completion
//! - `POST /api/embed`: batch embeddings
//!
//! Transport failures are classified so the completion client can tell an
//! unreachable daemon apart from a timeout or a missing model.

use std::time::Duration;

use async_trait::async_trait;
use jarvis_config::{EmbeddingConfig, OllamaConfig};
use jarvis_core::error::ProviderError;
use jarvis_core::provider::{CompletionBackend, CompletionRequest, Embedder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A completion backend backed by Ollama's native API.
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
    request_timeout: Duration,
    health_timeout: Duration,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            request_timeout: Duration::from_secs(180),
            health_timeout: Duration::from_secs(5),
        })
    }

    pub fn from_config(config: &OllamaConfig) -> Result<Self, ProviderError> {
        Ok(Self::new(&config.base_url)?
            .with_request_timeout(Duration::from_secs(config.request_timeout_secs))
            .with_health_timeout(Duration::from_secs(config.health_timeout_secs)))
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Map a send/receive failure onto the provider taxonomy.
    fn classify(&self, err: reqwest::Error, timeout: Duration) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout {
                timeout_secs: timeout.as_secs(),
            }
        } else if err.is_connect() {
            ProviderError::Unavailable(format!("cannot connect to {}: {err}", self.base_url))
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl CompletionBackend for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| match self.classify(e, self.health_timeout) {
                // A tags request that cannot complete means the daemon is not serving.
                ProviderError::Timeout { .. } | ProviderError::Network(_) => {
                    ProviderError::Unavailable(format!("no response from {}", self.base_url))
                }
                other => other,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Ollama availability check failed");
            return Err(ProviderError::Unavailable(format!(
                "availability check returned {status}"
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse tags: {e}")))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn generate(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            stream: false,
            options: &request.options,
        };

        debug!(
            model = %request.model,
            prompt_chars = request.prompt.len(),
            "Sending generate request"
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e, self.request_timeout))?;

        let status = response.status().as_u16();

        if status == 404 {
            return Err(ProviderError::ModelNotFound(request.model));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Ollama returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let generated: GenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    timeout_secs: self.request_timeout.as_secs(),
                }
            } else {
                ProviderError::InvalidResponse(format!("Failed to parse response: {e}"))
            }
        })?;

        Ok(generated.response)
    }
}

/// Embeddings via `POST /api/embed`.
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn from_config(
        ollama: &OllamaConfig,
        embedding: &EmbeddingConfig,
    ) -> Result<Self, ProviderError> {
        Ok(Self::new(OllamaClient::from_config(ollama)?, &embedding.model))
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.client.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": inputs,
        });

        debug!(model = %self.model, count = inputs.len(), "Sending embedding request");

        let response = self
            .client
            .client
            .post(&url)
            .timeout(self.client.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.client.classify(e, self.client.request_timeout))?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(ProviderError::ModelNotFound(self.model.clone()));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse embedding response: {e}"))
        })?;

        if parsed.embeddings.len() != inputs.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                parsed.embeddings.len()
            )));
        }

        Ok(parsed.embeddings)
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a jarvis_core::GenerationOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    name: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}
