//! Backend traits: text completion and embeddings.
//!
//! A [`CompletionBackend`] turns a fully composed prompt into generated text.
//! An [`Embedder`] turns text into vectors for similarity search.
//!
//! Implementations: Ollama over HTTP, a deterministic hashing embedder, and
//! scripted mocks in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Sampling and runtime options forwarded verbatim to the backend.
///
/// Unset fields are omitted from the wire payload so the backend applies
/// its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus-sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Restrict sampling to the K most likely tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Maximum output tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,

    /// Context window size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f32>,

    /// CPU thread hint (-1 = backend decides)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_thread: Option<i32>,

    /// Accelerator hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_gpu: Option<i32>,

    /// Perplexity control (0 = off, 1 or 2 = mirostat version)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirostat: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirostat_tau: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirostat_eta: Option<f32>,
}

/// A single non-streaming completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Backend model identifier (e.g., "llama3.2:1b")
    pub model: String,

    /// The exact prompt text
    pub prompt: String,

    pub options: GenerationOptions,
}

/// The text-generation backend.
///
/// The completion client calls [`list_models`](CompletionBackend::list_models)
/// before every generation so it can report a missing model distinctly from an
/// unreachable service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// A human-readable name for this backend (e.g., "ollama").
    fn name(&self) -> &str;

    /// List the models currently available on the backend.
    ///
    /// Returns [`ProviderError::Unavailable`] when the backend cannot be reached.
    async fn list_models(&self) -> Result<Vec<String>, ProviderError>;

    /// Generate text for a prompt.
    async fn generate(&self, request: CompletionRequest) -> Result<String, ProviderError>;
}

/// Text → vector encoder.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// The embedding model name.
    fn name(&self) -> &str;

    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ProviderError::InvalidResponse(format!(
                    "Embedder '{}' returned no vectors",
                    self.name()
                ))
            })
    }
}
