//! Completion client: response cache, offline mode, availability check,
//! generation, and textual fallbacks.
//!
//! Every path yields text. Backend failures become explanatory messages for
//! the user instead of errors, and only real generations are cached.

use std::sync::Arc;

use jarvis_config::ModelPreset;
use jarvis_core::error::ProviderError;
use jarvis_core::provider::{CompletionBackend, CompletionRequest};
use jarvis_memory::{CacheKey, ResponseCache};
use tracing::{debug, info, warn};

/// One completion to perform.
#[derive(Debug, Clone, Copy)]
pub struct Completion<'a> {
    /// The user's message as typed
    pub message: &'a str,

    /// Assembled context (possibly empty)
    pub context: &'a str,

    /// The composed prompt sent to the backend
    pub prompt: &'a str,

    pub preset: &'a ModelPreset,
}

impl Completion<'_> {
    fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.prompt, self.context)
    }
}

/// How a completion's text was produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    Cached(String),
    Generated(String),
    Offline(String),
    Fallback(String),
}

impl CompletionOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Cached(t) | Self::Generated(t) | Self::Offline(t) | Self::Fallback(t) => t,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Cached(t) | Self::Generated(t) | Self::Offline(t) | Self::Fallback(t) => t,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cached(_) => "cached",
            Self::Generated(_) => "generated",
            Self::Offline(_) => "offline",
            Self::Fallback(_) => "fallback",
        }
    }
}

const NOT_RUNNING: &str =
    "Ollama service is not running. Please start Ollama first, or set MOCK_MODE=true for testing.";
const TIMED_OUT: &str =
    "The model response timed out. The model might be loading or the query is too complex.";

/// The user-facing text for a backend failure.
pub fn fallback_message(error: &ProviderError) -> String {
    match error {
        ProviderError::Unavailable(_) => NOT_RUNNING.to_string(),
        ProviderError::ModelNotFound(name) => {
            format!("Model '{name}' not found. Please run: ollama pull {name}")
        }
        ProviderError::Timeout { .. } => TIMED_OUT.to_string(),
        other => format!("Error connecting to the language model: {other}"),
    }
}

/// Canned text for offline mode.
pub fn offline_response(message: &str, context: &str) -> String {
    if context.is_empty() {
        format!(
            "Mock response to '{message}': This is a simulated AI response. To get real \
             responses, install and run Ollama with the configured model."
        )
    } else {
        format!(
            "Based on the provided context, here's my response to '{message}': This is a mock \
             response. The system found relevant information in the knowledge base and would \
             normally use the language model to generate a contextual response."
        )
    }
}

/// Whether `model` appears in the backend's listing, with or without the
/// implicit `:latest` tag.
pub fn is_model_listed(available: &[String], model: &str) -> bool {
    available
        .iter()
        .any(|name| name == model || name.strip_suffix(":latest") == Some(model))
}

pub struct CompletionClient {
    backend: Arc<dyn CompletionBackend>,
    cache: Arc<ResponseCache>,
    offline: bool,
}

impl CompletionClient {
    pub fn new(backend: Arc<dyn CompletionBackend>, cache: Arc<ResponseCache>, offline: bool) -> Self {
        Self {
            backend,
            cache,
            offline,
        }
    }

    pub fn backend(&self) -> &Arc<dyn CompletionBackend> {
        &self.backend
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub async fn complete(&self, completion: Completion<'_>) -> CompletionOutcome {
        let key = completion.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            debug!(key = %key, "Response cache hit");
            return CompletionOutcome::Cached(hit);
        }

        if self.offline {
            return CompletionOutcome::Offline(offline_response(
                completion.message,
                completion.context,
            ));
        }

        match self.generate(&completion).await {
            Ok(text) => {
                self.cache.put(key, text.clone());
                CompletionOutcome::Generated(text)
            }
            Err(e) => {
                warn!(
                    backend = self.backend.name(),
                    model = %completion.preset.name,
                    error = %e,
                    "Completion failed"
                );
                CompletionOutcome::Fallback(fallback_message(&e))
            }
        }
    }

    async fn generate(&self, completion: &Completion<'_>) -> Result<String, ProviderError> {
        let model = &completion.preset.name;

        let available = self.backend.list_models().await?;
        if !is_model_listed(&available, model) {
            return Err(ProviderError::ModelNotFound(model.clone()));
        }

        info!(model = %model, prompt_chars = completion.prompt.len(), "Sending prompt");
        let text = self
            .backend
            .generate(CompletionRequest {
                model: model.clone(),
                prompt: completion.prompt.to_string(),
                options: completion.preset.options.clone(),
            })
            .await?;
        debug!(model = %model, response_chars = text.len(), "Response received");
        Ok(text)
    }
}
