//! Backend implementations for Jarvis.
//!
//! - [`OllamaClient`] implements `jarvis_core::CompletionBackend`
//! - [`OllamaEmbedder`] and [`HashEmbedder`] implement `jarvis_core::Embedder`
//!
//! [`build_embedder`] picks the embedder named in configuration.

pub mod hashing;
pub mod ollama;

use std::sync::Arc;

use jarvis_config::AppConfig;
use jarvis_core::error::ProviderError;
use jarvis_core::provider::Embedder;

pub use hashing::HashEmbedder;
pub use ollama::{OllamaClient, OllamaEmbedder};

/// Build the embedder selected by `embedding.provider`.
pub fn build_embedder(config: &AppConfig) -> Result<Arc<dyn Embedder>, ProviderError> {
    match config.embedding.provider.as_str() {
        "hash" => Ok(Arc::new(HashEmbedder::new(config.embedding.dimensions))),
        "ollama" => Ok(Arc::new(OllamaEmbedder::from_config(
            &config.ollama,
            &config.embedding,
        )?)),
        other => Err(ProviderError::NotConfigured(format!(
            "unknown embedding provider '{other}'"
        ))),
    }
}
