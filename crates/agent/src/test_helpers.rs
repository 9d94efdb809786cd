//! Scripted backends shared by the pipeline tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use jarvis_core::error::ProviderError;
use jarvis_core::provider::{CompletionBackend, CompletionRequest, Embedder};
use jarvis_core::store::ChunkMetadata;

const VOCABULARY: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

/// Embeds text as keyword counts over a tiny fixed vocabulary.
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        VOCABULARY
            .iter()
            .map(|term| words.iter().filter(|w| *w == term).count() as f32)
            .collect()
    }

    pub fn encode_all(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.encode(t)).collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(self.encode_all(inputs))
    }
}

pub fn metadata(doc_id: &str, chunk_index: usize) -> ChunkMetadata {
    ChunkMetadata {
        doc_id: doc_id.into(),
        filename: None,
        chunk_index,
        timestamp: Utc::now(),
    }
}

/// A completion backend with a fixed model list and a fixed reply.
pub struct ScriptedBackend {
    models: Result<Vec<String>, ProviderError>,
    reply: Result<String, ProviderError>,
    generate_calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl ScriptedBackend {
    pub fn new(models: &[&str], reply: &str) -> Self {
        Self {
            models: Ok(models.iter().map(|m| m.to_string()).collect()),
            reply: Ok(reply.to_string()),
            generate_calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn unreachable() -> Self {
        let mut backend = Self::new(&[], "");
        backend.models = Err(ProviderError::Unavailable("connection refused".into()));
        backend
    }

    pub fn failing(models: &[&str], error: ProviderError) -> Self {
        let mut backend = Self::new(models, "");
        backend.reply = Err(error);
        backend
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        self.models.clone()
    }

    async fn generate(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        self.reply.clone()
    }
}
