//! Query-embedding cache.
//!
//! Memoizes the vector for each exact query string so repeated questions
//! skip the embedding backend. Least-recently-used entries are dropped once
//! the capacity is reached.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use jarvis_core::error::ProviderError;
use jarvis_core::provider::Embedder;
use lru::LruCache;
use tracing::debug;

pub struct EmbeddingCache {
    embedder: Arc<dyn Embedder>,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl EmbeddingCache {
    pub fn new(embedder: Arc<dyn Embedder>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            embedder,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// The wrapped embedder, for uncached batch work such as ingestion.
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Embed `query`, reusing the cached vector for a byte-identical string.
    ///
    /// The lock is not held across the backend call, so two concurrent misses
    /// on the same key may both compute; the later write wins.
    pub async fn embed(&self, query: &str) -> Result<Vec<f32>, ProviderError> {
        let cached = self.lock().get(query).cloned();
        if let Some(hit) = cached {
            debug!(query_chars = query.len(), "Embedding cache hit");
            return Ok(hit);
        }

        let embedding = self.embedder.embed_one(query).await?;
        self.lock().put(query.to_string(), embedding.clone());
        Ok(embedding)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry, returning how many were removed.
    pub fn clear(&self) -> usize {
        let mut cache = self.lock();
        let removed = cache.len();
        cache.clear();
        removed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, Vec<f32>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
