//! In-memory vector store: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use jarvis_core::error::StoreError;
use jarvis_core::store::{
    ChunkMetadata, SearchHit, StoredChunk, VectorStore, active_filter, ensure_aligned,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::vector::{self, EmbeddedChunk};

/// A vector store that keeps every chunk in a Vec and ranks by brute force.
pub struct InMemoryStore {
    chunks: Arc<RwLock<Vec<EmbeddedChunk>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            chunks: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert(
        &self,
        chunks: &[String],
        embeddings: &[Vec<f32>],
        metadata: &[ChunkMetadata],
    ) -> Result<Vec<String>, StoreError> {
        ensure_aligned(chunks, embeddings, metadata)?;

        let rows: Vec<EmbeddedChunk> = chunks
            .iter()
            .zip(embeddings)
            .zip(metadata)
            .map(|((text, embedding), meta)| EmbeddedChunk {
                id: meta.chunk_id(),
                text: text.clone(),
                embedding: embedding.clone(),
                metadata: meta.clone(),
            })
            .collect();
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();

        // The whole batch is rejected if any id is already taken.
        let mut stored = self.chunks.write().await;
        let mut taken: HashSet<&str> = stored.iter().map(|c| c.id.as_str()).collect();
        for id in &ids {
            if !taken.insert(id.as_str()) {
                return Err(StoreError::Storage(format!("duplicate chunk id '{id}'")));
            }
        }

        stored.extend(rows);
        Ok(ids)
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        doc_ids: Option<&[String]>,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let chunks = self.chunks.read().await;
        Ok(vector::rank(
            chunks.iter(),
            query_embedding,
            top_k,
            active_filter(doc_ids),
        ))
    }

    async fn peek(&self, limit: usize) -> Result<Vec<StoredChunk>, StoreError> {
        let chunks = self.chunks.read().await;
        Ok(chunks
            .iter()
            .take(limit)
            .map(|c| StoredChunk {
                id: c.id.clone(),
                text: c.text.clone(),
                metadata: c.metadata.clone(),
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.chunks.read().await.len())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.chunks.write().await.clear();
        Ok(())
    }
}
