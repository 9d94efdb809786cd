//! Vector store trait: chunk storage with similarity search.
//!
//! Chunks are immutable once inserted. There is no per-chunk deletion; the
//! only removal path is [`VectorStore::clear`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Placeholder source name for chunks stored without a filename.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Metadata attached to every stored chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Owning document
    pub doc_id: String,

    /// Original upload filename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Position of the chunk within its document
    pub chunk_index: usize,

    /// Ingestion time
    pub timestamp: DateTime<Utc>,
}

impl ChunkMetadata {
    /// The store identifier for this chunk: `{doc_id}_chunk_{index}`.
    pub fn chunk_id(&self) -> String {
        format!("{}_chunk_{}", self.doc_id, self.chunk_index)
    }

    /// The filename, or [`UNKNOWN_SOURCE`] when none was recorded.
    pub fn source_name(&self) -> &str {
        self.filename.as_deref().unwrap_or(UNKNOWN_SOURCE)
    }
}

/// A stored chunk as returned by inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A similarity search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,

    /// Cosine similarity to the query
    pub score: f32,
}

/// The core VectorStore trait.
///
/// Implementations: SQLite (persistent), in-memory (ephemeral / tests).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "memory").
    fn name(&self) -> &str;

    /// Append chunks with their embeddings and metadata.
    ///
    /// All three slices must have the same length. Returns the generated ids
    /// in input order.
    async fn insert(
        &self,
        chunks: &[String],
        embeddings: &[Vec<f32>],
        metadata: &[ChunkMetadata],
    ) -> Result<Vec<String>, StoreError>;

    /// Return up to `top_k` chunks ranked by similarity, best first.
    ///
    /// When `doc_ids` is given and non-empty, only chunks of those documents
    /// are considered. An empty store or an exclusive filter yields an empty
    /// result, not an error.
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        doc_ids: Option<&[String]>,
    ) -> Result<Vec<SearchHit>, StoreError>;

    /// The first `limit` chunks in insertion order.
    async fn peek(&self, limit: usize) -> Result<Vec<StoredChunk>, StoreError>;

    /// Total stored chunk count.
    async fn count(&self) -> Result<usize, StoreError>;

    /// Remove every chunk.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Reject an insert whose parallel inputs disagree in length.
pub fn ensure_aligned(
    chunks: &[String],
    embeddings: &[Vec<f32>],
    metadata: &[ChunkMetadata],
) -> Result<(), StoreError> {
    if chunks.len() != embeddings.len() || chunks.len() != metadata.len() {
        return Err(StoreError::LengthMismatch {
            chunks: chunks.len(),
            embeddings: embeddings.len(),
            metadata: metadata.len(),
        });
    }
    Ok(())
}

/// Normalise a search filter: `Some(&[])` means "no filter".
pub fn active_filter(doc_ids: Option<&[String]>) -> Option<&[String]> {
    doc_ids.filter(|ids| !ids.is_empty())
}
