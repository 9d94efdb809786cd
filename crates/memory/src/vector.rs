//! Vector similarity utilities.
//!
//! Pure-Rust implementations of:
//! - Cosine similarity
//! - Brute-force top-K ranking with an optional document filter
//! - Little-endian BLOB encoding for persisted embeddings

use jarvis_core::store::{ChunkMetadata, SearchHit};

/// A stored chunk together with its embedding.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if the lengths differ or either vector is empty or zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank chunks by cosine similarity to a query embedding.
///
/// Returns at most `top_k` hits sorted by descending similarity. Ties keep
/// insertion order. When `doc_ids` is `Some`, chunks of other documents are
/// skipped.
pub fn rank<'a>(
    chunks: impl IntoIterator<Item = &'a EmbeddedChunk>,
    query_embedding: &[f32],
    top_k: usize,
    doc_ids: Option<&[String]>,
) -> Vec<SearchHit> {
    if top_k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<SearchHit> = chunks
        .into_iter()
        .filter(|chunk| doc_ids.is_none_or(|ids| ids.iter().any(|id| *id == chunk.metadata.doc_id)))
        .map(|chunk| SearchHit {
            id: chunk.id.clone(),
            text: chunk.text.clone(),
            metadata: chunk.metadata.clone(),
            score: cosine_similarity(&chunk.embedding, query_embedding),
        })
        .collect();

    // sort_by is stable, so equal scores stay in insertion order
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    scored
}

/// Serialize an embedding vector to little-endian bytes.
pub fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Decode a little-endian BLOB back into a vector. Trailing bytes are ignored.
pub fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
