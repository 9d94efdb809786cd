//! Context assembly: query embedding → similarity search → budgeted packing.
//!
//! # Budget
//!
//! Chunk texts are joined in ranked order with a blank line between them.
//! A chunk is appended only if the joined length (separators included, in
//! characters) stays within `max_context_length`. The first chunk is the
//! exception: it is always included in full, so a single oversized chunk
//! still yields context. Packing stops at the first chunk that does not fit.

use std::sync::Arc;

use jarvis_core::error::{ProviderError, StoreError};
use jarvis_core::store::{SearchHit, VectorStore};
use jarvis_memory::EmbeddingCache;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

const SEPARATOR: &str = "\n\n";

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("Failed to embed query: {0}")]
    Embedding(#[from] ProviderError),

    #[error("Failed to search knowledge base: {0}")]
    Search(#[from] StoreError),
}

/// The packed context and where it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievedContext {
    /// Chunk texts joined by blank lines; empty when nothing matched
    pub text: String,

    /// Source filename per included chunk, in ranked order
    pub sources: Vec<String>,

    /// Chunks returned by the search
    pub chunks_found: usize,

    /// Chunks that made it into `text`
    pub chunks_used: usize,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Pack ranked hits into a context string under `max_len` characters.
pub fn fit_to_budget(hits: &[SearchHit], max_len: usize) -> RetrievedContext {
    let mut context = RetrievedContext {
        chunks_found: hits.len(),
        ..Default::default()
    };
    let mut used = 0usize;

    for hit in hits {
        let len = hit.text.chars().count();
        if context.chunks_used == 0 {
            context.text.push_str(&hit.text);
            used = len;
        } else {
            let next = used + SEPARATOR.len() + len;
            if next > max_len {
                break;
            }
            context.text.push_str(SEPARATOR);
            context.text.push_str(&hit.text);
            used = next;
        }
        context.sources.push(hit.metadata.source_name().to_string());
        context.chunks_used += 1;
    }

    context
}

pub struct ContextAssembler {
    embeddings: Arc<EmbeddingCache>,
    store: Arc<dyn VectorStore>,
    max_context_length: usize,
}

impl ContextAssembler {
    pub fn new(
        embeddings: Arc<EmbeddingCache>,
        store: Arc<dyn VectorStore>,
        max_context_length: usize,
    ) -> Self {
        Self {
            embeddings,
            store,
            max_context_length,
        }
    }

    pub fn max_context_length(&self) -> usize {
        self.max_context_length
    }

    /// Retrieve and pack context for `query`.
    ///
    /// `session_doc_ids`, when non-empty, restricts the search to those
    /// documents. No matches is an empty context, not an error.
    pub async fn assemble(
        &self,
        query: &str,
        top_k: usize,
        session_doc_ids: Option<&[String]>,
    ) -> Result<RetrievedContext, AssemblyError> {
        let embedding = self.embeddings.embed(query).await?;
        let hits = self.store.search(&embedding, top_k, session_doc_ids).await?;
        let context = fit_to_budget(&hits, self.max_context_length);

        debug!(
            found = context.chunks_found,
            used = context.chunks_used,
            chars = context.text.chars().count(),
            "Assembled context"
        );
        Ok(context)
    }
}
