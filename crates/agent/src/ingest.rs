//! Document ingestion: extract text, split into chunks, embed, store.
//!
//! PDFs go through `pdf-extract`; everything else is read as UTF-8 with a
//! Latin-1 fallback. Chunks are paragraphs (blank-line separated) or, if the
//! text has none, individual lines.

use std::sync::Arc;

use chrono::Utc;
use jarvis_core::error::IngestError;
use jarvis_core::message::ConversationId;
use jarvis_core::provider::Embedder;
use jarvis_core::store::{ChunkMetadata, VectorStore};
use jarvis_memory::SessionStore;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    pub message: String,
    pub doc_id: String,
    pub chunks: usize,
}

pub struct DocumentIngestor {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    sessions: Arc<SessionStore>,
    max_chunks: usize,
}

impl DocumentIngestor {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        sessions: Arc<SessionStore>,
        max_chunks: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            sessions,
            max_chunks,
        }
    }

    /// Store `bytes` as a new document. When `conversation` is given, the
    /// document is also recorded against that session for scoped retrieval.
    pub async fn ingest(
        &self,
        filename: &str,
        bytes: &[u8],
        conversation: Option<&ConversationId>,
    ) -> Result<IngestReceipt, IngestError> {
        let text = extract_document(filename, bytes).await?;
        let mut chunks = split_chunks(&text);
        if chunks.is_empty() {
            return Err(IngestError::NoContent);
        }
        chunks.truncate(self.max_chunks);

        let embeddings = self.embedder.embed(&chunks).await?;

        let doc_id = new_doc_id();
        let timestamp = Utc::now();
        let metadata: Vec<ChunkMetadata> = (0..chunks.len())
            .map(|chunk_index| ChunkMetadata {
                doc_id: doc_id.clone(),
                filename: Some(filename.to_string()),
                chunk_index,
                timestamp,
            })
            .collect();

        self.store.insert(&chunks, &embeddings, &metadata).await?;

        if let Some(id) = conversation {
            self.sessions.track_document(id, doc_id.clone()).await;
        }

        info!(filename, doc_id = %doc_id, chunks = chunks.len(), "Document ingested");
        Ok(IngestReceipt {
            message: format!("Document '{filename}' uploaded successfully"),
            doc_id,
            chunks: chunks.len(),
        })
    }
}

/// `doc_{unix_seconds}_{8 hex chars}`
fn new_doc_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("doc_{}_{}", Utc::now().timestamp(), &suffix[..8])
}

/// Like [`extract_text`], but PDF parsing runs on the blocking pool.
pub async fn extract_document(filename: &str, bytes: &[u8]) -> Result<String, IngestError> {
    if !is_pdf(filename) {
        return extract_text(filename, bytes);
    }

    let owned = bytes.to_vec();
    tokio::task::spawn_blocking(move || extract_pdf(&owned))
        .await
        .map_err(|e| IngestError::PdfExtraction(e.to_string()))?
}

pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, IngestError> {
    if is_pdf(filename) {
        return extract_pdf(bytes);
    }

    Ok(match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        // Latin-1 maps every byte to the code point of the same value.
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    })
}

fn is_pdf(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf")
}

fn extract_pdf(bytes: &[u8]) -> Result<String, IngestError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| IngestError::PdfExtraction(e.to_string()))?;
    if text.trim().is_empty() {
        return Err(IngestError::EmptyPdf);
    }
    Ok(text)
}

/// Paragraph chunks, falling back to line chunks. Trimmed, never empty.
pub fn split_chunks(text: &str) -> Vec<String> {
    let split = |sep: &str| -> Vec<String> {
        text.split(sep)
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .map(String::from)
            .collect()
    };

    let paragraphs = split("\n\n");
    if paragraphs.is_empty() {
        split("\n")
    } else {
        paragraphs
    }
}
