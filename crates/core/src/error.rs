//! Error types for the Jarvis domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; the top-level [`Error`]
//! wraps them so callers can use `?` across context boundaries.

use thiserror::Error;

/// The top-level error type for all Jarvis operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion / embedding backend errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Vector store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Document ingestion errors ---
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    // --- Lookup by identifier ---
    #[error("{0}")]
    NotFound(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to the completion or embedding backend.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Length mismatch: {chunks} chunks, {embeddings} embeddings, {metadata} metadata entries")]
    LengthMismatch {
        chunks: usize,
        embeddings: usize,
        metadata: usize,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

/// Rejections raised while turning an uploaded file into stored chunks.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No text found in PDF. The PDF might be image-based or encrypted.")]
    EmptyPdf,

    #[error("Failed to extract text from PDF: {0}")]
    PdfExtraction(String),

    #[error("No content found in the file")]
    NoContent,

    #[error("Embedding failed: {0}")]
    Embedding(#[from] ProviderError),

    #[error("Store failed: {0}")]
    Store(#[from] StoreError),
}

impl IngestError {
    /// Whether the rejection is the caller's fault (bad document) rather than
    /// a backend failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IngestError::EmptyPdf | IngestError::PdfExtraction(_) | IngestError::NoContent
        )
    }
}
