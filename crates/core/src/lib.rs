//! # Jarvis Core
//!
//! Domain types, traits, and error definitions for the Jarvis
//! retrieval-augmented assistant. This crate has **no framework
//! dependencies**: it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here:
//! - [`CompletionBackend`] generates text from a prompt
//! - [`Embedder`] encodes text as vectors
//! - [`VectorStore`] stores chunks and answers similarity queries
//!
//! Implementations live in their respective crates, and tests swap in
//! scripted versions.

pub mod error;
pub mod message;
pub mod mode;
pub mod provider;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use error::{Error, IngestError, ProviderError, Result, StoreError};
pub use message::{ConversationId, Role, Turn};
pub use mode::ChatMode;
pub use provider::{CompletionBackend, CompletionRequest, Embedder, GenerationOptions};
pub use store::{ChunkMetadata, SearchHit, StoredChunk, VectorStore};
