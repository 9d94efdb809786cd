//! The chat pipeline: the heart of Jarvis.
//!
//! A message flows through:
//!
//! 1. **Retrieve** context (embedding cache → vector store → budgeted packing)
//! 2. **Compose** a mode-specific prompt
//! 3. **Complete** through the response cache and the completion backend
//! 4. **Record** the exchange in the session
//!
//! Failures in steps 1 and 3 degrade to empty context or an explanatory
//! message; a chat turn always produces a reply. Document ingestion lives
//! here too because it shares the embedder, store, and session state.

pub mod completion;
pub mod context;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod stream_event;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use completion::{Completion, CompletionClient, CompletionOutcome, fallback_message};
pub use context::{AssemblyError, ContextAssembler, RetrievedContext};
pub use ingest::{DocumentIngestor, IngestReceipt};
pub use models::{ModelError, ModelListing, ModelSelector, SelectedModel};
pub use pipeline::{ChatPipeline, ChatReply, ChatRequest, PipelineStats};
pub use stream_event::ChatStreamEvent;
