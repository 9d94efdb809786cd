//! Retrieval context for the chat pipeline.
//!
//! The assembler embeds the query (through the embedding cache), searches the
//! vector store, and packs the ranked chunk texts into a single string under
//! a character budget.

pub mod assembler;

pub use assembler::{AssemblyError, ContextAssembler, RetrievedContext, fit_to_budget};
