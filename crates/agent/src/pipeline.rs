//! The chat pipeline.
//!
//! ```text
//! message → [retrieve context] → compose prompt → complete → record turns
//! ```
//!
//! Retrieval runs only for modes that use documents, and any failure there
//! degrades to an empty context. Completion never fails either: backend
//! trouble becomes a fallback message. The streamed variant runs the same
//! stages and reports each one as it finishes.

use std::sync::Arc;

use jarvis_config::AppConfig;
use jarvis_core::message::{ConversationId, Turn};
use jarvis_core::mode::ChatMode;
use jarvis_core::provider::{CompletionBackend, Embedder};
use jarvis_core::store::VectorStore;
use jarvis_memory::{EmbeddingCache, ResponseCache, SessionStore};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::completion::{Completion, CompletionClient, CompletionOutcome};
use crate::context::{ContextAssembler, RetrievedContext};
use crate::ingest::DocumentIngestor;
use crate::models::{ModelError, ModelSelector, display_name};
use crate::prompt;
use crate::stream_event::ChatStreamEvent;

const STREAM_BUFFER: usize = 32;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,

    #[serde(default)]
    pub conversation_id: Option<ConversationId>,

    #[serde(default)]
    pub mode: ChatMode,

    /// Preset key; unknown keys use the current model
    #[serde(default)]
    pub model: Option<String>,

    /// Restrict retrieval to these documents
    #[serde(default)]
    pub session_doc_ids: Option<Vec<String>>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id: None,
            mode: ChatMode::default(),
            model: None,
            session_doc_ids: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub conversation_id: ConversationId,
    pub sources: Vec<String>,
    pub mode_used: ChatMode,
    pub model_used: String,
    pub processing_steps: Vec<String>,
}

/// Counters for health and stats reporting.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub total_chunks: usize,
    pub cached_responses: usize,
    pub cached_embeddings: usize,
    pub conversations: usize,
    pub current_model: String,
    pub offline: bool,
}

/// Collects step labels and, when streaming, forwards each as it happens.
struct Progress {
    steps: Vec<String>,
    events: Option<mpsc::Sender<ChatStreamEvent>>,
}

impl Progress {
    fn collecting() -> Self {
        Self {
            steps: Vec::new(),
            events: None,
        }
    }

    fn streaming(events: mpsc::Sender<ChatStreamEvent>) -> Self {
        Self {
            steps: Vec::new(),
            events: Some(events),
        }
    }

    async fn step(&mut self, step: impl Into<String>) {
        self.emit(step.into(), None).await;
    }

    async fn emit(&mut self, step: String, conversation_id: Option<ConversationId>) {
        if let Some(events) = &self.events {
            // A closed receiver means the client went away; keep going so the
            // exchange is still recorded.
            let _ = events
                .send(ChatStreamEvent::Status {
                    step: step.clone(),
                    conversation_id,
                })
                .await;
        }
        self.steps.push(step);
    }
}

pub struct ChatPipeline {
    assembler: ContextAssembler,
    completion: CompletionClient,
    ingestor: DocumentIngestor,
    models: ModelSelector,
    sessions: Arc<SessionStore>,
    embeddings: Arc<EmbeddingCache>,
    store: Arc<dyn VectorStore>,
    top_k: usize,
}

impl ChatPipeline {
    /// Wire the pipeline from configuration and its three backends.
    pub fn new(
        config: &AppConfig,
        backend: Arc<dyn CompletionBackend>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self, ModelError> {
        let models = ModelSelector::new(config.models.clone(), &config.current_model)?;
        let sessions = Arc::new(SessionStore::new());
        let embeddings = Arc::new(EmbeddingCache::new(
            embedder.clone(),
            config.cache.embedding_capacity,
        ));
        let responses = Arc::new(ResponseCache::new(config.cache.response_capacity));

        Ok(Self {
            assembler: ContextAssembler::new(
                embeddings.clone(),
                store.clone(),
                config.retrieval.max_context_length,
            ),
            completion: CompletionClient::new(backend, responses, config.ollama.mock_mode),
            ingestor: DocumentIngestor::new(
                embedder,
                store.clone(),
                sessions.clone(),
                config.ingest.max_chunks,
            ),
            models,
            sessions,
            embeddings,
            store,
            top_k: config.retrieval.top_k,
        })
    }

    pub fn models(&self) -> &ModelSelector {
        &self.models
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn ingestor(&self) -> &DocumentIngestor {
        &self.ingestor
    }

    pub fn completion(&self) -> &CompletionClient {
        &self.completion
    }

    pub fn embedding_model(&self) -> &str {
        self.embeddings.embedder().name()
    }

    /// Run one chat turn.
    pub async fn chat(&self, request: ChatRequest) -> ChatReply {
        self.run(request, Progress::collecting()).await
    }

    /// Run one chat turn, streaming progress.
    ///
    /// The receiver yields status events as stages finish, then a response
    /// (or error) event, then [`ChatStreamEvent::Done`].
    pub fn chat_stream(self: &Arc<Self>, request: ChatRequest) -> mpsc::Receiver<ChatStreamEvent> {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let pipeline = Arc::clone(self);

        tokio::spawn(async move {
            let progress = Progress::streaming(tx.clone());
            let run = tokio::spawn(async move { pipeline.run(request, progress).await });

            let last = match run.await {
                Ok(reply) => ChatStreamEvent::Response(reply),
                Err(e) => {
                    warn!(error = %e, "Streamed chat failed");
                    ChatStreamEvent::Error {
                        error: e.to_string(),
                    }
                }
            };
            let _ = tx.send(last).await;
            let _ = tx.send(ChatStreamEvent::Done).await;
        });

        rx
    }

    async fn run(&self, request: ChatRequest, mut progress: Progress) -> ChatReply {
        let conversation_id = request.conversation_id.clone().unwrap_or_default();
        let mode = request.mode;
        info!(conversation_id = %conversation_id, mode = %mode, "Chat request");

        progress
            .emit(
                format!("Starting query processing (Mode: {})", display_name(mode.as_str())),
                Some(conversation_id.clone()),
            )
            .await;

        let context = if mode.uses_documents() {
            self.retrieve(&request, &mut progress).await
        } else {
            progress
                .step("Using general knowledge only (skipping document search)")
                .await;
            RetrievedContext::default()
        };

        let selected = self.models.resolve(request.model.as_deref());
        progress
            .step(format!("Using {} model", display_name(&selected.key)))
            .await;

        let composed = prompt::compose(&request.message, &context.text, mode);
        progress.step("Creating optimized prompt").await;

        let outcome = self
            .completion
            .complete(Completion {
                message: &request.message,
                context: &context.text,
                prompt: &composed,
                preset: &selected.preset,
            })
            .await;
        progress.step(outcome_step(&outcome)).await;

        let response = outcome.into_text();
        self.sessions
            .append_exchange(
                &conversation_id,
                Turn::user(request.message.as_str()),
                Turn::assistant(response.as_str(), context.sources.clone()),
            )
            .await;
        progress.step("Finalizing response and metadata").await;

        ChatReply {
            response,
            conversation_id,
            sources: context.sources,
            mode_used: mode,
            model_used: selected.key,
            processing_steps: progress.steps,
        }
    }

    async fn retrieve(&self, request: &ChatRequest, progress: &mut Progress) -> RetrievedContext {
        let scope = request
            .session_doc_ids
            .as_deref()
            .filter(|ids| !ids.is_empty());

        match scope {
            Some(ids) => {
                progress
                    .step(format!("Searching {} session documents", ids.len()))
                    .await
            }
            None => {
                let total = self.store.count().await.unwrap_or(0);
                progress
                    .step(format!("Searching {total} chunks in knowledge base"))
                    .await
            }
        }
        progress.step("Generating query embedding").await;

        let context = match self
            .assembler
            .assemble(&request.message, self.top_k, scope)
            .await
        {
            Ok(context) => context,
            Err(e) => {
                warn!(error = %e, "Retrieval failed, continuing without context");
                RetrievedContext::default()
            }
        };

        if context.chunks_used > 0 {
            progress
                .step(format!(
                    "Found {} relevant chunks, using {} for context",
                    context.chunks_found, context.chunks_used
                ))
                .await;
        } else {
            progress
                .step("No relevant documents found in knowledge base")
                .await;
        }
        context
    }

    /// Empty both caches.
    pub fn clear_caches(&self) -> String {
        let responses = self.completion.cache().clear();
        let embeddings = self.embeddings.clear();
        info!(responses, embeddings, "Caches cleared");
        format!("Cleared {responses} cached responses and embeddings")
    }

    pub async fn stats(&self) -> Result<PipelineStats, jarvis_core::StoreError> {
        Ok(PipelineStats {
            total_chunks: self.store.count().await?,
            cached_responses: self.completion.cache().len(),
            cached_embeddings: self.embeddings.len(),
            conversations: self.sessions.len().await,
            current_model: self.models.current().key,
            offline: self.completion.is_offline(),
        })
    }
}

fn outcome_step(outcome: &CompletionOutcome) -> &'static str {
    match outcome {
        CompletionOutcome::Cached(_) => "Using cached response",
        CompletionOutcome::Generated(_) => "Response generated successfully",
        CompletionOutcome::Offline(_) => "Generated offline response",
        CompletionOutcome::Fallback(_) => "Language model unavailable, returning notice",
    }
}
