//! End-to-end tests for the Jarvis chat pipeline.
//!
//! These wire a config file, the SQLite vector store, ingestion and the chat
//! pipeline together, with scripted embedding and completion backends standing
//! in for Ollama.

use std::path::Path;
use std::sync::{Arc, Mutex};

use jarvis_agent::{ChatPipeline, ChatRequest, ChatStreamEvent};
use jarvis_config::AppConfig;
use jarvis_core::error::{IngestError, ProviderError};
use jarvis_core::provider::{CompletionBackend, CompletionRequest, Embedder};
use jarvis_core::{ChatMode, ConversationId, Role};

// ── Scripted backends ────────────────────────────────────────────────────

const VOCABULARY: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

/// One dimension per vocabulary word, counting occurrences.
struct KeywordEmbedder;

#[async_trait::async_trait]
impl Embedder for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(inputs
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                VOCABULARY
                    .iter()
                    .map(|word| lower.matches(word).count() as f32)
                    .collect()
            })
            .collect())
    }
}

/// Replies with a fixed answer and remembers every prompt it was sent.
struct ScriptedBackend {
    models: Vec<String>,
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            models: vec!["llama3.2:1b".into(), "llama3.2:3b".into()],
            reply: Some(reply.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Lists its models but every generation times out.
    fn timing_out() -> Arc<Self> {
        Arc::new(Self {
            models: vec!["llama3.2:1b".into()],
            reply: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CompletionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Ok(self.models.clone())
    }

    async fn generate(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(request.prompt);
        self.reply
            .clone()
            .ok_or(ProviderError::Timeout { timeout_secs: 180 })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn write_config(dir: &Path, extra: &str) -> AppConfig {
    let path = dir.join("config.toml");
    let toml = format!(
        "current_model = \"ultra_fast\"\n\
         \n\
         [retrieval]\n\
         top_k = 1\n\
         max_context_length = 2000\n\
         \n\
         [store]\n\
         backend = \"sqlite\"\n\
         path = '{}'\n\
         {extra}",
        dir.join("knowledge.db").display()
    );
    std::fs::write(&path, toml).unwrap();
    AppConfig::load_from(&path).unwrap()
}

async fn pipeline(config: &AppConfig, backend: Arc<ScriptedBackend>) -> ChatPipeline {
    let store = jarvis_memory::open_store(&config.store).await.unwrap();
    ChatPipeline::new(config, backend, Arc::new(KeywordEmbedder), store).unwrap()
}

async fn upload_greek(pipeline: &ChatPipeline, conversation: Option<&ConversationId>) -> String {
    pipeline
        .ingestor()
        .ingest("greek.txt", b"Alpha content.\n\nBeta content.", conversation)
        .await
        .unwrap()
        .doc_id
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_alpha_question_gets_alpha_context() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let backend = ScriptedBackend::replying("Alpha comes first.");
    let pipeline = pipeline(&config, backend.clone()).await;

    upload_greek(&pipeline, None).await;
    let reply = pipeline.chat(ChatRequest::new("What is alpha?")).await;

    assert_eq!(reply.response, "Alpha comes first.");
    assert_eq!(reply.sources, vec!["greek.txt"]);
    assert_eq!(reply.mode_used, ChatMode::Mixed);
    assert_eq!(reply.model_used, "ultra_fast");

    let prompt = &backend.prompts()[0];
    assert!(prompt.contains("Alpha content."));
    assert!(!prompt.contains("Beta content."));
    assert!(prompt.contains("USER QUESTION: What is alpha?"));
}

#[tokio::test]
async fn e2e_repeated_question_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let backend = ScriptedBackend::replying("Beta is second.");
    let pipeline = pipeline(&config, backend.clone()).await;
    upload_greek(&pipeline, None).await;

    let first = pipeline.chat(ChatRequest::new("And beta?")).await;
    let second = pipeline.chat(ChatRequest::new("And beta?")).await;

    assert_eq!(first.response, second.response);
    assert_eq!(backend.prompts().len(), 1);
    assert!(
        second
            .processing_steps
            .iter()
            .any(|s| s == "Using cached response")
    );

    pipeline.clear_caches();
    pipeline.chat(ChatRequest::new("And beta?")).await;
    assert_eq!(backend.prompts().len(), 2);
}

#[tokio::test]
async fn e2e_knowledge_base_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");

    {
        let pipeline = pipeline(&config, ScriptedBackend::replying("ok")).await;
        upload_greek(&pipeline, None).await;
        assert_eq!(pipeline.stats().await.unwrap().total_chunks, 2);
    }

    let backend = ScriptedBackend::replying("still here");
    let reopened = pipeline(&config, backend.clone()).await;
    assert_eq!(reopened.stats().await.unwrap().total_chunks, 2);

    let reply = reopened.chat(ChatRequest::new("alpha")).await;
    assert_eq!(reply.sources, vec!["greek.txt"]);
    assert!(backend.prompts()[0].contains("Alpha content."));
}

#[tokio::test]
async fn e2e_deleting_conversation_keeps_documents() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let backend = ScriptedBackend::replying("Alpha.");
    let pipeline = pipeline(&config, backend.clone()).await;

    let conversation = ConversationId::from("e2e-session");
    let doc_id = upload_greek(&pipeline, Some(&conversation)).await;
    assert_eq!(pipeline.sessions().documents(&conversation).await, vec![doc_id.clone()]);

    let mut request = ChatRequest::new("alpha?");
    request.conversation_id = Some(conversation.clone());
    request.session_doc_ids = Some(vec![doc_id]);
    let reply = pipeline.chat(request).await;
    assert_eq!(reply.conversation_id, conversation);

    let history = pipeline.sessions().history(&conversation).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].role, Role::Assistant);

    assert!(pipeline.sessions().delete(&conversation).await);
    assert!(pipeline.sessions().history(&conversation).await.is_empty());
    assert!(pipeline.sessions().documents(&conversation).await.is_empty());

    // Chunks stay searchable from any conversation.
    let reply = pipeline.chat(ChatRequest::new("alpha again")).await;
    assert_eq!(reply.sources, vec!["greek.txt"]);
    assert_eq!(pipeline.stats().await.unwrap().total_chunks, 2);
}

#[tokio::test]
async fn e2e_offline_mode_needs_no_backend() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "\n[ollama]\nmock_mode = true\n");
    let backend = ScriptedBackend::replying("never used");
    let pipeline = pipeline(&config, backend.clone()).await;

    let mut request = ChatRequest::new("hello there");
    request.mode = ChatMode::GeneralOnly;
    let first = pipeline.chat(request.clone()).await;
    let second = pipeline.chat(request).await;

    assert!(first.response.contains("hello there"));
    assert_eq!(first.response, second.response);
    assert!(backend.prompts().is_empty());
}

#[tokio::test]
async fn e2e_timeout_becomes_notice() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let pipeline = pipeline(&config, ScriptedBackend::timing_out()).await;

    let reply = pipeline.chat(ChatRequest::new("gamma?")).await;

    assert!(reply.response.contains("timed out"));
    assert_eq!(pipeline.stats().await.unwrap().cached_responses, 0);
}

#[tokio::test]
async fn e2e_stream_reports_steps_then_reply() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let pipeline = Arc::new(pipeline(&config, ScriptedBackend::replying("Streamed.")).await);
    upload_greek(&pipeline, None).await;

    let mut rx = pipeline.chat_stream(ChatRequest::new("beta"));
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert!(matches!(events.first(), Some(ChatStreamEvent::Status { .. })));
    assert!(matches!(events.last(), Some(ChatStreamEvent::Done)));
    let reply = events
        .iter()
        .find_map(|event| match event {
            ChatStreamEvent::Response(reply) => Some(reply),
            _ => None,
        })
        .unwrap();
    assert_eq!(reply.response, "Streamed.");
    assert_eq!(reply.sources, vec!["greek.txt"]);
}

#[tokio::test]
async fn e2e_empty_upload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let pipeline = pipeline(&config, ScriptedBackend::replying("ok")).await;

    let err = pipeline
        .ingestor()
        .ingest("blank.txt", b"\n\n  \n", None)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::NoContent));
    assert_eq!(pipeline.stats().await.unwrap().total_chunks, 0);
}
