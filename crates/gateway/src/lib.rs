//! HTTP API gateway for Jarvis.
//!
//! Exposes the chat pipeline, document upload, knowledge-base inspection,
//! model switching, conversation history, and the email assistant over
//! REST. Chat can also stream progress as server-sent events.
//!
//! Built on Axum.

pub mod api;
pub mod email;
pub mod error;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, Method, header};
use axum::response::Json;
use axum::routing::{delete, get, post};
use axum::Router;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use jarvis_agent::ChatPipeline;
use jarvis_assistant::{DisabledMailer, DraftStore};
use jarvis_config::{AppConfig, EmailConfig};
use jarvis_providers::OllamaClient;

pub use api::MessageResponse;
pub use error::{ApiError, ErrorResponse};

/// Uploads larger than this are rejected before reaching the handler.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Shared application state.
pub struct AppState {
    pub pipeline: Arc<ChatPipeline>,
    pub drafts: DraftStore,
    pub email: EmailConfig,
}

pub type SharedState = Arc<AppState>;

/// Build the router with every route, CORS for `cors_origins`, and
/// request tracing.
pub fn build_router(state: SharedState, cors_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/chat", post(api::chat_handler))
        .route("/chat/stream", post(api::chat_stream_handler))
        .route("/upload-document", post(api::upload_handler))
        .route("/knowledge-base/stats", get(api::stats_handler))
        .route("/knowledge-base/inspect", get(api::inspect_handler))
        .route("/models", get(api::list_models_handler))
        .route("/models/{key}", post(api::switch_model_handler))
        .route("/cache/clear", post(api::clear_cache_handler))
        .route("/conversation/{id}/history", get(api::history_handler))
        .route("/conversation/{id}/documents", get(api::documents_handler))
        .route("/conversation/{id}", delete(api::delete_conversation_handler))
        .nest("/personal-assistant/email", email::email_router())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// Builds the completion backend, embedder, and vector store from `config`
/// and serves until the process exits.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let backend = Arc::new(OllamaClient::from_config(&config.ollama)?);
    let embedder = jarvis_providers::build_embedder(&config)?;
    let store = jarvis_memory::open_store(&config.store).await?;
    let pipeline = Arc::new(ChatPipeline::new(&config, backend, embedder, store)?);

    let state = Arc::new(AppState {
        pipeline,
        drafts: DraftStore::new(Arc::new(DisabledMailer)),
        email: config.email.clone(),
    });
    let app = build_router(state, &config.gateway.cors_origins);

    info!(
        addr = %addr,
        model = %config.current_model,
        mock_mode = config.ollama.mock_mode,
        store = %config.store.backend,
        "Gateway starting"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

async fn root_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Jarvis Assistant API is running".into(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    chunks: Option<usize>,
    embedding_model: String,
    completion_backend: String,
    current_model: String,
    mock_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let pipeline = &state.pipeline;
    let (status, chunks, error) = match pipeline.store().count().await {
        Ok(n) => ("healthy", Some(n), None),
        Err(e) => {
            warn!(error = %e, "Health check could not count chunks");
            ("unhealthy", None, Some(e.to_string()))
        }
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        chunks,
        embedding_model: pipeline.embedding_model().to_string(),
        completion_backend: pipeline.completion().backend().name().to_string(),
        current_model: pipeline.models().current().key,
        mock_mode: pipeline.completion().is_offline(),
        error,
    })
}
