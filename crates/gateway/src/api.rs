//! Chat, knowledge-base, model, cache, and conversation routes.

use std::convert::Infallible;

use axum::extract::{Multipart, Path, Query, State};
use axum::response::Json;
use axum::response::sse::{Event as SseEvent, Sse};
use jarvis_agent::{ChatReply, ChatRequest, IngestReceipt, ModelListing};
use jarvis_config::ModelPreset;
use jarvis_core::message::{ConversationId, Turn};
use jarvis_core::store::StoredChunk;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::SharedState;
use crate::error::ApiError;

const INSPECT_SAMPLE: usize = 5;

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// ── Chat ──────────────────────────────────────────────────────────────────

/// `POST /chat`
pub async fn chat_handler(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatReply> {
    Json(state.pipeline.chat(request).await)
}

/// `POST /chat/stream`: status events, then the reply, then `[DONE]`.
pub async fn chat_stream_handler(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>> {
    info!(mode = %request.mode, "Streaming chat request");
    let rx = state.pipeline.chat_stream(request);
    let stream =
        ReceiverStream::new(rx).map(|event| Ok(SseEvent::default().data(event.to_sse_data())));
    Sse::new(stream)
}

// ── Knowledge base ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub conversation_id: Option<ConversationId>,
}

/// `POST /upload-document`: multipart `file` field.
pub async fn upload_handler(
    State(state): State<SharedState>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Result<Json<IngestReceipt>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload.txt").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid upload: {e}")))?;

        let receipt = state
            .pipeline
            .ingestor()
            .ingest(&filename, &bytes, params.conversation_id.as_ref())
            .await?;
        return Ok(Json(receipt));
    }

    Err(ApiError::bad_request("No file provided"))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_chunks: usize,
}

/// `GET /knowledge-base/stats`
pub async fn stats_handler(State(state): State<SharedState>) -> Result<Json<StatsResponse>, ApiError> {
    let total_chunks = state.pipeline.store().count().await?;
    Ok(Json(StatsResponse { total_chunks }))
}

#[derive(Debug, Serialize)]
pub struct InspectResponse {
    pub total_chunks: usize,
    pub sample: Vec<StoredChunk>,
}

/// `GET /knowledge-base/inspect`: the first few stored chunks.
pub async fn inspect_handler(
    State(state): State<SharedState>,
) -> Result<Json<InspectResponse>, ApiError> {
    let store = state.pipeline.store();
    Ok(Json(InspectResponse {
        total_chunks: store.count().await?,
        sample: store.peek(INSPECT_SAMPLE).await?,
    }))
}

// ── Models & cache ────────────────────────────────────────────────────────

/// `GET /models`
pub async fn list_models_handler(State(state): State<SharedState>) -> Json<ModelListing> {
    Json(state.pipeline.models().listing())
}

#[derive(Debug, Serialize)]
pub struct SwitchModelResponse {
    pub message: String,
    pub config: ModelPreset,
}

/// `POST /models/{key}`
pub async fn switch_model_handler(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<Json<SwitchModelResponse>, ApiError> {
    let selected = state.pipeline.models().switch(&key)?;
    Ok(Json(SwitchModelResponse {
        message: format!("Switched to {key} model"),
        config: selected.preset,
    }))
}

/// `POST /cache/clear`
pub async fn clear_cache_handler(State(state): State<SharedState>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: state.pipeline.clear_caches(),
    })
}

// ── Conversations ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<Turn>,
}

/// `GET /conversation/{id}/history`: empty for unknown ids.
pub async fn history_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Json<HistoryResponse> {
    let messages = state.pipeline.sessions().history(&id.into()).await;
    Json(HistoryResponse { messages })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentsResponse {
    pub doc_ids: Vec<String>,
}

/// `GET /conversation/{id}/documents`
pub async fn documents_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Json<DocumentsResponse> {
    let doc_ids = state.pipeline.sessions().documents(&id.into()).await;
    Json(DocumentsResponse { doc_ids })
}

/// `DELETE /conversation/{id}`: history and document list; chunks stay.
pub async fn delete_conversation_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    if state.pipeline.sessions().delete(&id.clone().into()).await {
        info!(conversation_id = %id, "Conversation deleted");
        Ok(Json(MessageResponse {
            message: "Conversation deleted".into(),
        }))
    } else {
        Err(ApiError::not_found("Conversation not found"))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{app, test_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    const BOUNDARY: &str = "jarvis-test-boundary";

    fn upload_request(uri: &str, filename: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn upload_then_chat_cites_document() {
        let state = test_state();

        let response = app(&state)
            .oneshot(upload_request(
                "/upload-document?conversation_id=c-1",
                "greek.txt",
                "Alpha content.\n\nBeta content.",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let receipt = body_json(response).await;
        assert_eq!(receipt["chunks"], 2);
        assert_eq!(receipt["message"], "Document 'greek.txt' uploaded successfully");
        let doc_id = receipt["doc_id"].as_str().unwrap().to_string();

        let response = app(&state)
            .oneshot(empty_request("GET", "/conversation/c-1/documents"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["doc_ids"][0], doc_id);

        let response = app(&state)
            .oneshot(json_request(
                "POST",
                "/chat",
                serde_json::json!({
                    "message": "alpha",
                    "conversation_id": "c-1",
                    "session_doc_ids": [doc_id],
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let reply = body_json(response).await;
        assert_eq!(reply["conversation_id"], "c-1");
        assert_eq!(reply["sources"][0], "greek.txt");
        assert_eq!(reply["mode_used"], "mixed");
        assert_eq!(reply["model_used"], "ultra_fast");
        assert!(reply["response"].as_str().unwrap().contains("'alpha'"));
    }

    #[tokio::test]
    async fn upload_without_content_is_rejected() {
        let response = app(&test_state())
            .oneshot(upload_request("/upload-document", "blank.txt", "  \n\n "))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "No content found in the file");
        assert_eq!(json["code"], 400);
    }

    #[tokio::test]
    async fn unknown_mode_is_mixed() {
        let response = app(&test_state())
            .oneshot(json_request(
                "POST",
                "/chat",
                serde_json::json!({ "message": "hi", "mode": "creative" }),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["mode_used"], "mixed");
    }

    #[tokio::test]
    async fn null_mode_is_mixed() {
        let response = app(&test_state())
            .oneshot(json_request(
                "POST",
                "/chat",
                serde_json::json!({ "message": "hi", "mode": null }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["mode_used"], "mixed");
    }

    #[tokio::test]
    async fn stream_ends_with_done() {
        let response = app(&test_state())
            .oneshot(json_request(
                "POST",
                "/chat/stream",
                serde_json::json!({ "message": "stream please" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|ct| ct.starts_with("text/event-stream"))
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains(r#""type":"status""#));
        assert!(text.contains(r#""type":"response""#));
        assert!(text.trim_end().ends_with("data: [DONE]"));
    }

    #[tokio::test]
    async fn model_switching() {
        let state = test_state();

        let response = app(&state)
            .oneshot(empty_request("POST", "/models/quality"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Switched to quality model");
        assert_eq!(json["config"]["name"], "llama3");

        let response = app(&state).oneshot(empty_request("GET", "/models")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["current"], "quality");
        assert!(json["available"]["ultra_fast"].is_object());

        let response = app(&state)
            .oneshot(empty_request("POST", "/models/giant"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().starts_with("Model giant not available"));
    }

    #[tokio::test]
    async fn conversation_lifecycle() {
        let state = test_state();
        app(&state)
            .oneshot(json_request(
                "POST",
                "/chat",
                serde_json::json!({ "message": "remember me", "conversation_id": "c-9" }),
            ))
            .await
            .unwrap();

        let response = app(&state)
            .oneshot(empty_request("GET", "/conversation/c-9/history"))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][1]["role"], "assistant");

        let response = app(&state)
            .oneshot(empty_request("DELETE", "/conversation/c-9"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app(&state)
            .oneshot(empty_request("GET", "/conversation/c-9/history"))
            .await
            .unwrap();
        assert!(body_json(response).await["messages"].as_array().unwrap().is_empty());

        let response = app(&state)
            .oneshot(empty_request("DELETE", "/conversation/c-9"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Conversation not found");
    }

    #[tokio::test]
    async fn inspect_and_stats() {
        let state = test_state();
        app(&state)
            .oneshot(upload_request(
                "/upload-document",
                "lines.txt",
                "one\n\ntwo\n\nthree\n\nfour\n\nfive\n\nsix",
            ))
            .await
            .unwrap();

        let response = app(&state)
            .oneshot(empty_request("GET", "/knowledge-base/stats"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["total_chunks"], 6);

        let response = app(&state)
            .oneshot(empty_request("GET", "/knowledge-base/inspect"))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["total_chunks"], 6);
        assert_eq!(json["sample"].as_array().unwrap().len(), 5);
        assert_eq!(json["sample"][0]["text"], "one");
        assert_eq!(json["sample"][0]["metadata"]["filename"], "lines.txt");
    }

    #[tokio::test]
    async fn cache_clear_reports() {
        let response = app(&test_state())
            .oneshot(empty_request("POST", "/cache/clear"))
            .await
            .unwrap();
        let json: MessageResponse =
            serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(json.message, "Cleared 0 cached responses and embeddings");
    }
}
