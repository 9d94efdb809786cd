//! Streaming chat events.
//!
//! `ChatStreamEvent` is what the pipeline sends while a streamed chat runs.
//! The gateway forwards each one as an SSE `data:` line.

use jarvis_core::ConversationId;
use serde::Serialize;

use crate::pipeline::ChatReply;

/// Events emitted during a streamed chat, in order:
/// - `status`  : a pipeline stage completed (zero or more)
/// - `response`: the final reply
/// - `error`   : the pipeline failed instead of replying
/// - `done`    : end of stream, always last
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatStreamEvent {
    /// Progress notice. The first one carries the conversation id.
    Status {
        step: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        conversation_id: Option<ConversationId>,
    },

    /// The final reply.
    Response(ChatReply),

    /// The pipeline failed.
    Error { error: String },

    /// End-of-stream sentinel.
    Done,
}

impl ChatStreamEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Response(_) => "response",
            Self::Error { .. } => "error",
            Self::Done => "done",
        }
    }

    /// The SSE `data:` payload: JSON, or the literal `[DONE]` sentinel.
    pub fn to_sse_data(&self) -> String {
        match self {
            Self::Done => "[DONE]".to_string(),
            event => serde_json::to_string(event).unwrap_or_else(|e| {
                serde_json::json!({ "type": "error", "error": e.to_string() }).to_string()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarvis_core::ChatMode;

    #[test]
    fn status_serialization() {
        let event = ChatStreamEvent::Status {
            step: "Creating optimized prompt".into(),
            conversation_id: None,
        };
        let json = event.to_sse_data();
        assert!(json.contains(r#""type":"status""#));
        assert!(json.contains(r#""step":"Creating optimized prompt""#));
        assert!(!json.contains("conversation_id"));
    }

    #[test]
    fn first_status_carries_conversation_id() {
        let event = ChatStreamEvent::Status {
            step: "Starting".into(),
            conversation_id: Some(ConversationId::from("c-1")),
        };
        assert!(event.to_sse_data().contains(r#""conversation_id":"c-1""#));
    }

    #[test]
    fn response_fields_are_inlined() {
        let event = ChatStreamEvent::Response(ChatReply {
            response: "hello".into(),
            conversation_id: ConversationId::from("c-1"),
            sources: vec!["a.txt".into()],
            mode_used: ChatMode::GeneralOnly,
            model_used: "fast".into(),
            processing_steps: vec![],
        });
        let value: serde_json::Value = serde_json::from_str(&event.to_sse_data()).unwrap();
        assert_eq!(value["type"], "response");
        assert_eq!(value["response"], "hello");
        assert_eq!(value["mode_used"], "general_only");
        assert_eq!(value["sources"][0], "a.txt");
    }

    #[test]
    fn error_serialization() {
        let event = ChatStreamEvent::Error {
            error: "task panicked".into(),
        };
        assert_eq!(event.event_type(), "error");
        assert_eq!(event.to_sse_data(), r#"{"type":"error","error":"task panicked"}"#);
    }

    #[test]
    fn done_is_sentinel() {
        assert_eq!(ChatStreamEvent::Done.to_sse_data(), "[DONE]");
        assert_eq!(ChatStreamEvent::Done.event_type(), "done");
    }
}
