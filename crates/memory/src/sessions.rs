//! Session store: turn history and uploaded-document ids per conversation.
//!
//! A session springs into existence on its first turn or first document
//! upload and lives until [`SessionStore::delete`]. Deleting a session never
//! touches stored chunks.

use std::collections::HashMap;

use jarvis_core::message::{ConversationId, Turn};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default, Clone)]
struct Session {
    turns: Vec<Turn>,
    doc_ids: Vec<String>,
}

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<ConversationId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn and the assistant's reply as one step.
    pub async fn append_exchange(&self, id: &ConversationId, user: Turn, assistant: Turn) {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(id.clone()).or_default();
        session.turns.push(user);
        session.turns.push(assistant);
        debug!(conversation_id = %id, turns = session.turns.len(), "Recorded exchange");
    }

    /// Turns in insertion order; empty for unknown sessions.
    pub async fn history(&self, id: &ConversationId) -> Vec<Turn> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|s| s.turns.clone())
            .unwrap_or_default()
    }

    /// Record that `doc_id` was uploaded within this session.
    pub async fn track_document(&self, id: &ConversationId, doc_id: impl Into<String>) {
        let doc_id = doc_id.into();
        let mut sessions = self.sessions.write().await;
        let docs = &mut sessions.entry(id.clone()).or_default().doc_ids;
        if !docs.contains(&doc_id) {
            docs.push(doc_id);
        }
    }

    /// Document ids uploaded within this session; empty for unknown sessions.
    pub async fn documents(&self, id: &ConversationId) -> Vec<String> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|s| s.doc_ids.clone())
            .unwrap_or_default()
    }

    /// Remove a session's history and document list. Returns `false` when
    /// there was nothing to remove.
    pub async fn delete(&self, id: &ConversationId) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
