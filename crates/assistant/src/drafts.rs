//! In-memory email drafts.
//!
//! Ids are decimal strings counting up from "1" and are never reused, even
//! after a draft is deleted.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::AssistantError;
use crate::mailer::Mailer;
use crate::task::EmailMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    Draft,
    Sent,
}

#[derive(Debug, Clone, Serialize)]
pub struct Draft {
    pub id: String,
    #[serde(flatten)]
    pub message: EmailMessage,
    pub status: DraftStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Drafts {
    next_id: u64,
    by_id: BTreeMap<u64, Draft>,
}

/// Drafts plus the mailer that sends them.
pub struct DraftStore {
    drafts: RwLock<Drafts>,
    mailer: Arc<dyn Mailer>,
}

impl DraftStore {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self {
            drafts: RwLock::new(Drafts::default()),
            mailer,
        }
    }

    pub fn mailer(&self) -> &Arc<dyn Mailer> {
        &self.mailer
    }

    pub async fn create(&self, message: EmailMessage) -> Draft {
        let mut drafts = self.drafts.write().await;
        drafts.next_id += 1;
        let id = drafts.next_id;
        let draft = Draft {
            id: id.to_string(),
            message,
            status: DraftStatus::Draft,
            created_at: Utc::now(),
        };
        drafts.by_id.insert(id, draft.clone());
        info!(draft_id = id, to = %draft.message.to, "Draft created");
        draft
    }

    /// All drafts in creation order.
    pub async fn list(&self) -> Vec<Draft> {
        self.drafts.read().await.by_id.values().cloned().collect()
    }

    pub async fn get(&self, id: &str) -> Result<Draft, AssistantError> {
        let key = parse_id(id)?;
        self.drafts
            .read()
            .await
            .by_id
            .get(&key)
            .cloned()
            .ok_or(AssistantError::DraftNotFound)
    }

    /// Send a draft through the mailer and mark it sent.
    pub async fn send(&self, id: &str) -> Result<(Draft, String), AssistantError> {
        let key = parse_id(id)?;
        let draft = self.get(id).await?;
        let delivery_id = self.mailer.send(&draft.message).await?;

        let mut drafts = self.drafts.write().await;
        let stored = drafts
            .by_id
            .get_mut(&key)
            .ok_or(AssistantError::DraftNotFound)?;
        stored.status = DraftStatus::Sent;
        info!(draft_id = key, delivery_id = %delivery_id, "Draft sent");
        Ok((stored.clone(), delivery_id))
    }

    pub async fn delete(&self, id: &str) -> Result<(), AssistantError> {
        let key = parse_id(id)?;
        self.drafts
            .write()
            .await
            .by_id
            .remove(&key)
            .map(|_| ())
            .ok_or(AssistantError::DraftNotFound)
    }
}

fn parse_id(id: &str) -> Result<u64, AssistantError> {
    id.trim().parse().map_err(|_| AssistantError::DraftNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::DisabledMailer;
    use async_trait::async_trait;

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            to: to.into(),
            subject: "Hi".into(),
            body: "Hello".into(),
            cc: None,
            bcc: None,
        }
    }

    struct RecordingMailer;

    #[async_trait]
    impl Mailer for RecordingMailer {
        fn is_configured(&self) -> bool {
            true
        }

        async fn send(&self, message: &EmailMessage) -> Result<String, AssistantError> {
            Ok(format!("msg-{}", message.to))
        }
    }

    #[tokio::test]
    async fn ids_count_up_and_are_not_reused() {
        let store = DraftStore::new(Arc::new(DisabledMailer));
        assert_eq!(store.create(message("a@x.io")).await.id, "1");
        assert_eq!(store.create(message("b@x.io")).await.id, "2");
        store.delete("2").await.unwrap();
        assert_eq!(store.create(message("c@x.io")).await.id, "3");

        let ids: Vec<_> = store.list().await.into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = DraftStore::new(Arc::new(DisabledMailer));
        assert_eq!(store.get("7").await.unwrap_err(), AssistantError::DraftNotFound);
        assert_eq!(store.delete("abc").await.unwrap_err(), AssistantError::DraftNotFound);
        assert_eq!(store.send("1").await.unwrap_err(), AssistantError::DraftNotFound);
    }

    #[tokio::test]
    async fn disabled_mailer_refuses_and_draft_stays() {
        let store = DraftStore::new(Arc::new(DisabledMailer));
        let draft = store.create(message("a@x.io")).await;
        let err = store.send(&draft.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Email service not configured");
        assert_eq!(store.get(&draft.id).await.unwrap().status, DraftStatus::Draft);
    }

    #[tokio::test]
    async fn sending_marks_sent() {
        let store = DraftStore::new(Arc::new(RecordingMailer));
        let draft = store.create(message("a@x.io")).await;
        let (sent, delivery) = store.send(&draft.id).await.unwrap();
        assert_eq!(sent.status, DraftStatus::Sent);
        assert_eq!(delivery, "msg-a@x.io");
    }

    #[tokio::test]
    async fn draft_serializes_flat() {
        let store = DraftStore::new(Arc::new(DisabledMailer));
        let draft = store.create(message("a@x.io")).await;
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["to"], "a@x.io");
        assert_eq!(json["status"], "draft");
    }
}
