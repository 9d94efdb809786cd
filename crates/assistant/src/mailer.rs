//! Outgoing mail seam.

use async_trait::async_trait;

use crate::error::AssistantError;
use crate::task::EmailMessage;

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Whether this mailer can deliver at all.
    fn is_configured(&self) -> bool;

    /// Deliver `message`, returning a delivery id.
    async fn send(&self, message: &EmailMessage) -> Result<String, AssistantError>;
}

/// A mailer with no transport. Every send is refused.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    fn is_configured(&self) -> bool {
        false
    }

    async fn send(&self, _message: &EmailMessage) -> Result<String, AssistantError> {
        Err(AssistantError::MailNotConfigured)
    }
}
