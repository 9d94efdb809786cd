use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AssistantError {
    /// The task description could not be turned into an email.
    #[error("{0}")]
    InvalidTask(String),

    #[error("Draft not found")]
    DraftNotFound,

    #[error("Email service not configured")]
    MailNotConfigured,

    #[error("Failed to send email: {0}")]
    Delivery(String),
}

impl AssistantError {
    /// Whether the caller supplied something unusable (400) rather than
    /// asking for something that is missing (404).
    pub fn is_bad_request(&self) -> bool {
        !matches!(self, AssistantError::DraftNotFound)
    }
}
