//! Personal-assistant email features for Jarvis.
//!
//! - [`parse_task`] turns a sentence like "send an email to ... about ..."
//!   into an [`EmailTask`] using keyword rules.
//! - [`DraftStore`] keeps drafts in memory and sends them through a
//!   [`Mailer`]. Without a configured transport, [`DisabledMailer`] refuses
//!   every send.

pub mod drafts;
pub mod error;
pub mod mailer;
pub mod task;

pub use drafts::{Draft, DraftStatus, DraftStore};
pub use error::AssistantError;
pub use mailer::{DisabledMailer, Mailer};
pub use task::{EXAMPLE_TASKS, EmailAction, EmailMessage, EmailTask, parse_task};
