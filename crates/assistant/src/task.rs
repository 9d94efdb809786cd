//! Rule-based parsing of natural-language email tasks.
//!
//! "Send an email to john@example.com confirming our meeting tomorrow"
//! becomes a send action to john@example.com with the subject
//! "Meeting Confirmation" and a short templated body. No language model is
//! involved: keyword rules only.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AssistantError;

const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";
const MIN_TASK_CHARS: usize = 10;
const SIGN_OFF: &str = "Best regards";

/// Sample task descriptions shown to users.
pub const EXAMPLE_TASKS: [&str; 5] = [
    "Send an email to john@example.com confirming our meeting tomorrow at 2 PM",
    "Draft an email to sarah@company.com about the project deadline extension",
    "Send a thank you email to alex@client.com for the presentation feedback",
    "Email the team at team@company.com about the Q4 results and next quarter planning",
    "Draft an email to manager@company.com requesting a meeting",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailAction {
    Draft,
    Send,
}

impl EmailAction {
    fn label(&self) -> &'static str {
        match self {
            EmailAction::Draft => "Draft",
            EmailAction::Send => "Send",
        }
    }
}

/// An outgoing email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub cc: Option<String>,
    #[serde(default)]
    pub bcc: Option<String>,
}

/// What a task description was understood to mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailTask {
    pub interpretation: String,
    pub action: EmailAction,
    pub email_data: EmailMessage,
}

pub fn parse_task(description: &str) -> Result<EmailTask, AssistantError> {
    if description.trim().chars().count() < MIN_TASK_CHARS {
        return Err(AssistantError::InvalidTask(
            "Task description is too short. Please provide more details.".into(),
        ));
    }

    let lower = description.to_lowercase();
    let action = if lower.contains("send") && !lower.contains("draft") {
        EmailAction::Send
    } else {
        EmailAction::Draft
    };

    let to = find_email(description).ok_or_else(|| {
        AssistantError::InvalidTask(
            "Could not find a valid email address in your task. \
             Please include the recipient's email address."
                .into(),
        )
    })?;

    let subject = subject_for(description, &lower);
    let body = body_for(description, &lower);

    Ok(EmailTask {
        interpretation: format!("{} email to {to} about '{subject}'", action.label()),
        action,
        email_data: EmailMessage {
            to,
            subject,
            body,
            cc: None,
            bcc: None,
        },
    })
}

/// The first email address in `text`.
pub fn find_email(text: &str) -> Option<String> {
    let re = Regex::new(EMAIL_PATTERN).ok()?;
    re.find(text).map(|m| m.as_str().to_string())
}

fn subject_for(description: &str, lower: &str) -> String {
    let subject = if let Some(topic) = topic_after(description, lower, "about") {
        topic
    } else if lower.contains("confirming") {
        "Meeting Confirmation".to_string()
    } else if let Some(topic) = topic_after(description, lower, "regarding") {
        topic
    } else if lower.contains("thank") {
        "Thank You".to_string()
    } else {
        description
            .split_whitespace()
            .filter(|w| w.chars().count() > 4 && !w.contains('@'))
            .take(3)
            .collect::<Vec<_>>()
            .join(" ")
    };

    if subject.is_empty() {
        "Important Message".to_string()
    } else {
        capitalize_words(&subject)
    }
}

fn body_for(description: &str, lower: &str) -> String {
    let middle = if let Some(rest) = rest_after(lower, "confirming") {
        format!(
            "I wanted to confirm {}.\n\nPlease let me know if you have any questions.",
            trim_clause(rest)
        )
    } else if lower.contains("thank") {
        let reason = lower
            .find("thank")
            .and_then(|at| rest_after(&lower[at..], "for"))
            .map(trim_clause)
            .filter(|r| !r.is_empty())
            .unwrap_or("your help");
        format!("Thank you for {reason}.\n\nI really appreciate your help.")
    } else if let Some(topic) =
        rest_after(lower, "about").or_else(|| rest_after(lower, "regarding"))
    {
        format!(
            "I wanted to reach out regarding {}.\n\nPlease let me know your thoughts.",
            trim_clause(topic)
        )
    } else {
        description.trim().to_string()
    };

    format!("Hello,\n\n{middle}\n\n{SIGN_OFF}")
}

/// The text following the first whole-word `keyword`, if any.
fn rest_after<'a>(lower: &'a str, keyword: &str) -> Option<&'a str> {
    let mut start = 0;
    while let Some(pos) = lower[start..].find(keyword) {
        let at = start + pos;
        let end = at + keyword.len();
        let before_ok = lower[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = lower[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return Some(&lower[end..]);
        }
        start = end;
    }
    None
}

/// Subject text after `keyword`, cut at the first sentence break or "and".
/// Uses the original casing of `description`.
fn topic_after(description: &str, lower: &str, keyword: &str) -> Option<String> {
    let rest = rest_after(lower, keyword)?;
    // Lowercasing can change byte lengths for non-ASCII text.
    let offset = lower.len() - rest.len();
    let original = if description.len() == lower.len() {
        description.get(offset..).unwrap_or(rest)
    } else {
        rest
    };
    let topic = trim_clause(original);
    (!topic.is_empty()).then(|| topic.to_string())
}

fn trim_clause(text: &str) -> &str {
    let mut end = text.len();
    if let Some(pos) = text.find(['.', ',', '!', '?', ';', '\n']) {
        end = end.min(pos);
    }
    if let Some(pos) = text.to_lowercase().find(" and ") {
        end = end.min(pos);
    }
    text.get(..end).unwrap_or(text).trim()
}

fn capitalize_words(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
