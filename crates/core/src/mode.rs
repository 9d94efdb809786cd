//! Answer-generation mode.

use serde::{Deserialize, Deserializer, Serialize};

/// Selects whether an answer is grounded in retrieved documents, in the
/// model's general knowledge, or in both.
///
/// Parsing never fails: unrecognised values and `null` map to
/// [`ChatMode::Mixed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    /// Answer only from uploaded document content.
    ContextOnly,
    /// Ignore documents and answer from general knowledge.
    GeneralOnly,
    /// Combine documents with general knowledge.
    #[default]
    Mixed,
}

impl ChatMode {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "context_only" => ChatMode::ContextOnly,
            "general_only" => ChatMode::GeneralOnly,
            _ => ChatMode::Mixed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::ContextOnly => "context_only",
            ChatMode::GeneralOnly => "general_only",
            ChatMode::Mixed => "mixed",
        }
    }

    /// Whether this mode needs document retrieval at all.
    pub fn uses_documents(&self) -> bool {
        !matches!(self, ChatMode::GeneralOnly)
    }
}

impl std::fmt::Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChatMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ChatMode::parse(s))
    }
}

impl<'de> Deserialize<'de> for ChatMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(ChatMode::parse).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes() {
        assert_eq!(ChatMode::parse("context_only"), ChatMode::ContextOnly);
        assert_eq!(ChatMode::parse("general_only"), ChatMode::GeneralOnly);
        assert_eq!(ChatMode::parse("mixed"), ChatMode::Mixed);
        assert_eq!(ChatMode::parse(" Context_Only "), ChatMode::ContextOnly);
    }

    #[test]
    fn unknown_mode_falls_back_to_mixed() {
        assert_eq!(ChatMode::parse("creative"), ChatMode::Mixed);
        assert_eq!(ChatMode::parse(""), ChatMode::Mixed);
    }

    #[test]
    fn deserializes_leniently() {
        let mode: ChatMode = serde_json::from_str("\"whatever\"").unwrap();
        assert_eq!(mode, ChatMode::Mixed);
        let mode: ChatMode = serde_json::from_str("\"general_only\"").unwrap();
        assert_eq!(mode, ChatMode::GeneralOnly);
    }

    #[test]
    fn null_mode_is_mixed() {
        let mode: ChatMode = serde_json::from_str("null").unwrap();
        assert_eq!(mode, ChatMode::Mixed);
    }

    #[test]
    fn retrieval_skipped_only_for_general() {
        assert!(ChatMode::Mixed.uses_documents());
        assert!(ChatMode::ContextOnly.uses_documents());
        assert!(!ChatMode::GeneralOnly.uses_documents());
    }
}
