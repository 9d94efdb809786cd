//! Mode-specific prompt composition.

use jarvis_core::ChatMode;

/// Sent instead of a composed prompt when context-only mode has no context.
pub const NO_DOCUMENT_NOTICE: &str =
    "I don't have any document content to answer your question. Please upload a document first.";

/// Build the exact text sent to the completion backend.
pub fn compose(message: &str, context: &str, mode: ChatMode) -> String {
    let has_context = !context.trim().is_empty();

    match mode {
        ChatMode::ContextOnly if has_context => format!(
            "Answer the question using ONLY the provided document content. \
             Do not use any external knowledge.\n\n\
             DOCUMENT CONTENT:\n{context}\n\n\
             USER QUESTION: {message}\n\n\
             Answer using only the information above:"
        ),
        ChatMode::ContextOnly => NO_DOCUMENT_NOTICE.to_string(),
        ChatMode::GeneralOnly => format!(
            "Answer the question using your general knowledge. \
             Ignore any document context.\n\n\
             USER QUESTION: {message}\n\n\
             Answer:"
        ),
        ChatMode::Mixed if has_context => format!(
            "Answer the question using both the provided document content and your \
             general knowledge for a comprehensive response.\n\n\
             DOCUMENT CONTENT:\n{context}\n\n\
             USER QUESTION: {message}\n\n\
             Please provide a comprehensive answer combining the document information \
             with relevant general knowledge:"
        ),
        ChatMode::Mixed => format!("Question: {message}\n\nAnswer:"),
    }
}
