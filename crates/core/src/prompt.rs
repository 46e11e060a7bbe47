//! Prompt assembly: folds uploaded document text into the first user turn.
//!
//! Document context is injected at most once per session. Later turns pass
//! through untouched and rely on the merged turn staying in the history.

/// Literal prefix placed before injected document text.
pub const DOCUMENT_PREFIX: &str = "Here is the information from PDF file: ";

/// The outcome of assembling one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    /// Text to send as the user message
    pub content: String,

    /// True when document text was merged into `content` by this call,
    /// meaning the caller should set its merge flag.
    pub merged: bool,
}

/// Build the outbound user message.
///
/// Merges `document_text` ahead of `raw_user_text` only when the document is
/// non-empty and nothing has been merged yet.
pub fn build_user_message(
    raw_user_text: &str,
    document_text: Option<&str>,
    already_merged: bool,
) -> AssembledPrompt {
    match document_text {
        Some(doc) if !doc.is_empty() && !already_merged => AssembledPrompt {
            content: format!("{DOCUMENT_PREFIX}{doc}\n\n{raw_user_text}"),
            merged: true,
        },
        _ => AssembledPrompt {
            content: raw_user_text.to_string(),
            merged: false,
        },
    }
}
