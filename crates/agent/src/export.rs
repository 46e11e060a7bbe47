//! Writing and reading conversation downloads.

use std::path::{Path, PathBuf};

use docchat_core::error::Result;
use docchat_core::message::Message;
use docchat_core::session::ConversationSession;

/// Write the session's download to `path`.
///
/// When `path` is an existing directory the file is named
/// `conversation.json` inside it. Returns the path written.
pub fn export_to_path(session: &ConversationSession, path: &Path) -> Result<PathBuf> {
    let export = session.download_conversation()?;
    let target = if path.is_dir() {
        path.join(export.file_name)
    } else {
        path.to_path_buf()
    };

    std::fs::write(&target, &export.bytes)?;
    tracing::info!(
        session = %session.id(),
        path = %target.display(),
        messages = session.messages().len(),
        "Conversation exported"
    );
    Ok(target)
}

/// Parse a previously downloaded conversation.
pub fn import_messages(bytes: &[u8]) -> Result<Vec<Message>> {
    Ok(serde_json::from_slice(bytes)?)
}
