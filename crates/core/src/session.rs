//! The per-user Session Store.
//!
//! A [`ConversationSession`] owns the message list sent to the completion
//! service and one [`Turn`] record per completed exchange. Each user session
//! constructs its own instance; nothing here is global.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::message::Message;
use crate::provider::Usage;

/// File name offered for a conversation download.
pub const EXPORT_FILE_NAME: &str = "conversation.json";

/// Media type of a conversation download.
pub const EXPORT_MEDIA_TYPE: &str = "text/json";

/// Unique identifier for a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One user submission plus the resulting assistant reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// What the user typed, before any document merge
    pub input: String,

    /// The assistant reply, or the rendered error text
    pub output: String,

    /// Deployment name the turn was sent to
    pub model: String,

    /// Token usage reported for the turn (zero when the call failed)
    pub usage: Usage,

    /// Estimated cost of the turn
    pub cost: f64,

    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(
        input: impl Into<String>,
        output: impl Into<String>,
        model: impl Into<String>,
        usage: Usage,
        cost: f64,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            model: model.into(),
            usage,
            cost,
            timestamp: Utc::now(),
        }
    }
}

/// A downloadable rendering of the message list.
#[derive(Debug, Clone)]
pub struct ConversationExport {
    pub file_name: &'static str,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Conversation history and per-turn bookkeeping for one user session.
///
/// Invariants:
/// - `messages` starts with exactly one system message
/// - `messages.len() == 2 * turns.len() + 1`
/// - `total_cost` never decreases between resets
#[derive(Debug, Clone)]
pub struct ConversationSession {
    id: SessionId,
    system_prompt: String,
    messages: Vec<Message>,
    turns: Vec<Turn>,
    total_cost: f64,
    document_merged: bool,
}

impl ConversationSession {
    /// Create a session seeded with `system_prompt`.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            id: SessionId::new(),
            messages: vec![Message::system(system_prompt.clone())],
            system_prompt,
            turns: Vec::new(),
            total_cost: 0.0,
            document_merged: false,
        }
    }

    /// Empty every sequence, reseed the system message, zero the cost and
    /// clear the document merge flag.
    pub fn reset(&mut self, system_prompt: impl Into<String>) {
        self.system_prompt = system_prompt.into();
        self.messages.clear();
        self.messages.push(Message::system(self.system_prompt.clone()));
        self.turns.clear();
        self.total_cost = 0.0;
        self.document_merged = false;
        tracing::debug!(session = %self.id, "Session reset");
    }

    /// Record a finished turn.
    ///
    /// `sent_prompt` is the user message as it went over the wire (possibly
    /// carrying merged document text). Both messages and the turn record are
    /// pushed together.
    pub fn append_turn(&mut self, sent_prompt: impl Into<String>, turn: Turn) {
        let user = Message::user(sent_prompt);
        let assistant = Message::assistant(turn.output.clone());
        self.messages.reserve(2);
        self.messages.push(user);
        self.messages.push(assistant);
        self.turns.push(turn);
    }

    /// Add an estimated cost to the running total. Negative or non-finite
    /// values are ignored.
    pub fn add_cost(&mut self, cost: f64) {
        if cost.is_finite() && cost >= 0.0 {
            self.total_cost += cost;
        } else {
            tracing::warn!(cost, "Ignoring invalid turn cost");
        }
    }

    pub fn mark_document_merged(&mut self) {
        self.document_merged = true;
    }

    /// Called when the document is removed; the next document attached will
    /// be merged again.
    pub fn clear_document_merged(&mut self) {
        self.document_merged = false;
    }

    pub fn is_document_merged(&self) -> bool {
        self.document_merged
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Number of completed turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn past_inputs(&self) -> Vec<&str> {
        self.turns.iter().map(|t| t.input.as_str()).collect()
    }

    pub fn generated_outputs(&self) -> Vec<&str> {
        self.turns.iter().map(|t| t.output.as_str()).collect()
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.turns.iter().map(|t| t.model.as_str()).collect()
    }

    pub fn token_counts(&self) -> Vec<u32> {
        self.turns.iter().map(|t| t.usage.total_tokens).collect()
    }

    pub fn turn_costs(&self) -> Vec<f64> {
        self.turns.iter().map(|t| t.cost).collect()
    }

    /// Serialize `messages` as a JSON array of `{role, content}` objects.
    pub fn download_conversation(&self) -> Result<ConversationExport> {
        let bytes = serde_json::to_vec(&self.messages)?;
        Ok(ConversationExport {
            file_name: EXPORT_FILE_NAME,
            media_type: EXPORT_MEDIA_TYPE,
            bytes,
        })
    }
}
