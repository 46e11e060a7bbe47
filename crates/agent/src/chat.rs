//! The per-turn chat cycle.

use std::sync::Arc;

use docchat_core::document::Document;
use docchat_core::error::{ApiError, Error, Result};
use docchat_core::message::Message;
use docchat_core::prompt::build_user_message;
use docchat_core::provider::{Provider, ProviderRequest, Usage};
use docchat_core::session::{ConversationSession, Turn};
use docchat_telemetry::CostEstimator;
use tracing::{debug, info, warn};

/// Prefix of the assistant message shown when the completion call fails.
pub const API_ERROR_PREFIX: &str = "The API could not handle this content: ";

/// What one submitted turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The assistant message appended to the transcript
    pub reply: String,

    /// The user message as it was sent (document text merged, if any)
    pub sent_prompt: String,

    /// Usage reported by the service (zero on failure)
    pub usage: Usage,

    /// Estimated cost of this turn
    pub cost: f64,

    /// Set when the completion call failed and `reply` carries the error
    pub error: Option<ApiError>,
}

impl TurnOutcome {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Runs turns against one provider deployment.
///
/// Holds no conversation state: every call takes the session explicitly,
/// so one service can serve any number of independent sessions.
pub struct ChatService {
    /// The completion client
    provider: Arc<dyn Provider>,

    /// Deployment name sent with every request
    deployment: String,

    /// Token-to-cost conversion
    estimator: CostEstimator,
}

impl ChatService {
    pub fn new(
        provider: Arc<dyn Provider>,
        deployment: impl Into<String>,
        estimator: CostEstimator,
    ) -> Self {
        Self {
            provider,
            deployment: deployment.into(),
            estimator,
        }
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Process one user submission.
    ///
    /// 1. Merge document text into the prompt if it has not been merged yet
    /// 2. Send system prompt, history and the new message to the provider
    /// 3. Append the user and assistant messages plus the turn record
    /// 4. Add the turn's cost to the running total
    ///
    /// A failed completion call does not fail the turn: the error detail
    /// becomes the assistant message and the turn is recorded with zero
    /// usage.
    pub async fn submit(
        &self,
        session: &mut ConversationSession,
        user_text: &str,
        document: Option<&Document>,
    ) -> Result<TurnOutcome> {
        if user_text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }

        let document_text = document.filter(|d| !d.is_empty()).map(|d| d.text.as_str());
        if document_text.is_none() && session.is_document_merged() {
            debug!(session = %session.id(), "Document removed, clearing merge flag");
            session.clear_document_merged();
        }

        let assembled = build_user_message(user_text, document_text, session.is_document_merged());

        let mut messages = session.messages().to_vec();
        messages.push(Message::user(assembled.content.clone()));
        let request = ProviderRequest::new(self.deployment.clone(), messages);

        let (reply, usage, error) = match self.provider.complete(request).await {
            Ok(response) => (response.text, response.usage, None),
            Err(e) => {
                warn!(
                    session = %session.id(),
                    kind = ?e.kind,
                    error = %e,
                    "Completion call failed"
                );
                (format!("{API_ERROR_PREFIX}{e}"), Usage::default(), Some(e))
            }
        };

        if assembled.merged {
            session.mark_document_merged();
        }

        let cost = self.estimator.estimate(usage.total_tokens);
        session.append_turn(
            assembled.content.clone(),
            Turn::new(user_text, reply.clone(), self.deployment.clone(), usage, cost),
        );
        self.estimator.accumulate(session, cost);

        info!(
            session = %session.id(),
            user_input = %user_text,
            output = %reply,
            total_tokens = usage.total_tokens,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Turn completed"
        );

        Ok(TurnOutcome {
            reply,
            sent_prompt: assembled.content,
            usage,
            cost,
            error,
        })
    }
}
