//! In-memory provider that replays scripted outcomes.
//!
//! Used by tests to drive conversations without a network, and by
//! `docchat chat --offline` (echo mode) to demonstrate the flow without
//! credentials.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use docchat_core::error::ApiError;
use docchat_core::message::Role;
use docchat_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

/// What to do once the script runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WhenExhausted {
    Fail,
    Echo,
}

/// A provider that returns queued responses in order and records every
/// request it receives.
pub struct ScriptedProvider {
    outcomes: Mutex<VecDeque<Result<ProviderResponse, ApiError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
    when_exhausted: WhenExhausted,
}

impl ScriptedProvider {
    pub fn new(outcomes: Vec<Result<ProviderResponse, ApiError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            requests: Mutex::new(Vec::new()),
            when_exhausted: WhenExhausted::Fail,
        }
    }

    /// Replies to every request by echoing the last user message.
    pub fn echo() -> Self {
        Self {
            when_exhausted: WhenExhausted::Echo,
            ..Self::new(Vec::new())
        }
    }

    /// Queue plain text replies, each with `total_tokens` usage.
    pub fn texts(replies: &[&str], total_tokens: u32) -> Self {
        Self::new(
            replies
                .iter()
                .map(|r| Ok(text_response(r, total_tokens)))
                .collect(),
        )
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn echo_response(request: &ProviderRequest) -> ProviderResponse {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        // Rough estimate: 4 chars per token.
        let prompt_tokens: u32 = request
            .messages
            .iter()
            .map(|m| (m.content.len() / 4) as u32)
            .sum();
        let text = format!("You said: {last_user}");
        let completion_tokens = (text.len() / 4) as u32;

        ProviderResponse {
            text,
            usage: Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            model: request.model.clone(),
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ApiError> {
        let next = self
            .outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        let outcome = match (next, self.when_exhausted) {
            (Some(outcome), _) => outcome,
            (None, WhenExhausted::Echo) => Ok(Self::echo_response(&request)),
            (None, WhenExhausted::Fail) => Err(ApiError::malformed(format!(
                "no scripted response left for call #{}",
                self.call_count() + 1
            ))),
        };

        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
        outcome
    }
}

/// A plain reply whose usage splits `total_tokens` between prompt and completion.
pub fn text_response(text: &str, total_tokens: u32) -> ProviderResponse {
    let completion_tokens = total_tokens / 4;
    ProviderResponse {
        text: text.to_string(),
        usage: Usage {
            prompt_tokens: total_tokens - completion_tokens,
            completion_tokens,
            total_tokens,
        },
        model: "scripted-model".into(),
    }
}
