//! Provider trait: the abstraction over the chat-completion service.
//!
//! A Provider knows how to send the full message list to a hosted model and
//! get a single reply back together with token usage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ApiError;
use crate::message::Message;

/// A single completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The deployment (model) name to route the request to
    pub model: String,

    /// System prompt, every prior turn, and the new user message
    pub messages: Vec<Message>,

    /// Sampling temperature (0.0 = deterministic preference)
    #[serde(default)]
    pub temperature: f32,
}

impl ProviderRequest {
    /// Build a request with temperature fixed at zero.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 0.0,
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated reply text
    pub text: String,

    /// Token usage; zero when the service omitted it
    pub usage: Usage,

    /// Which model actually responded (may differ from the deployment name)
    pub model: String,
}

/// The core Provider trait.
///
/// The chat service calls `complete()` without knowing which backend is in
/// use. No retries happen at this layer.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "azure-openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ApiError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ApiError> {
        Ok(true)
    }
}
