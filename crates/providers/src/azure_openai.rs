//! Azure OpenAI chat-completion client.
//!
//! Requests go to
//! `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={version}`
//! with the key in an `api-key` header. The body carries the deployment name,
//! the full message list and `temperature: 0`.

use std::time::Duration;

use async_trait::async_trait;
use docchat_config::ServiceSettings;
use docchat_core::error::{ApiError, ApiErrorKind};
use docchat_core::message::Message;
use docchat_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A chat-completion client for an Azure-hosted deployment.
pub struct AzureOpenAiProvider {
    name: String,
    endpoint: String,
    api_key: String,
    api_version: String,
    client: reqwest::Client,
}

impl AzureOpenAiProvider {
    /// Create a new client. The timeout bounds each completion call.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: "azure-openai".into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_version: api_version.into(),
            client,
        })
    }

    /// Build from validated configuration.
    pub fn from_settings(settings: &ServiceSettings) -> Result<Self, ApiError> {
        Self::new(
            &settings.endpoint,
            &settings.api_key,
            &settings.api_version,
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    fn completions_url(&self, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, deployment, self.api_version
        )
    }

    /// Convert our Message types to the wire format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: Some(m.content.clone()),
            })
            .collect()
    }

    /// Pull a readable message out of an error body.
    ///
    /// The service answers with `{"error": {"message": "..."}}`; anything else
    /// is passed through as-is.
    fn error_detail(body: &str) -> String {
        serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|b| b.error.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| body.trim().to_string())
    }

    fn map_transport_error(e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::new(ApiErrorKind::Timeout, format!("Request timed out: {e}"))
        } else {
            ApiError::network(e.to_string())
        }
    }
}

#[async_trait]
impl docchat_core::Provider for AzureOpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ApiError> {
        let url = self.completions_url(&request.model);

        let body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
        });

        debug!(
            provider = %self.name,
            deployment = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status().as_u16();

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            let detail = Self::error_detail(&error_body);
            warn!(status, detail = %detail, "Completion service returned error");

            let kind = match status {
                429 => ApiErrorKind::RateLimited,
                401 | 403 => ApiErrorKind::Authentication,
                _ => ApiErrorKind::Rejected,
            };
            let detail = if detail.is_empty() {
                format!("HTTP {status}")
            } else {
                detail
            };
            return Err(ApiError::new(kind, detail).with_status(status));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ApiError::malformed(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::malformed("No choices in response"))?;

        let usage = match api_response.usage {
            Some(u) => Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            },
            None => {
                debug!("Response carried no usage block");
                Usage::default()
            }
        };

        Ok(ProviderResponse {
            text: choice.message.content.unwrap_or_default(),
            usage,
            model: api_response.model.unwrap_or(request.model),
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ApiError> {
        let url = format!(
            "{}/openai/models?api-version={}",
            self.endpoint, self.api_version
        );
        let response = self
            .client
            .get(&url)
            .header("api-key", &self.api_key)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        Ok(response.status().is_success())
    }
}

// --- Wire types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorPayload,
}

#[derive(Debug, Deserialize)]
struct ApiErrorPayload {
    #[serde(default)]
    message: Option<String>,
}
