//! `docchat ping`: Send one fixed request and print the raw response.

use docchat_config::AppConfig;
use docchat_core::message::Message;
use docchat_core::provider::{Provider, ProviderRequest};
use docchat_providers::AzureOpenAiProvider;

/// The fixed request used to check connectivity.
pub fn ping_request(deployment: &str) -> ProviderRequest {
    ProviderRequest::new(
        deployment,
        vec![
            Message::system("Assistant is a large language model trained by OpenAI."),
            Message::user("Who were the founders of Microsoft?"),
        ],
    )
}

pub async fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let settings = config.service_settings()?;
    let provider = AzureOpenAiProvider::from_settings(&settings)?;

    match provider.health_check().await {
        Ok(true) => tracing::debug!("Health check passed"),
        Ok(false) => tracing::warn!("Health check returned a non-success status"),
        Err(e) => tracing::warn!(error = %e, "Health check failed"),
    }

    let response = provider
        .complete(ping_request(&settings.chat_deployment_name))
        .await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    println!("{}", response.text);
    Ok(())
}
