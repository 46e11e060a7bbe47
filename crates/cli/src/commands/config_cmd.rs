//! `docchat config`: Show the effective configuration.

use std::path::Path;

use docchat_config::AppConfig;

fn or_unset(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(not set)")
}

pub async fn show(config: &AppConfig, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Configuration");
    println!("─────────────────────────────────────");
    println!("  File:         {}", path.display());
    println!(
        "  API key:      {}",
        if config.has_api_key() { "[REDACTED]" } else { "(not set)" }
    );
    println!("  API version:  {}", or_unset(&config.api_version));
    println!("  Endpoint:     {}", or_unset(&config.endpoint));
    println!("  Deployment:   {}", or_unset(&config.chat_deployment_name));
    println!("  Rate:         ${} per 1000 tokens", config.cost_per_1k_tokens);
    println!("  Timeout:      {}s", config.request_timeout_secs);
    println!("  Log file:     {}", config.log_file().display());
    println!();
    println!("  System prompt:");
    for line in config.system_prompt.lines() {
        println!("    {line}");
    }
    println!();

    match config.service_settings() {
        Ok(_) => println!("  ✅ Ready to chat"),
        Err(e) => println!("  ⚠️  {e}"),
    }

    Ok(())
}
