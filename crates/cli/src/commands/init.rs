//! `docchat init`: Write a starter config file.

use std::path::Path;

use docchat_config::AppConfig;

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("docchat — First-Time Setup");
    println!("==========================\n");

    if let Some(dir) = config_path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        }
    }

    if config_path.exists() {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run init.\n");
        return Ok(());
    }

    std::fs::write(config_path, AppConfig::default_toml())?;
    println!("✅ Created config at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Fill in api_key, endpoint, api_version and chat_deployment_name");
    println!("      (or export AZURE_OPENAI_KEY, AZURE_OPENAI_ENDPOINT, ...)");
    println!("   2. Run: docchat ping");
    println!("   3. Run: docchat chat --document <file>\n");

    Ok(())
}
