//! docchat CLI: the main entry point.
//!
//! Commands:
//! - `init`: Write a starter config file
//! - `chat`: Interactive chat (optionally over a document) or single-message mode
//! - `ping`: One fixed completion to check credentials and endpoint
//! - `config`: Show the effective configuration

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use docchat_config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "docchat",
    about = "docchat — chat with your documents",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.docchat/config.toml
    #[arg(short, long, global = true, env = "DOCCHAT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter configuration file
    Init,

    /// Chat with the model, optionally about a document
    Chat {
        /// Document whose text is merged into the first turn
        #[arg(short, long)]
        document: Option<PathBuf>,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Use a local echo provider instead of the remote service
        #[arg(long)]
        offline: bool,
    },

    /// Send one fixed request to verify connectivity
    Ping,

    /// Show the effective configuration (secrets redacted)
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));

    match cli.command {
        Commands::Init => {
            init_tracing(cli.verbose, None);
            commands::init::run(&config_path).await?;
        }
        Commands::Chat {
            document,
            message,
            offline,
        } => {
            let config = load_config(&config_path, cli.verbose)?;
            commands::chat::run(&config, document, message, offline).await?;
        }
        Commands::Ping => {
            let config = load_config(&config_path, cli.verbose)?;
            commands::ping::run(&config).await?;
        }
        Commands::Config => {
            let config = load_config(&config_path, cli.verbose)?;
            commands::config_cmd::show(&config, &config_path).await?;
        }
    }

    Ok(())
}

/// Load configuration, then start logging into its log directory.
fn load_config(path: &Path, verbose: bool) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::load_with(path).map_err(|e| format!("Failed to load config: {e}"))?;
    init_tracing(verbose, Some(&config));
    Ok(config)
}

/// Open `<log_directory>/app.log` for appending, creating the directory.
fn open_log_file(config: &AppConfig) -> std::io::Result<File> {
    std::fs::create_dir_all(&config.log_directory)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_file())
}

/// Log to `<log_directory>/app.log`, falling back to stderr when the file
/// cannot be opened.
fn init_tracing(verbose: bool, config: Option<&AppConfig>) {
    let filter = if verbose { "debug" } else { "info" };
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter))
    };

    let log_file = config.map(|c| (c.log_file(), open_log_file(c)));

    match log_file {
        Some((_, Ok(file))) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .init();
        }
        Some((path, Err(e))) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
            tracing::warn!(path = %path.display(), error = %e, "Cannot open log file, logging to stderr");
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
    }
}
