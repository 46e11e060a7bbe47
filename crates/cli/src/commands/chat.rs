//! `docchat chat`: Interactive or single-message chat, optionally over a document.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docchat_agent::{ChatService, export_to_path};
use docchat_config::AppConfig;
use docchat_core::document::{Document, PlainTextExtractor};
use docchat_core::provider::Provider;
use docchat_core::session::{ConversationSession, EXPORT_FILE_NAME};
use docchat_providers::{AzureOpenAiProvider, ScriptedProvider};
use docchat_telemetry::{CostEstimator, CostSummary, format_cost};
use tokio::io::{self, AsyncBufReadExt, BufReader};

/// One line of user input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Exit,
    Message(String),
    Command(ChatCommand),
}

/// Slash commands understood by the interactive loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Reset,
    Export(Option<PathBuf>),
    Cost,
    History,
    Document(PathBuf),
    Detach,
    Prompt(String),
    Help,
    Unknown(String),
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }

    if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
        return Input::Exit;
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Input::Message(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match (name, arg) {
        ("reset" | "clear", _) => ChatCommand::Reset,
        ("export", "") => ChatCommand::Export(None),
        ("export", path) => ChatCommand::Export(Some(PathBuf::from(path))),
        ("cost", _) => ChatCommand::Cost,
        ("history", _) => ChatCommand::History,
        ("document", path) if !path.is_empty() => ChatCommand::Document(PathBuf::from(path)),
        ("detach", _) => ChatCommand::Detach,
        ("prompt", text) if !text.is_empty() => ChatCommand::Prompt(text.to_string()),
        ("help", _) => ChatCommand::Help,
        _ => ChatCommand::Unknown(line.to_string()),
    };
    Input::Command(command)
}

/// The line shown under the transcript.
pub fn cost_line(session: &ConversationSession) -> String {
    format!(
        "Total cost of this conversation: {}",
        format_cost(session.total_cost())
    )
}

/// Render every completed turn as a `You` / `Assistant` pair.
pub fn render_history(session: &ConversationSession) -> String {
    let mut out = String::new();
    for turn in session.turns() {
        out.push_str(&render_block("You", &turn.input));
        out.push_str(&render_block("Assistant", &turn.output));
    }
    out
}

fn render_block(speaker: &str, text: &str) -> String {
    if text.is_empty() {
        return format!("  {speaker} >\n");
    }
    let mut out = String::new();
    for line in text.lines() {
        out.push_str(&format!("  {speaker} > {line}\n"));
    }
    out
}

fn load_document(path: &Path) -> Option<Document> {
    match Document::load(path, &PlainTextExtractor) {
        Ok(doc) => Some(doc),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Document extraction failed");
            eprintln!("  [Document Error] {e}");
            None
        }
    }
}

fn build_service(config: &AppConfig, offline: bool) -> Result<ChatService, Box<dyn std::error::Error>> {
    let estimator = CostEstimator::new(config.cost_per_1k_tokens)?;

    let (provider, deployment): (Arc<dyn Provider>, String) = if offline {
        let deployment = config
            .chat_deployment_name
            .clone()
            .unwrap_or_else(|| "offline".into());
        (Arc::new(ScriptedProvider::echo()), deployment)
    } else {
        let settings = config.service_settings().map_err(|e| {
            format!(
                "{e}. Set it in {} or via the AZURE_OPENAI_* environment variables",
                AppConfig::config_dir().join("config.toml").display()
            )
        })?;
        let provider = AzureOpenAiProvider::from_settings(&settings)?;
        (Arc::new(provider), settings.chat_deployment_name)
    };

    Ok(ChatService::new(provider, deployment, estimator))
}

pub async fn run(
    config: &AppConfig,
    document: Option<PathBuf>,
    message: Option<String>,
    offline: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = build_service(config, offline)?;
    let mut document = document.as_deref().and_then(load_document);
    let mut system_prompt = config.system_prompt.clone();
    let mut session = ConversationSession::new(system_prompt.clone());

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let outcome = service.submit(&mut session, &msg, document.as_ref()).await?;
        eprint!("\r              \r");
        println!("{}", outcome.reply);
        eprintln!("{}", cost_line(&session));
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║      docchat: Chat with your document        ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:   {}", service.provider_name());
    println!("  Deployment: {}", service.deployment());
    match &document {
        Some(doc) => println!("  Document:   {} ({} chars)", doc.name, doc.text.len()),
        None => println!("  Document:   none (attach with /document <path>)"),
    }
    println!("  {}", cost_line(&session));
    println!();
    println!("  Type your message and press Enter. /help lists commands.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Input::Empty => {}
            Input::Exit => break,
            Input::Message(text) => {
                eprint!("  ...");
                let outcome = service.submit(&mut session, &text, document.as_ref()).await?;
                eprint!("\r     \r");
                println!();
                if outcome.is_error() {
                    eprintln!("  [API Error] {}", outcome.reply);
                }
                print!("{}", render_block("Assistant", &outcome.reply));
                println!();
                println!("  {}", cost_line(&session));
                println!();
            }
            Input::Command(command) => {
                handle_command(command, &mut session, &mut document, &mut system_prompt);
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

fn handle_command(
    command: ChatCommand,
    session: &mut ConversationSession,
    document: &mut Option<Document>,
    system_prompt: &mut String,
) {
    match command {
        ChatCommand::Reset => {
            session.reset(system_prompt.clone());
            println!("  Conversation cleared. {}", cost_line(session));
        }
        ChatCommand::Export(path) => {
            let path = path.unwrap_or_else(|| PathBuf::from(EXPORT_FILE_NAME));
            match export_to_path(session, &path) {
                Ok(written) => println!("  Saved {} messages to {}", session.messages().len(), written.display()),
                Err(e) => eprintln!("  [Export Error] {e}"),
            }
        }
        ChatCommand::Cost => {
            let summary = CostSummary::of(session);
            println!("  Turns:  {}", summary.turns);
            println!("  Tokens: {}", summary.total_tokens);
            println!("  {}", cost_line(session));
        }
        ChatCommand::History => {
            if session.is_empty() {
                println!("  (no turns yet)");
            } else {
                print!("{}", render_history(session));
            }
        }
        ChatCommand::Document(path) => {
            if let Some(doc) = load_document(&path) {
                session.clear_document_merged();
                println!("  Attached {} ({} chars)", doc.name, doc.text.len());
                *document = Some(doc);
            }
        }
        ChatCommand::Detach => match document.take() {
            Some(doc) => {
                session.clear_document_merged();
                println!("  Detached {}", doc.name);
            }
            None => println!("  No document attached"),
        },
        ChatCommand::Prompt(text) => {
            *system_prompt = text;
            session.reset(system_prompt.clone());
            println!("  System prompt updated; conversation restarted.");
        }
        ChatCommand::Help => {
            println!("  /reset            clear the conversation and cost");
            println!("  /export [path]    save messages as JSON (default {EXPORT_FILE_NAME})");
            println!("  /cost             show token and cost totals");
            println!("  /history          show the transcript");
            println!("  /document <path>  attach a document");
            println!("  /detach           remove the attached document");
            println!("  /prompt <text>    replace the system prompt and restart");
            println!("  exit              quit");
        }
        ChatCommand::Unknown(raw) => {
            eprintln!("  Unknown command: {raw} (try /help)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_core::provider::Usage;
    use docchat_core::session::Turn;

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(parse_input("  Summarize.  "), Input::Message("Summarize.".into()));
        assert_eq!(parse_input("   "), Input::Empty);
        assert_eq!(parse_input("quit"), Input::Exit);
    }

    #[test]
    fn slash_commands_parse() {
        assert_eq!(parse_input("/reset"), Input::Command(ChatCommand::Reset));
        assert_eq!(parse_input("/export"), Input::Command(ChatCommand::Export(None)));
        assert_eq!(
            parse_input("/export out/chat.json"),
            Input::Command(ChatCommand::Export(Some(PathBuf::from("out/chat.json"))))
        );
        assert_eq!(
            parse_input("/document report.txt"),
            Input::Command(ChatCommand::Document(PathBuf::from("report.txt")))
        );
        assert_eq!(
            parse_input("/prompt Be terse."),
            Input::Command(ChatCommand::Prompt("Be terse.".into()))
        );
    }

    #[test]
    fn commands_missing_arguments_are_unknown() {
        assert!(matches!(
            parse_input("/document"),
            Input::Command(ChatCommand::Unknown(_))
        ));
        assert!(matches!(
            parse_input("/frobnicate"),
            Input::Command(ChatCommand::Unknown(_))
        ));
    }

    #[test]
    fn cost_line_has_five_decimals() {
        let mut session = ConversationSession::new("sys");
        session.add_cost(0.000057);
        assert_eq!(cost_line(&session), "Total cost of this conversation: $0.00006");
    }

    #[test]
    fn history_renders_pairs_in_order() {
        let mut session = ConversationSession::new("sys");
        session.append_turn("q1", Turn::new("q1", "a1", "gpt", Usage::default(), 0.0));
        session.append_turn("q2", Turn::new("q2", "line one\nline two", "gpt", Usage::default(), 0.0));

        let rendered = render_history(&session);
        assert_eq!(
            rendered,
            "  You > q1\n  Assistant > a1\n  You > q2\n  Assistant > line one\n  Assistant > line two\n"
        );
    }

    #[test]
    fn prompt_command_restarts_with_new_prompt() {
        let mut session = ConversationSession::new("old");
        let mut document = None;
        let mut prompt = "old".to_string();
        session.append_turn("q", Turn::new("q", "a", "gpt", Usage::default(), 0.0));

        handle_command(
            ChatCommand::Prompt("new".into()),
            &mut session,
            &mut document,
            &mut prompt,
        );

        assert_eq!(prompt, "new");
        assert_eq!(session.system_prompt(), "new");
        assert!(session.is_empty());
    }

    #[test]
    fn detach_clears_merge_flag() {
        let mut session = ConversationSession::new("sys");
        session.mark_document_merged();
        let mut document = Some(Document::new("a.txt", "Alpha."));
        let mut prompt = "sys".to_string();

        handle_command(ChatCommand::Detach, &mut session, &mut document, &mut prompt);

        assert!(document.is_none());
        assert!(!session.is_document_merged());
    }

    #[tokio::test]
    async fn attaching_a_new_document_merges_it_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.txt");
        std::fs::write(&path, "Beta.").unwrap();

        let service = build_service(&AppConfig::default(), true).unwrap();
        let mut session = ConversationSession::new("sys");
        let mut document = Some(Document::new("a.txt", "Alpha."));
        let mut prompt = "sys".to_string();

        service
            .submit(&mut session, "one", document.as_ref())
            .await
            .unwrap();
        assert!(session.is_document_merged());

        handle_command(
            ChatCommand::Document(path),
            &mut session,
            &mut document,
            &mut prompt,
        );
        assert!(!session.is_document_merged());

        let outcome = service
            .submit(&mut session, "two", document.as_ref())
            .await
            .unwrap();
        assert_eq!(
            outcome.sent_prompt,
            "Here is the information from PDF file: Beta.\n\ntwo"
        );
        assert!(session.is_document_merged());
    }

    #[test]
    fn failed_attach_keeps_current_document() {
        let mut session = ConversationSession::new("sys");
        session.mark_document_merged();
        let mut document = Some(Document::new("a.txt", "Alpha."));
        let mut prompt = "sys".to_string();

        handle_command(
            ChatCommand::Document(PathBuf::from("/nonexistent/missing.txt")),
            &mut session,
            &mut document,
            &mut prompt,
        );

        assert_eq!(document.unwrap().name, "a.txt");
        assert!(session.is_document_merged());
    }

    #[test]
    fn empty_reply_still_renders_a_line() {
        assert_eq!(render_block("Assistant", ""), "  Assistant >\n");

        let mut session = ConversationSession::new("sys");
        session.append_turn("q", Turn::new("q", "", "gpt", Usage::default(), 0.0));
        assert_eq!(render_history(&session), "  You > q\n  Assistant >\n");
    }

    #[test]
    fn offline_service_needs_no_credentials() {
        let service = build_service(&AppConfig::default(), true).unwrap();
        assert_eq!(service.provider_name(), "scripted");
        assert_eq!(service.deployment(), "offline");
    }

    #[test]
    fn online_service_requires_credentials() {
        let err = build_service(&AppConfig::default(), false).err().unwrap();
        assert!(err.to_string().contains("api_key"));
    }
}
