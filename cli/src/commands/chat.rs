//! Interactive chat session

use anyhow::Result;
use colored::Colorize;
use memoro_core::config::DEFAULT_MODEL;
use memoro_core::prompt::load_system_prompt;
use memoro_core::session::StreamEvent;
use memoro_core::{AnthropicClient, LlmConfig, Session, SessionConfig};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Fallback system prompt when no prompt file is given
const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful assistant with a private memory directory at /memories.\n\
Use the memory tool to keep notes about the user and your ongoing work, and\n\
check your memory before answering questions about earlier conversations.";

#[allow(clippy::too_many_arguments)]
pub async fn chat_command(
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    prompt: Option<PathBuf>,
    memory_dir: PathBuf,
    sessions_dir: PathBuf,
    max_rounds: Option<usize>,
) -> Result<()> {
    let Some(api_key) = api_key else {
        anyhow::bail!("No API key provided. Set ANTHROPIC_API_KEY or pass --api-key.");
    };

    let mut llm_config = LlmConfig::new(
        api_key,
        std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
    );
    if let Some(model) = model {
        llm_config.model = model;
    }
    if let Some(base_url) = base_url {
        llm_config.base_url = base_url;
    }

    let system_prompt = resolve_system_prompt(prompt)?;

    let mut session_config = SessionConfig::default()
        .with_system_prompt(system_prompt)
        .with_memory_root(memory_dir)
        .with_sessions_dir(Some(sessions_dir));
    if let Some(max_rounds) = max_rounds {
        session_config = session_config.with_max_rounds(max_rounds);
    }

    let client = Arc::new(AnthropicClient::new(&llm_config)?);
    let mut session = Session::new(session_config, client)?;

    println!("{}", "memoro".bold());
    println!("model: {}", llm_config.model.dimmed());
    println!(
        "{}",
        "Type a message. Commands: /memory, /clear, /stats, /quit".dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "you>".green().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        match line.as_str() {
            "/quit" | "/exit" => break,
            "/clear" => {
                let result = session.clear_memories().await?;
                println!("{}", result.dimmed());
                continue;
            }
            "/memory" => {
                print_memory_listing(&session)?;
                continue;
            }
            "/stats" => {
                let totals = session.token_stats();
                println!(
                    "{}",
                    format!(
                        "session tokens: {} in / {} out ({} cache read, {} cache write)",
                        totals.input_tokens,
                        totals.output_tokens,
                        totals.cache_read_tokens,
                        totals.cache_write_tokens
                    )
                    .dimmed()
                );
                continue;
            }
            _ => {}
        }

        let (tx, mut rx) = mpsc::channel(64);
        let printer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                render_event(event);
            }
        });

        let outcome = session.send_message(&line, tx).await;
        let _ = printer.await;

        if let Err(e) = outcome {
            tracing::debug!(error = %e, "turn failed");
        }
    }

    if let Some(path) = session.finalize().await? {
        println!("{}", format!("session trace saved to {}", path.display()).dimmed());
    }
    Ok(())
}

fn resolve_system_prompt(prompt: Option<PathBuf>) -> Result<String> {
    match prompt {
        Some(path) => Ok(load_system_prompt(&path)?),
        None => {
            let current_date = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
            Ok(format!(
                "{}\n\nToday's date is: {}",
                DEFAULT_SYSTEM_PROMPT, current_date
            ))
        }
    }
}

fn print_memory_listing(session: &Session) -> Result<()> {
    let files = session.memory().list_files()?;
    if files.is_empty() {
        println!("{}", "memory is empty".dimmed());
        return Ok(());
    }
    for info in files {
        println!(
            "  {}  {}",
            format!("{} ({} bytes)", info.path, info.size).cyan(),
            info.modified.format("%Y-%m-%d %H:%M").to_string().dimmed()
        );
    }
    Ok(())
}

fn render_event(event: StreamEvent) {
    match event {
        StreamEvent::Text(text) => println!("{}", text),
        StreamEvent::ToolUseStart { tool } => {
            println!("{}", format!("  [{}]", tool).cyan().dimmed())
        }
        StreamEvent::Done { tokens } => {
            println!(
                "{}",
                format!(
                    "turn: {} in / {} out · session: {} in / {} out",
                    tokens.last.input_tokens,
                    tokens.last.output_tokens,
                    tokens.total.input_tokens,
                    tokens.total.output_tokens
                )
                .dimmed()
            );
        }
        StreamEvent::Error { message } => {
            eprintln!("{}", format!("error: {}", message).red());
        }
    }
}
