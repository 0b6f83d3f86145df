//! # memoro CLI
//!
//! Command-line interface for Memoro - a conversational agent that manages
//! its own long-term memory.
//!
//! ## Usage
//!
//! - `memoro chat` - Start an interactive chat session
//! - `memoro memory list|show|clear` - Inspect or reset the memory store
//! - `memoro sessions list|show` - Inspect recorded session traces
//! - `memoro prompts` - List available system prompts

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{chat_command, memory_command, prompts_command, sessions_command};
use commands::{MemoryAction, SessionsAction};

/// memoro - chat with an agent that remembers
#[derive(Parser)]
#[command(name = "memoro")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A conversational agent with self-managed long-term memory")]
#[command(long_about = None)]
struct Cli {
    /// API key override (defaults to ANTHROPIC_API_KEY)
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model name override (defaults to ANTHROPIC_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Base URL override
    #[arg(long)]
    base_url: Option<String>,

    /// System prompt file (lines starting with '#' are stripped)
    #[arg(long)]
    prompt: Option<PathBuf>,

    /// Directory backing the /memories root
    #[arg(long, default_value = "memory/memories")]
    memory_dir: PathBuf,

    /// Directory for session trace files
    #[arg(long, default_value = "sessions")]
    sessions_dir: PathBuf,

    /// Maximum tool-call rounds per turn
    #[arg(long)]
    max_rounds: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session (the default)
    Chat,

    /// Inspect or reset the memory store
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Inspect recorded session traces
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },

    /// List available system prompts
    Prompts,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    memoro_core::init_tracing_with_debug(cli.verbose);

    match cli.command {
        None | Some(Commands::Chat) => {
            chat_command(
                cli.api_key,
                cli.model,
                cli.base_url,
                cli.prompt,
                cli.memory_dir,
                cli.sessions_dir,
                cli.max_rounds,
            )
            .await
        }
        Some(Commands::Memory { action }) => memory_command(cli.memory_dir, action).await,
        Some(Commands::Sessions { action }) => sessions_command(cli.sessions_dir, action).await,
        Some(Commands::Prompts) => prompts_command(),
    }
}
