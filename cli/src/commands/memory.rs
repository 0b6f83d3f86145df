//! Memory store inspection commands

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use memoro_core::MemoryStore;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum MemoryAction {
    /// List all memory files
    List,

    /// Show the content of one memory file
    Show {
        /// Path under /memories (the prefix is optional)
        path: String,
    },

    /// Delete every memory file
    Clear,
}

pub async fn memory_command(memory_dir: PathBuf, action: MemoryAction) -> Result<()> {
    let store = MemoryStore::new(memory_dir)?;

    match action {
        MemoryAction::List => {
            let files = store.list_files()?;
            if files.is_empty() {
                println!("{}", "memory is empty".dimmed());
                return Ok(());
            }
            for info in files {
                println!(
                    "{:>8}  {}  {}",
                    format!("{} B", info.size),
                    info.modified.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                    info.path.cyan()
                );
            }
        }
        MemoryAction::Show { path } => {
            let content = store.read_file(&path).await?;
            println!("{}", content);
        }
        MemoryAction::Clear => {
            let result = store.clear_all().await?;
            println!("{}", result);
        }
    }
    Ok(())
}
