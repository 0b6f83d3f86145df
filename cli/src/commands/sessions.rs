//! Session trace inspection commands

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use memoro_core::SessionTrace;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum SessionsAction {
    /// List recorded session traces, newest first
    List,

    /// Show statistics for one session (by id or id prefix)
    Show {
        /// Session id, or a unique prefix of one
        id: String,
    },
}

pub async fn sessions_command(sessions_dir: PathBuf, action: SessionsAction) -> Result<()> {
    let traces = load_traces(&sessions_dir).await;

    match action {
        SessionsAction::List => {
            if traces.is_empty() {
                println!("{}", "no recorded sessions".dimmed());
                return Ok(());
            }
            for trace in traces {
                let stats = trace.stats();
                println!(
                    "{}  {}  {}  {} events  {} tokens",
                    &trace.session_id[..8].cyan(),
                    trace.start_time.format("%Y-%m-%d %H:%M:%S"),
                    trace.model.dimmed(),
                    stats.event_count,
                    stats.total_tokens.total_tokens()
                );
            }
        }
        SessionsAction::Show { id } => {
            let Some(trace) = traces.iter().find(|t| t.session_id.starts_with(&id)) else {
                anyhow::bail!("no session matching id '{}'", id);
            };
            let stats = trace.stats();

            println!("session   {}", trace.session_id.cyan());
            println!("model     {}", trace.model);
            println!("started   {}", trace.start_time.format("%Y-%m-%d %H:%M:%S"));
            match trace.end_time {
                Some(end) => println!("ended     {}", end.format("%Y-%m-%d %H:%M:%S")),
                None => println!("ended     {}", "(not finalized)".dimmed()),
            }
            if let Some(duration_ms) = stats.duration_ms {
                println!("duration  {:.1}s", duration_ms as f64 / 1000.0);
            }
            println!(
                "tokens    {} in / {} out",
                stats.total_tokens.input_tokens, stats.total_tokens.output_tokens
            );
            println!("events    {}", stats.event_count);
            for (kind, count) in &stats.event_counts {
                println!("  {:<14} {}", kind, count);
            }
        }
    }
    Ok(())
}

/// Load every readable trace in the directory, newest first.
/// Unreadable files are skipped with a diagnostic, matching the listing's
/// best-effort contract.
async fn load_traces(sessions_dir: &Path) -> Vec<SessionTrace> {
    let Ok(entries) = std::fs::read_dir(sessions_dir) else {
        return Vec::new();
    };

    let mut traces = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let is_session_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("session_") && n.ends_with(".json"));
        if !is_session_file {
            continue;
        }
        match SessionTrace::load(&path).await {
            Ok(trace) => traces.push(trace),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable trace"),
        }
    }
    traces.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    traces
}
