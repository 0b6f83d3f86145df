//! System prompt discovery command

use anyhow::Result;
use colored::Colorize;
use memoro_core::prompt::available_prompts;

pub fn prompts_command() -> Result<()> {
    let prompts = available_prompts("prompts");
    if prompts.is_empty() {
        println!("{}", "no prompts found under prompts/".dimmed());
        return Ok(());
    }
    for info in prompts {
        println!("{}  {}", info.name.cyan(), info.path.display().to_string().dimmed());
    }
    Ok(())
}
