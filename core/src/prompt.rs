//! System prompt loading and discovery

use crate::error::Result;
use std::path::{Path, PathBuf};

/// One available system prompt file
#[derive(Debug, Clone)]
pub struct PromptInfo {
    /// Prompt name (file stem)
    pub name: String,

    /// Full path to the prompt file
    pub path: PathBuf,

    /// File name with extension
    pub filename: String,
}

/// Load a system prompt from a text file.
///
/// Lines starting with `#` are comments and are stripped; blank lines are
/// preserved. The current date is appended so the model knows "today".
pub fn load_system_prompt<P: AsRef<Path>>(path: P) -> Result<String> {
    let raw = std::fs::read_to_string(path.as_ref())?;

    let mut lines = Vec::new();
    for line in raw.lines() {
        let stripped = line.trim();
        if stripped.is_empty() {
            lines.push("");
        } else if !stripped.starts_with('#') {
            lines.push(line.trim_end());
        }
    }

    let mut prompt = lines.join("\n").trim().to_string();
    let current_date = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    prompt.push_str(&format!("\n\nToday's date is: {}", current_date));
    Ok(prompt)
}

/// List the available system prompts in a directory, sorted by name
pub fn available_prompts<P: AsRef<Path>>(prompts_dir: P) -> Vec<PromptInfo> {
    let dir = prompts_dir.as_ref();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut prompts: Vec<PromptInfo> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
        .filter_map(|path| {
            let name = path.file_stem()?.to_string_lossy().to_string();
            let filename = path.file_name()?.to_string_lossy().to_string();
            Some(PromptInfo {
                name,
                path,
                filename,
            })
        })
        .collect();
    prompts.sort_by(|a, b| a.name.cmp(&b.name));
    prompts
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn strips_comments_and_appends_date() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("default.txt");
        std::fs::write(
            &path,
            "# comment header\nYou are a helpful assistant.\n\n# inline note\nRemember things.\n",
        )
        .unwrap();

        let prompt = load_system_prompt(&path).unwrap();
        assert!(!prompt.contains("comment header"));
        assert!(prompt.starts_with("You are a helpful assistant."));
        assert!(prompt.contains("Remember things."));
        assert!(prompt.contains("Today's date is:"));
    }

    #[test]
    fn missing_prompt_file_is_an_error() {
        assert!(load_system_prompt("/definitely/not/here.txt").is_err());
    }

    #[test]
    fn lists_txt_prompts_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("ignored.md"), "x").unwrap();

        let prompts = available_prompts(dir.path());
        let names: Vec<&str> = prompts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn empty_when_directory_missing() {
        assert!(available_prompts("/no/such/prompts/dir").is_empty());
    }
}
