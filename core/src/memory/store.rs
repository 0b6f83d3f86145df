//! Sandboxed file store backing the memory tool

use crate::error::MemoryError;
use crate::memory::command::MemoryCommand;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Client-visible root every memory path must live under
pub const MEMORY_ROOT: &str = "/memories";

/// Executes memory commands against a constrained directory subtree
///
/// All paths are validated through [`MemoryStore::resolve`] before any I/O;
/// that function is the single security boundary of the store.
pub struct MemoryStore {
    root: PathBuf,
}

/// Listing entry for one memory file
#[derive(Debug, Clone, Serialize)]
pub struct MemoryFileInfo {
    /// Path relative to the memory root
    pub path: String,

    /// File name
    pub name: String,

    /// Size in bytes
    pub size: u64,

    /// Last modification time
    pub modified: DateTime<Utc>,
}

impl MemoryStore {
    /// Open a store rooted at the given on-disk directory, creating it if needed
    pub fn new<P: Into<PathBuf>>(root: P) -> Result<Self, MemoryError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| io_err(&root.to_string_lossy(), e))?;
        Ok(Self { root })
    }

    /// On-disk root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalize a client-visible path and check it stays inside the root.
    ///
    /// Every command branch, including both endpoints of `rename`, goes
    /// through here. Rejects paths outside `/memories`, `..` escapes, rooted
    /// detours, and symlinks that resolve outside the store.
    fn resolve(&self, raw: &str) -> Result<PathBuf, MemoryError> {
        let traversal = || MemoryError::PathTraversal {
            path: raw.to_string(),
        };

        let rest = if raw == MEMORY_ROOT {
            ""
        } else {
            raw.strip_prefix("/memories/").ok_or_else(traversal)?
        };

        let mut normalized = PathBuf::new();
        for component in Path::new(rest).components() {
            match component {
                Component::Normal(part) => normalized.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(traversal());
                    }
                }
                Component::RootDir | Component::Prefix(_) => return Err(traversal()),
            }
        }

        let resolved = self.root.join(normalized);

        // A pre-existing symlink could still point outside the root.
        if let Ok(canonical) = resolved.canonicalize() {
            let canonical_root = self
                .root
                .canonicalize()
                .map_err(|e| io_err(&self.root.to_string_lossy(), e))?;
            if !canonical.starts_with(&canonical_root) {
                return Err(traversal());
            }
        }

        Ok(resolved)
    }

    /// Execute one memory command.
    ///
    /// The `Ok` string is the tool-result content reported back to the model.
    /// Each command is its own atomic unit; nothing here retries or rolls back.
    pub async fn execute(&self, command: &MemoryCommand) -> Result<String, MemoryError> {
        match command {
            MemoryCommand::View { path } => self.view(path).await,
            MemoryCommand::Create { path, content } => self.create(path, content).await,
            MemoryCommand::StrReplace {
                path,
                old_str,
                new_str,
            } => self.str_replace(path, old_str, new_str).await,
            MemoryCommand::Insert {
                path,
                insert_line,
                content,
            } => self.insert(path, *insert_line, content).await,
            MemoryCommand::Delete { path } => self.delete(path).await,
            MemoryCommand::Rename { old_path, new_path } => {
                self.rename(old_path, new_path).await
            }
        }
    }

    async fn view(&self, path: &str) -> Result<String, MemoryError> {
        let resolved = self.resolve(path)?;

        if resolved.is_dir() {
            let entries = self.list_subtree(&resolved)?;
            if entries.is_empty() {
                return Ok(format!("Directory {} is empty.", path));
            }
            let mut listing = format!("Directory {}:\n", path);
            for info in entries {
                listing.push_str(&format!("- {} ({} bytes)\n", info.path, info.size));
            }
            return Ok(listing);
        }

        if !resolved.is_file() {
            return Err(MemoryError::NotFound {
                path: path.to_string(),
            });
        }

        fs::read_to_string(&resolved)
            .await
            .map_err(|e| io_err(path, e))
    }

    async fn create(&self, path: &str, content: &str) -> Result<String, MemoryError> {
        let resolved = self.resolve(path)?;
        if resolved.exists() {
            return Err(MemoryError::AlreadyExists {
                path: path.to_string(),
            });
        }
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_err(path, e))?;
        }
        fs::write(&resolved, content)
            .await
            .map_err(|e| io_err(path, e))?;
        Ok(format!("File created successfully at: {}", path))
    }

    async fn str_replace(
        &self,
        path: &str,
        old_str: &str,
        new_str: &str,
    ) -> Result<String, MemoryError> {
        let resolved = self.resolve(path)?;
        if !resolved.is_file() {
            return Err(MemoryError::NotFound {
                path: path.to_string(),
            });
        }
        let content = fs::read_to_string(&resolved)
            .await
            .map_err(|e| io_err(path, e))?;

        // Strict single-occurrence policy: 0 and 2+ matches both fail so the
        // model never gets a silent no-op or an unintended multi-edit.
        let matches = content.matches(old_str).count();
        if matches != 1 {
            return Err(MemoryError::AmbiguousMatch { matches });
        }

        let updated = content.replacen(old_str, new_str, 1);
        fs::write(&resolved, updated)
            .await
            .map_err(|e| io_err(path, e))?;
        Ok(format!("The file {} has been edited.", path))
    }

    async fn insert(
        &self,
        path: &str,
        insert_line: usize,
        content: &str,
    ) -> Result<String, MemoryError> {
        let resolved = self.resolve(path)?;
        if !resolved.is_file() {
            return Err(MemoryError::NotFound {
                path: path.to_string(),
            });
        }
        let text = fs::read_to_string(&resolved)
            .await
            .map_err(|e| io_err(path, e))?;
        let had_trailing_newline = text.ends_with('\n');

        let mut lines: Vec<&str> = text.lines().collect();
        // Past-the-end indices append.
        let index = insert_line.min(lines.len());
        for (offset, line) in content.lines().enumerate() {
            lines.insert(index + offset, line);
        }

        let mut updated = lines.join("\n");
        if had_trailing_newline {
            updated.push('\n');
        }
        fs::write(&resolved, updated)
            .await
            .map_err(|e| io_err(path, e))?;
        Ok(format!(
            "Inserted content at line {} in {}.",
            index, path
        ))
    }

    async fn delete(&self, path: &str) -> Result<String, MemoryError> {
        let resolved = self.resolve(path)?;
        if resolved == self.root {
            return Err(MemoryError::InvalidCommand {
                message: "cannot delete the memory root".to_string(),
            });
        }
        if resolved.is_dir() {
            fs::remove_dir_all(&resolved)
                .await
                .map_err(|e| io_err(path, e))?;
        } else if resolved.is_file() {
            fs::remove_file(&resolved)
                .await
                .map_err(|e| io_err(path, e))?;
        } else {
            return Err(MemoryError::NotFound {
                path: path.to_string(),
            });
        }
        Ok(format!("Deleted: {}", path))
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> Result<String, MemoryError> {
        let source = self.resolve(old_path)?;
        let destination = self.resolve(new_path)?;

        if !source.exists() {
            return Err(MemoryError::NotFound {
                path: old_path.to_string(),
            });
        }
        if destination.exists() {
            return Err(MemoryError::AlreadyExists {
                path: new_path.to_string(),
            });
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_err(new_path, e))?;
        }
        fs::rename(&source, &destination)
            .await
            .map_err(|e| io_err(old_path, e))?;
        Ok(format!("Renamed {} to {}", old_path, new_path))
    }

    /// List every memory file with name, size, and modification time
    pub fn list_files(&self) -> Result<Vec<MemoryFileInfo>, MemoryError> {
        self.list_subtree(&self.root)
    }

    fn list_subtree(&self, dir: &Path) -> Result<Vec<MemoryFileInfo>, MemoryError> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let metadata = entry.metadata().map_err(|e| {
                let path = entry.path().to_string_lossy().to_string();
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| {
                        std::io::Error::new(std::io::ErrorKind::Other, "metadata unavailable")
                    });
                MemoryError::Io { path, source }
            })?;
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path());
            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            entries.push(MemoryFileInfo {
                path: relative.to_string_lossy().replace('\\', "/"),
                name: entry.file_name().to_string_lossy().to_string(),
                size: metadata.len(),
                modified,
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Read one memory file by client-visible or root-relative path
    pub async fn read_file(&self, path: &str) -> Result<String, MemoryError> {
        let client_path = if path.starts_with(MEMORY_ROOT) {
            path.to_string()
        } else {
            format!("{}/{}", MEMORY_ROOT, path.trim_start_matches('/'))
        };
        self.view(&client_path).await
    }

    /// Remove every entry under the memory root
    pub async fn clear_all(&self) -> Result<String, MemoryError> {
        let mut removed = 0usize;
        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(|e| io_err(MEMORY_ROOT, e))?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| io_err(MEMORY_ROOT, e))?
        {
            let path = entry.path();
            let result = if path.is_dir() {
                fs::remove_dir_all(&path).await
            } else {
                fs::remove_file(&path).await
            };
            result.map_err(|e| io_err(&path.to_string_lossy(), e))?;
            removed += 1;
        }
        Ok(format!("Cleared {} entries from memory", removed))
    }
}

fn io_err(path: &str, source: std::io::Error) -> MemoryError {
    MemoryError::Io {
        path: path.to_string(),
        source,
    }
}
