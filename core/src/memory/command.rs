//! Memory tool command set

use crate::error::MemoryError;
use crate::llm::ToolDefinition;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A single operation against the memory store
///
/// This is the closed set of commands the model may invoke. Parsing the
/// model's tool input via serde makes every branch compile-time checked;
/// unknown commands or malformed arguments surface as `InvalidCommand`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum MemoryCommand {
    /// Show a directory listing (for the root) or a file's full content
    View { path: String },

    /// Create a new file; fails if the file already exists
    Create { path: String, content: String },

    /// Replace exactly one occurrence of `old_str` with `new_str`
    StrReplace {
        path: String,
        old_str: String,
        new_str: String,
    },

    /// Insert `content` as new lines at a 0-based line index
    /// (clamped to the file length, so past-the-end appends)
    Insert {
        path: String,
        insert_line: usize,
        content: String,
    },

    /// Remove a file
    Delete { path: String },

    /// Move a file to a new path; fails if the destination exists
    Rename { old_path: String, new_path: String },
}

impl MemoryCommand {
    /// Name under which the command set is exposed to the model
    pub const TOOL_NAME: &'static str = "memory";

    /// Parse a command from the model's raw tool input
    pub fn from_tool_input(input: &serde_json::Value) -> Result<Self, MemoryError> {
        serde_json::from_value(input.clone()).map_err(|e| MemoryError::InvalidCommand {
            message: e.to_string(),
        })
    }

    /// The command verb, as exposed in the tool schema
    pub fn name(&self) -> &'static str {
        match self {
            MemoryCommand::View { .. } => "view",
            MemoryCommand::Create { .. } => "create",
            MemoryCommand::StrReplace { .. } => "str_replace",
            MemoryCommand::Insert { .. } => "insert",
            MemoryCommand::Delete { .. } => "delete",
            MemoryCommand::Rename { .. } => "rename",
        }
    }

    /// Tool definition handed to the LLM backend
    pub fn tool_definition() -> ToolDefinition {
        ToolDefinition {
            name: Self::TOOL_NAME.to_string(),
            description: "Tool for reading and writing your long-term memory files.\n\
                 * All memory lives under the `/memories` directory; every `path` argument must start with `/memories`\n\
                 * `view` on `/memories` lists your files with sizes; `view` on a file returns its full content\n\
                 * `create` cannot overwrite an existing file. Delete the file first if you need to rewrite it\n\
                 * `str_replace` requires `old_str` to match EXACTLY one occurrence in the file. Include enough context to make it unique\n\
                 * `insert` places `content` at the 0-based line `insert_line`; an index past the end appends\n\
                 * `rename` moves a file; the destination must not already exist"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "enum": ["view", "create", "str_replace", "insert", "delete", "rename"],
                        "description": "The memory operation to run."
                    },
                    "path": {
                        "type": "string",
                        "description": "Path under the memory root, e.g. `/memories/prefs.txt`. Required by every command except `rename`."
                    },
                    "content": {
                        "type": "string",
                        "description": "File content for `create`, or the lines to add for `insert`."
                    },
                    "old_str": {
                        "type": "string",
                        "description": "Required by `str_replace`: the exact text to replace. Must occur exactly once."
                    },
                    "new_str": {
                        "type": "string",
                        "description": "Required by `str_replace`: the replacement text."
                    },
                    "insert_line": {
                        "type": "integer",
                        "description": "Required by `insert`: 0-based line index at which to insert."
                    },
                    "old_path": {
                        "type": "string",
                        "description": "Required by `rename`: the current path."
                    },
                    "new_path": {
                        "type": "string",
                        "description": "Required by `rename`: the destination path."
                    }
                },
                "required": ["command"]
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_every_command_variant() {
        let cases = vec![
            (
                json!({"command": "view", "path": "/memories"}),
                MemoryCommand::View {
                    path: "/memories".to_string(),
                },
            ),
            (
                json!({"command": "create", "path": "/memories/a.txt", "content": "hi"}),
                MemoryCommand::Create {
                    path: "/memories/a.txt".to_string(),
                    content: "hi".to_string(),
                },
            ),
            (
                json!({"command": "str_replace", "path": "/memories/a.txt",
                       "old_str": "hi", "new_str": "bye"}),
                MemoryCommand::StrReplace {
                    path: "/memories/a.txt".to_string(),
                    old_str: "hi".to_string(),
                    new_str: "bye".to_string(),
                },
            ),
            (
                json!({"command": "insert", "path": "/memories/a.txt",
                       "insert_line": 2, "content": "mid"}),
                MemoryCommand::Insert {
                    path: "/memories/a.txt".to_string(),
                    insert_line: 2,
                    content: "mid".to_string(),
                },
            ),
            (
                json!({"command": "delete", "path": "/memories/a.txt"}),
                MemoryCommand::Delete {
                    path: "/memories/a.txt".to_string(),
                },
            ),
            (
                json!({"command": "rename", "old_path": "/memories/a.txt",
                       "new_path": "/memories/b.txt"}),
                MemoryCommand::Rename {
                    old_path: "/memories/a.txt".to_string(),
                    new_path: "/memories/b.txt".to_string(),
                },
            ),
        ];

        for (input, expected) in cases {
            assert_eq!(MemoryCommand::from_tool_input(&input).unwrap(), expected);
        }
    }

    #[test]
    fn rejects_unknown_command() {
        let err =
            MemoryCommand::from_tool_input(&json!({"command": "truncate", "path": "/memories"}))
                .unwrap_err();
        assert!(matches!(err, MemoryError::InvalidCommand { .. }));
    }

    #[test]
    fn rejects_missing_arguments() {
        let err = MemoryCommand::from_tool_input(&json!({"command": "str_replace",
            "path": "/memories/a.txt", "old_str": "x"}))
        .unwrap_err();
        assert!(matches!(err, MemoryError::InvalidCommand { .. }));
    }

    #[test]
    fn schema_names_every_verb() {
        let definition = MemoryCommand::tool_definition();
        assert_eq!(definition.name, "memory");
        let verbs = definition.input_schema["properties"]["command"]["enum"]
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(verbs.len(), 6);
    }
}
