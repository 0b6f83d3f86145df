//! Stream event frames emitted during a turn

use crate::llm::TokenUsage;
use serde::{Deserialize, Serialize};

/// A transient, non-persisted frame surfacing turn progress to a consumer.
///
/// Frames are delivered in generation order and each turn carries exactly one
/// terminal frame (`done` or `error`), after which the channel is closed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A chunk of model text
    Text(String),

    /// The loop is about to execute a tool the model requested
    ToolUseStart { tool: String },

    /// Terminal: the turn finished with a final answer
    Done { tokens: TokenReport },

    /// Terminal: the turn failed
    Error { message: String },
}

impl StreamEvent {
    /// Whether this frame terminates the turn's stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Error { .. })
    }
}

/// Token accounting reported with the terminal `done` frame
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenReport {
    /// Tokens consumed by this turn
    pub last: TokenUsage,

    /// Cumulative tokens across the session
    pub total: TokenUsage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_serialize_with_type_discriminator() {
        let frame = StreamEvent::Text("hello".to_string());
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["data"], "hello");

        let frame = StreamEvent::ToolUseStart {
            tool: "memory".to_string(),
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "tool_use_start");
        assert_eq!(value["data"]["tool"], "memory");
    }

    #[test]
    fn only_done_and_error_are_terminal() {
        assert!(!StreamEvent::Text(String::new()).is_terminal());
        assert!(!StreamEvent::ToolUseStart {
            tool: "memory".to_string()
        }
        .is_terminal());
        assert!(StreamEvent::Done {
            tokens: TokenReport::default()
        }
        .is_terminal());
        assert!(StreamEvent::Error {
            message: "boom".to_string()
        }
        .is_terminal());
    }

    #[test]
    fn done_frame_round_trips() {
        let frame = StreamEvent::Done {
            tokens: TokenReport {
                last: TokenUsage {
                    input_tokens: 1,
                    output_tokens: 2,
                    ..Default::default()
                },
                total: TokenUsage {
                    input_tokens: 10,
                    output_tokens: 20,
                    ..Default::default()
                },
            },
        };
        let json = serde_json::to_string(&frame).unwrap();
        let back: StreamEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(frame, back);
    }
}
