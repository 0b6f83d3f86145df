//! Trace event structures

use crate::llm::TokenUsage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single immutable record in a session trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Monotonically increasing, gap-free sequence number within the session
    pub seq: u64,

    /// When the event was recorded
    pub timestamp: DateTime<Utc>,

    /// Kind-specific payload
    #[serde(flatten)]
    pub kind: TraceEventKind,
}

/// Kind of trace event, with its payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum TraceEventKind {
    /// The caller submitted a user message
    UserInput { message: String },

    /// A request was sent to the model backend
    LlmRequest {
        message_count: usize,
        tools: Vec<String>,
        round: usize,
    },

    /// The model requested a tool invocation
    ToolCall {
        tool: String,
        args: serde_json::Value,
    },

    /// A tool invocation finished (success or error, both are journaled)
    ToolResult { is_error: bool, content: String },

    /// The model produced the turn's final text answer
    LlmResponse { message: String },

    /// Token-usage snapshot after a model response
    TokenUsage {
        last: TokenUsage,
        cumulative: TokenUsage,
    },

    /// A turn-level failure
    Error { error_type: String, message: String },
}

impl TraceEventKind {
    /// Stable label used for derived statistics
    pub fn label(&self) -> &'static str {
        match self {
            TraceEventKind::UserInput { .. } => "user_input",
            TraceEventKind::LlmRequest { .. } => "llm_request",
            TraceEventKind::ToolCall { .. } => "tool_call",
            TraceEventKind::ToolResult { .. } => "tool_result",
            TraceEventKind::LlmResponse { .. } => "llm_response",
            TraceEventKind::TokenUsage { .. } => "token_usage",
            TraceEventKind::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_event_type_tag() {
        let event = TraceEvent {
            seq: 3,
            timestamp: Utc::now(),
            kind: TraceEventKind::UserInput {
                message: "hello".to_string(),
            },
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["seq"], 3);
        assert_eq!(value["event_type"], "user_input");
        assert_eq!(value["message"], "hello");
    }

    #[test]
    fn token_usage_round_trips() {
        let kind = TraceEventKind::TokenUsage {
            last: TokenUsage {
                input_tokens: 10,
                output_tokens: 5,
                ..Default::default()
            },
            cumulative: TokenUsage {
                input_tokens: 100,
                output_tokens: 50,
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&kind).unwrap();
        let back: TraceEventKind = serde_json::from_str(&json).unwrap();
        match back {
            TraceEventKind::TokenUsage { cumulative, .. } => {
                assert_eq!(cumulative.input_tokens, 100)
            }
            other => panic!("unexpected kind: {:?}", other.label()),
        }
    }
}
