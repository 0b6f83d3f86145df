//! LLM client trait and response structures

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::message::LlmMessage;

/// Trait for LLM backends
///
/// The backend is a black box: given a conversation and a set of callable
/// tool definitions it returns either natural-language text or structured
/// tool-invocation requests, plus token-usage counters.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a chat completion request
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}

/// Response from an LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated message
    pub message: LlmMessage,

    /// Token usage for this single request
    pub usage: Option<TokenUsage>,

    /// Model used for generation
    pub model: String,

    /// Why generation stopped
    pub stop_reason: Option<StopReason>,
}

/// Token usage counters
///
/// Used both for a single request (`LlmResponse::usage`) and, summed, for the
/// session-cumulative totals. Cumulative counters only ever grow.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub input_tokens: u64,

    /// Tokens in the completion
    pub output_tokens: u64,

    /// Prompt tokens served from cache
    pub cache_read_tokens: u64,

    /// Prompt tokens written to cache
    pub cache_write_tokens: u64,
}

impl TokenUsage {
    /// Accumulate another usage sample into this one
    pub fn add(&mut self, other: &TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.cache_read_tokens += other.cache_read_tokens;
        self.cache_write_tokens += other.cache_write_tokens;
    }

    /// Combined input + output token count
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Reason why generation finished
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Generation completed naturally
    EndTurn,

    /// Hit the maximum token limit
    MaxTokens,

    /// A stop sequence was produced
    StopSequence,

    /// The model requested one or more tool invocations
    ToolUse,

    /// Other reason
    Other(String),
}

/// Tool definition exposed to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name of the tool
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON schema for the tool's input
    pub input_schema: serde_json::Value,
}

/// Options for chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Temperature for generation
    pub temperature: Option<f32>,

    /// Stop sequences
    pub stop: Option<Vec<String>>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            max_tokens: None,
            temperature: None,
            stop: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_accumulates() {
        let mut total = TokenUsage::default();
        total.add(&TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
            cache_read_tokens: 2,
            cache_write_tokens: 1,
        });
        total.add(&TokenUsage {
            input_tokens: 3,
            output_tokens: 4,
            ..Default::default()
        });

        assert_eq!(total.input_tokens, 13);
        assert_eq!(total.output_tokens, 9);
        assert_eq!(total.cache_read_tokens, 2);
        assert_eq!(total.cache_write_tokens, 1);
        assert_eq!(total.total_tokens(), 22);
    }
}
