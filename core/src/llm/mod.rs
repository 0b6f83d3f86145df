//! LLM client abstractions and the Anthropic backend

pub mod anthropic;
pub mod client;
pub mod message;

pub use anthropic::AnthropicClient;
pub use client::{ChatOptions, LlmClient, LlmResponse, StopReason, TokenUsage, ToolDefinition};
pub use message::{ContentBlock, LlmMessage, MessageContent, MessageRole};
