//! Anthropic Claude client implementation

use crate::config::LlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::{
    ChatOptions, ContentBlock, LlmClient, LlmMessage, LlmResponse, MessageContent, MessageRole,
    StopReason, TokenUsage, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base delay for the exponential retry backoff
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Anthropic Claude client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
    max_retries: u32,
}

impl AnthropicClient {
    /// Create a new Anthropic client
    pub fn new(config: &LlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: "No API key configured for Anthropic".to_string(),
            }
            .into());
        }

        Ok(Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(messages, tools, options);

        let mut attempt = 0;
        loop {
            match self.send_request(&request).await {
                Ok(response) => return Ok(self.convert_response(response)?),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = RETRY_BASE_DELAY * 2u32.pow(attempt - 1);
                    tracing::warn!(
                        attempt,
                        max_retries = self.max_retries,
                        error = %e,
                        "transient Anthropic API failure, retrying after {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

impl AnthropicClient {
    fn build_request(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> MessagesRequest {
        let options = options.unwrap_or_default();

        // System messages become the top-level `system` field; tool-result
        // messages travel with the "user" role on the Anthropic wire.
        let mut system_parts = Vec::new();
        let mut wire_messages: Vec<WireMessage> = Vec::new();

        for message in messages {
            match message.role {
                MessageRole::System => {
                    if let Some(text) = message.get_text() {
                        system_parts.push(text);
                    }
                }
                role => {
                    let wire_role = match role {
                        MessageRole::Assistant => "assistant",
                        _ => "user",
                    };
                    wire_messages.push(WireMessage {
                        role: wire_role,
                        content: message.blocks(),
                    });
                }
            }
        }

        MessagesRequest {
            model: self.model.clone(),
            max_tokens: options.max_tokens.unwrap_or(self.max_tokens),
            temperature: options.temperature.or(self.temperature),
            system: if system_parts.is_empty() {
                None
            } else {
                Some(system_parts.join("\n\n"))
            },
            messages: wire_messages,
            tools,
            stop_sequences: options.stop,
        }
    }

    async fn send_request(
        &self,
        request: &MessagesRequest,
    ) -> std::result::Result<MessagesResponse, LlmError> {
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(LlmError::Authentication { message });
            }
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(|e| LlmError::MalformedResponse {
            message: format!("Failed to parse response: {}", e),
        })
    }

    fn convert_response(&self, response: MessagesResponse) -> Result<LlmResponse> {
        let mut blocks: Vec<ContentBlock> = Vec::new();
        for block in response.content {
            match block {
                ResponseBlock::Text { text } => blocks.push(ContentBlock::Text { text }),
                ResponseBlock::ToolUse { id, name, input } => {
                    blocks.push(ContentBlock::ToolUse { id, name, input })
                }
                ResponseBlock::Unknown => {}
            }
        }

        let content = if blocks.is_empty() {
            MessageContent::Text(String::new())
        } else if blocks.len() == 1 {
            match blocks.remove(0) {
                ContentBlock::Text { text } => MessageContent::Text(text),
                block => MessageContent::Blocks(vec![block]),
            }
        } else {
            MessageContent::Blocks(blocks)
        };

        let usage = response.usage.map(|u| TokenUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
            cache_read_tokens: u.cache_read_input_tokens.unwrap_or(0),
            cache_write_tokens: u.cache_creation_input_tokens.unwrap_or(0),
        });

        let stop_reason = response.stop_reason.map(|reason| match reason.as_str() {
            "end_turn" => StopReason::EndTurn,
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            "tool_use" => StopReason::ToolUse,
            _ => StopReason::Other(reason),
        });

        Ok(LlmResponse {
            message: LlmMessage {
                role: MessageRole::Assistant,
                content,
            },
            usage,
            model: response.model,
            stop_reason,
        })
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: String,
    content: Vec<ResponseBlock>,
    stop_reason: Option<String>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
    cache_read_input_tokens: Option<u64>,
    cache_creation_input_tokens: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;

    fn client() -> AnthropicClient {
        AnthropicClient::new(&LlmConfig::new("key", "claude-sonnet-4-5-20250929")).unwrap()
    }

    #[test]
    fn rejects_missing_api_key() {
        let mut config = LlmConfig::new("", "model");
        config.api_key.clear();
        assert!(AnthropicClient::new(&config).is_err());
    }

    #[test]
    fn system_messages_lift_into_system_field() {
        let request = client().build_request(
            vec![
                LlmMessage::system("be helpful"),
                LlmMessage::user("hi"),
                LlmMessage::assistant("hello"),
            ],
            None,
            None,
        );

        assert_eq!(request.system.as_deref(), Some("be helpful"));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.messages[1].role, "assistant");
    }

    #[test]
    fn tool_results_are_sent_as_user_role() {
        let request = client().build_request(
            vec![LlmMessage::tool_results(vec![ContentBlock::ToolResult {
                tool_use_id: "tu_1".to_string(),
                is_error: Some(false),
                content: "ok".to_string(),
            }])],
            None,
            None,
        );

        assert_eq!(request.messages[0].role, "user");
    }

    #[test]
    fn parses_tool_use_response() {
        let raw = serde_json::json!({
            "model": "claude-sonnet-4-5-20250929",
            "content": [
                {"type": "text", "text": "saving that"},
                {"type": "tool_use", "id": "tu_1", "name": "memory",
                 "input": {"command": "view", "path": "/memories"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 12, "output_tokens": 34, "cache_read_input_tokens": 5}
        });
        let response: MessagesResponse = serde_json::from_value(raw).unwrap();
        let converted = client().convert_response(response).unwrap();

        assert!(converted.message.has_tool_use());
        assert_eq!(converted.stop_reason, Some(StopReason::ToolUse));
        let usage = converted.usage.unwrap();
        assert_eq!(usage.input_tokens, 12);
        assert_eq!(usage.cache_read_tokens, 5);
        assert_eq!(usage.cache_write_tokens, 0);
    }
}
