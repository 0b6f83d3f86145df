//! Session implementation: the tool-execution loop

use crate::config::SessionConfig;
use crate::error::{Error, Result, SessionError};
use crate::llm::{ContentBlock, LlmClient, LlmMessage, TokenUsage};
use crate::memory::{MemoryCommand, MemoryStore};
use crate::session::events::{StreamEvent, TokenReport};
use crate::trace::{SessionTraceRecorder, TraceEventKind};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Result of one completed turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The model's final text answer
    pub final_text: String,

    /// Number of model rounds the turn took
    pub rounds: usize,

    /// Token accounting for the turn and the session
    pub tokens: TokenReport,
}

/// A conversation session with an LLM backend and an agent-managed memory store.
///
/// The session owns the conversation history, the memory store, and the trace
/// recorder for its whole lifetime. `send_message` drives one turn of the
/// tool-execution loop; taking `&mut self` means a new user message cannot be
/// accepted while a turn is in flight.
pub struct Session {
    config: SessionConfig,
    llm: Arc<dyn LlmClient>,
    memory: MemoryStore,
    recorder: SessionTraceRecorder,
    history: Vec<LlmMessage>,
    totals: TokenUsage,
}

impl Session {
    /// Create a new session
    pub fn new(config: SessionConfig, llm: Arc<dyn LlmClient>) -> Result<Self> {
        let memory = MemoryStore::new(config.memory_root.clone())?;
        let recorder = Self::make_recorder(&config, llm.as_ref());
        tracing::info!(
            session_id = %recorder.session_id(),
            model = llm.model_name(),
            "initialized session"
        );
        Ok(Self {
            config,
            llm,
            memory,
            recorder,
            history: Vec::new(),
            totals: TokenUsage::default(),
        })
    }

    fn make_recorder(config: &SessionConfig, llm: &dyn LlmClient) -> SessionTraceRecorder {
        match &config.sessions_dir {
            Some(dir) => SessionTraceRecorder::with_dir(dir, llm.model_name(), &config.system_prompt),
            None => SessionTraceRecorder::new(
                llm.model_name().to_string(),
                config.system_prompt.clone(),
            ),
        }
    }

    /// The memory store backing this session
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// The trace recorder for this session
    pub fn recorder(&self) -> &SessionTraceRecorder {
        &self.recorder
    }

    /// The session's unique id
    pub fn session_id(&self) -> &str {
        self.recorder.session_id()
    }

    /// Cumulative token usage across the session
    pub fn token_stats(&self) -> TokenUsage {
        self.totals
    }

    /// Number of messages in the conversation history
    pub fn message_count(&self) -> usize {
        self.history.len()
    }

    /// Run one turn of the conversation.
    ///
    /// Emits `StreamEvent` frames on `events` in generation order and
    /// guarantees exactly one terminal frame (`done` or `error`) per call.
    /// Fatal turn errors (backend failure after retries, round-limit
    /// exhaustion) are returned as `Err` after being journaled and emitted;
    /// the conversation history stays consistent either way.
    pub async fn send_message(
        &mut self,
        user_message: &str,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<TurnOutcome> {
        match self.run_turn(user_message, &events).await {
            Ok(outcome) => {
                send_event(&events, StreamEvent::Done {
                    tokens: outcome.tokens,
                })
                .await;
                Ok(outcome)
            }
            Err(error) => {
                let error_type = match &error {
                    Error::Llm(_) => "llm_error",
                    Error::Session(SessionError::RoundLimitExceeded { .. }) => "round_limit",
                    Error::Memory(_) => "memory_error",
                    _ => "internal",
                };
                tracing::error!(error = %error, "turn failed");
                self.recorder
                    .record(TraceEventKind::Error {
                        error_type: error_type.to_string(),
                        message: error.to_string(),
                    })
                    .await;
                send_event(&events, StreamEvent::Error {
                    message: error.to_string(),
                })
                .await;
                Err(error)
            }
        }
    }

    /// One turn: AwaitingModel -> (ExecutingTools)* -> Done
    async fn run_turn(
        &mut self,
        user_message: &str,
        events: &mpsc::Sender<StreamEvent>,
    ) -> Result<TurnOutcome> {
        self.history.push(LlmMessage::user(user_message));
        self.recorder
            .record(TraceEventKind::UserInput {
                message: user_message.to_string(),
            })
            .await;

        let tools = vec![MemoryCommand::tool_definition()];
        let tool_names: Vec<String> = tools.iter().map(|t| t.name.clone()).collect();
        let mut turn_tokens = TokenUsage::default();

        for round in 1..=self.config.max_rounds {
            let mut messages = Vec::with_capacity(self.history.len() + 1);
            if !self.config.system_prompt.is_empty() {
                messages.push(LlmMessage::system(self.config.system_prompt.clone()));
            }
            messages.extend(self.history.iter().cloned());

            self.recorder
                .record(TraceEventKind::LlmRequest {
                    message_count: messages.len(),
                    tools: tool_names.clone(),
                    round,
                })
                .await;

            let response = self
                .llm
                .chat_completion(messages, Some(tools.clone()), None)
                .await?;

            if let Some(usage) = response.usage {
                turn_tokens.add(&usage);
                self.totals.add(&usage);
                self.recorder
                    .record(TraceEventKind::TokenUsage {
                        last: usage,
                        cumulative: self.totals,
                    })
                    .await;
            }

            let blocks = response.message.blocks();
            self.history.push(response.message);

            let mut text_parts: Vec<String> = Vec::new();
            let mut results: Vec<ContentBlock> = Vec::new();

            // Blocks are handled in the order the model emitted them, and tool
            // calls run sequentially: later commands in the same round may
            // depend on earlier ones.
            for block in blocks {
                match block {
                    ContentBlock::Text { text } => {
                        if !text.is_empty() {
                            send_event(events, StreamEvent::Text(text.clone())).await;
                            text_parts.push(text);
                        }
                    }
                    ContentBlock::ToolUse { id, name, input } => {
                        send_event(events, StreamEvent::ToolUseStart { tool: name.clone() })
                            .await;
                        self.recorder
                            .record(TraceEventKind::ToolCall {
                                tool: name.clone(),
                                args: input.clone(),
                            })
                            .await;

                        let (content, is_error) = self.run_tool(&name, &input).await;
                        self.recorder
                            .record(TraceEventKind::ToolResult {
                                is_error,
                                content: content.clone(),
                            })
                            .await;

                        results.push(ContentBlock::ToolResult {
                            tool_use_id: id,
                            is_error: Some(is_error),
                            content,
                        });
                    }
                    ContentBlock::ToolResult { .. } => {}
                }
            }

            if results.is_empty() {
                let final_text = text_parts.join("\n");
                self.recorder
                    .record(TraceEventKind::LlmResponse {
                        message: final_text.clone(),
                    })
                    .await;
                return Ok(TurnOutcome {
                    final_text,
                    rounds: round,
                    tokens: TokenReport {
                        last: turn_tokens,
                        total: self.totals,
                    },
                });
            }

            self.history.push(LlmMessage::tool_results(results));
        }

        Err(SessionError::RoundLimitExceeded {
            max_rounds: self.config.max_rounds,
        }
        .into())
    }

    /// Execute one requested tool call.
    ///
    /// Failures are never fatal here: the error is serialized into the tool
    /// result so the model can decide how to recover.
    async fn run_tool(&self, name: &str, input: &serde_json::Value) -> (String, bool) {
        if name != MemoryCommand::TOOL_NAME {
            return (error_payload(&format!("unknown tool: {}", name)), true);
        }

        match MemoryCommand::from_tool_input(input) {
            Ok(command) => {
                tracing::debug!(command = command.name(), "executing memory command");
                match self.memory.execute(&command).await {
                    Ok(content) => (content, false),
                    Err(e) => (error_payload(&e.to_string()), true),
                }
            }
            Err(e) => (error_payload(&e.to_string()), true),
        }
    }

    /// Clear all memories and reset the conversation.
    ///
    /// Finalizes the current trace and opens a fresh one, mirroring a brand
    /// new session on the same store.
    pub async fn clear_memories(&mut self) -> Result<String> {
        let result = self.memory.clear_all().await?;
        self.history.clear();
        self.totals = TokenUsage::default();

        if let Err(e) = self.recorder.finalize().await {
            tracing::warn!(error = %e, "failed to finalize trace during reset");
        }
        self.recorder = Self::make_recorder(&self.config, self.llm.as_ref());
        Ok(result)
    }

    /// Finalize the session trace; returns its file path if persisted
    pub async fn finalize(&self) -> Result<Option<PathBuf>> {
        self.recorder.finalize().await
    }
}

fn error_payload(message: &str) -> String {
    json!({"status": "error", "message": message}).to_string()
}

async fn send_event(events: &mpsc::Sender<StreamEvent>, event: StreamEvent) {
    // Frames are transient; a dropped consumer must not wedge the turn.
    if events.send(event).await.is_err() {
        tracing::debug!("stream consumer dropped; frame discarded");
    }
}
