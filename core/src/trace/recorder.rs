//! Session trace recorder implementation

use crate::error::{Result, TraceError};
use crate::llm::TokenUsage;
use crate::trace::event::{TraceEvent, TraceEventKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

/// Complete, self-describing record of one session
///
/// The on-disk format is a single pretty-printed JSON document: session
/// metadata plus the ordered event list. Everything a reader needs to
/// reconstruct the session chronology or derive statistics is in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTrace {
    /// Unique identifier for this session
    pub session_id: String,

    /// Model that served the session
    pub model: String,

    /// Resolved system prompt text
    pub system_prompt: String,

    /// When the session started
    pub start_time: DateTime<Utc>,

    /// When the session was finalized (if it was)
    pub end_time: Option<DateTime<Utc>>,

    /// All recorded events, in sequence order
    pub events: Vec<TraceEvent>,
}

/// Statistics derived from a trace without replaying application logic
#[derive(Debug, Clone, Serialize)]
pub struct TraceStats {
    /// Total number of events
    pub event_count: usize,

    /// Event count per kind
    pub event_counts: BTreeMap<String, usize>,

    /// Cumulative token usage, taken from the last token_usage event
    pub total_tokens: TokenUsage,

    /// Wall-clock duration in milliseconds, if derivable
    pub duration_ms: Option<i64>,
}

impl SessionTrace {
    /// Load a trace from disk
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TraceError::Load {
                path: path.to_string_lossy().to_string(),
            }
            .into());
        }
        let content = fs::read_to_string(path).await?;
        let trace: SessionTrace =
            serde_json::from_str(&content).map_err(|_| TraceError::InvalidFormat)?;
        Ok(trace)
    }

    /// Derive summary statistics from the recorded events
    pub fn stats(&self) -> TraceStats {
        let mut event_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut total_tokens = TokenUsage::default();

        for event in &self.events {
            *event_counts
                .entry(event.kind.label().to_string())
                .or_insert(0) += 1;
            if let TraceEventKind::TokenUsage { cumulative, .. } = &event.kind {
                total_tokens = *cumulative;
            }
        }

        let end = self
            .end_time
            .or_else(|| self.events.last().map(|e| e.timestamp));
        let duration_ms = end.map(|end| (end - self.start_time).num_milliseconds());

        TraceStats {
            event_count: self.events.len(),
            event_counts,
            total_tokens,
            duration_ms,
        }
    }
}

struct RecorderState {
    trace: SessionTrace,
    next_seq: u64,
}

/// Records every session event to an ordered, durable per-session log
///
/// Sequence numbers are allocated strictly increasing with no gaps. When a
/// file path is configured the trace is rewritten after every append, so a
/// crash loses at most the in-flight turn. Persistence failures are reported
/// to diagnostics and never abort the caller.
pub struct SessionTraceRecorder {
    session_id: String,
    file_path: Option<PathBuf>,
    state: RwLock<RecorderState>,
}

impl SessionTraceRecorder {
    /// Create an in-memory recorder (no persistence)
    pub fn new<S: Into<String>>(model: S, system_prompt: S) -> Self {
        Self::build(model.into(), system_prompt.into(), None)
    }

    /// Create a recorder persisting under the given sessions directory
    pub fn with_dir<P: AsRef<Path>>(sessions_dir: P, model: &str, system_prompt: &str) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let filename = format!("session_{}_{}.json", stamp, &session_id[..8]);
        let path = sessions_dir.as_ref().join(filename);
        Self::build_with_id(
            session_id,
            model.to_string(),
            system_prompt.to_string(),
            Some(path),
        )
    }

    fn build(model: String, system_prompt: String, file_path: Option<PathBuf>) -> Self {
        Self::build_with_id(
            uuid::Uuid::new_v4().to_string(),
            model,
            system_prompt,
            file_path,
        )
    }

    fn build_with_id(
        session_id: String,
        model: String,
        system_prompt: String,
        file_path: Option<PathBuf>,
    ) -> Self {
        let trace = SessionTrace {
            session_id: session_id.clone(),
            model,
            system_prompt,
            start_time: Utc::now(),
            end_time: None,
            events: Vec::new(),
        };
        Self {
            session_id,
            file_path,
            state: RwLock::new(RecorderState { trace, next_seq: 0 }),
        }
    }

    /// The session's unique id
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The trace file path, if persistence is configured
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Append an event and flush; returns the allocated sequence number.
    ///
    /// Prior events are never mutated or removed. A failed flush is logged
    /// and swallowed so trace durability issues cannot crash a turn.
    pub async fn record(&self, kind: TraceEventKind) -> u64 {
        let mut state = self.state.write().await;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.trace.events.push(TraceEvent {
            seq,
            timestamp: Utc::now(),
            kind,
        });

        if let Err(e) = self.save(&state.trace).await {
            tracing::warn!(
                session_id = %self.session_id,
                error = %e,
                "failed to persist session trace event"
            );
        }
        seq
    }

    /// Number of recorded events
    pub async fn event_count(&self) -> usize {
        self.state.read().await.trace.events.len()
    }

    /// Snapshot of the trace recorded so far
    pub async fn snapshot(&self) -> SessionTrace {
        self.state.read().await.trace.clone()
    }

    /// Stamp the end time and flush; returns the trace file path if any
    pub async fn finalize(&self) -> Result<Option<PathBuf>> {
        let mut state = self.state.write().await;
        state.trace.end_time = Some(Utc::now());
        self.save(&state.trace).await?;
        Ok(self.file_path.clone())
    }

    async fn save(&self, trace: &SessionTrace) -> Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };

        let json =
            serde_json::to_string_pretty(trace).map_err(|e| TraceError::Persist {
                message: format!("failed to serialize session trace: {}", e),
            })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| TraceError::Persist {
                    message: format!("failed to create {}: {}", parent.display(), e),
                })?;
        }
        fs::write(path, json).await.map_err(|e| TraceError::Persist {
            message: format!("failed to write {}: {}", path.display(), e),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn user_input(message: &str) -> TraceEventKind {
        TraceEventKind::UserInput {
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn sequence_numbers_are_gapless() {
        let recorder = SessionTraceRecorder::new("test-model", "prompt");
        for i in 0..25u64 {
            let seq = recorder.record(user_input(&format!("msg {}", i))).await;
            assert_eq!(seq, i);
        }

        let trace = recorder.snapshot().await;
        for (index, event) in trace.events.iter().enumerate() {
            assert_eq!(event.seq, index as u64);
        }
    }

    #[tokio::test]
    async fn persists_and_loads_round_trip() {
        let dir = TempDir::new().unwrap();
        let recorder = SessionTraceRecorder::with_dir(dir.path(), "test-model", "prompt");
        recorder.record(user_input("hello")).await;
        recorder
            .record(TraceEventKind::LlmResponse {
                message: "hi there".to_string(),
            })
            .await;
        let path = recorder.finalize().await.unwrap().unwrap();

        let loaded = SessionTrace::load(&path).await.unwrap();
        assert_eq!(loaded.session_id, recorder.session_id());
        assert_eq!(loaded.model, "test-model");
        assert_eq!(loaded.events.len(), 2);
        assert!(loaded.end_time.is_some());
    }

    #[tokio::test]
    async fn load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = SessionTrace::load(dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Trace(TraceError::Load { .. })
        ));
    }

    #[tokio::test]
    async fn stats_derive_counts_and_tokens() {
        let recorder = SessionTraceRecorder::new("test-model", "prompt");
        recorder.record(user_input("hello")).await;
        recorder
            .record(TraceEventKind::TokenUsage {
                last: TokenUsage {
                    input_tokens: 10,
                    output_tokens: 5,
                    ..Default::default()
                },
                cumulative: TokenUsage {
                    input_tokens: 10,
                    output_tokens: 5,
                    ..Default::default()
                },
            })
            .await;
        recorder
            .record(TraceEventKind::TokenUsage {
                last: TokenUsage {
                    input_tokens: 7,
                    output_tokens: 3,
                    ..Default::default()
                },
                cumulative: TokenUsage {
                    input_tokens: 17,
                    output_tokens: 8,
                    ..Default::default()
                },
            })
            .await;

        let stats = recorder.snapshot().await.stats();
        assert_eq!(stats.event_count, 3);
        assert_eq!(stats.event_counts["user_input"], 1);
        assert_eq!(stats.event_counts["token_usage"], 2);
        assert_eq!(stats.total_tokens.input_tokens, 17);
        assert_eq!(stats.total_tokens.output_tokens, 8);
        assert!(stats.duration_ms.is_some());
    }

    #[tokio::test]
    async fn in_memory_recorder_has_no_file() {
        let recorder = SessionTraceRecorder::new("m", "p");
        recorder.record(user_input("x")).await;
        assert!(recorder.finalize().await.unwrap().is_none());
    }
}
