//! Session trace recording and read-back

pub mod event;
pub mod recorder;

pub use event::{TraceEvent, TraceEventKind};
pub use recorder::{SessionTrace, SessionTraceRecorder, TraceStats};
