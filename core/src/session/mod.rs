//! Conversation session: the tool-execution loop and its event stream

pub mod core;
pub mod events;

pub use self::core::{Session, TurnOutcome};
pub use self::events::{StreamEvent, TokenReport};
