//! Agent-managed memory: command set and sandboxed file store

pub mod command;
pub mod store;

pub use command::MemoryCommand;
pub use store::{MemoryFileInfo, MemoryStore, MEMORY_ROOT};
