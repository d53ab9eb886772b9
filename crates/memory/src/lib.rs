//! Per-user conversation memory.
//!
//! The in-process history is capped and always written; the durable store,
//! when configured, is mirrored on write and preferred on read.

pub mod memory;
pub mod reader;

pub use memory::{ConversationMemory, MemoryStats};
pub use reader::{DurableRead, HistoryReader};
