//! Shared types for the shopbot crates: the error type, the configuration
//! tree, structured trace events, the clock abstraction, conversation turns
//! and the provider-agnostic tool/message shapes used by the agent.

pub mod clock;
pub mod config;
pub mod conversation;
pub mod error;
pub mod tool;
pub mod trace;
