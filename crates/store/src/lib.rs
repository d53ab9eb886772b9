//! Durable storage for the bot.
//!
//! The traits in [`provider`] are what the rest of the workspace depends on;
//! [`FileStore`] is the local-filesystem backend.  Conversation turns are
//! kept in one append-only JSONL log per user, cached responses and user
//! preferences in small JSON documents.

pub mod file;
pub mod provider;
pub mod types;

pub use file::FileStore;
pub use provider::{CacheRowStore, ConversationStore, PreferenceStore};
pub use types::{query_hash, CachedResponseRow, UserPreference};
