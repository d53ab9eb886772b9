//! Store contracts consumed by memory, the cleanup scheduler and the
//! assistant pipeline.
//!
//! Every method is fallible.  Callers decide whether a failure is soft
//! (memory and cleanup log and move on) or surfaces to the user.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sb_domain::conversation::ConversationTurn;
use sb_domain::error::Result;

use crate::types::UserPreference;

/// Durable append-only log of per-user conversation turns.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append one turn.
    async fn save(&self, turn: &ConversationTurn) -> Result<()>;

    /// Up to `limit` most recent turns for `user_id`, oldest first.
    /// Unknown users yield an empty list.
    async fn fetch_recent(&self, user_id: &str, limit: usize) -> Result<Vec<ConversationTurn>>;

    /// Delete every turn for `user_id`, returning how many were removed.
    async fn delete_all(&self, user_id: &str) -> Result<u64>;

    /// Delete every turn (all users) with a timestamp before `cutoff`.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// Durable table of answers to previously seen questions.
#[async_trait]
pub trait CacheRowStore: Send + Sync {
    /// Stored answer for `query`.  A hit refreshes the row's access time
    /// and bumps its access count.
    async fn get_cached_response(&self, query: &str) -> Result<Option<String>>;

    /// Insert or replace the answer for `query`.
    async fn save_cached_response(&self, query: &str, response: &str) -> Result<()>;

    /// Delete rows last accessed before `cutoff`.
    async fn purge_unaccessed_since(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// Per-user settings with get-or-create semantics.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get_preferences(&self, user_id: &str) -> Result<UserPreference>;

    /// `language` and `notifications_enabled` update the typed fields; any
    /// other key lands in the free-form map.
    async fn update_preference(
        &self,
        user_id: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<UserPreference>;
}
