use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Retention cleanup
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Upper bound accepted for either retention window (about a century).
pub const MAX_RETENTION_DAYS: u32 = 36_500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Time between purge cycles.
    #[serde(default = "d_interval")]
    pub interval_secs: u64,
    /// Conversation turns older than this are purged.
    #[serde(default = "d_conv_days")]
    pub conversation_retention_days: u32,
    /// Cached responses not accessed for this long are purged.
    #[serde(default = "d_cache_days")]
    pub cache_retention_days: u32,
    /// Sleep granularity; a stop request is observed within one slice.
    #[serde(default = "d_slice")]
    pub slice_secs: u64,
    /// Pause after a failed cycle before retrying.
    #[serde(default = "d_cooldown")]
    pub error_cooldown_secs: u64,
    /// How long `stop` waits for the worker to exit.
    #[serde(default = "d_stop_timeout")]
    pub stop_timeout_secs: u64,
}

impl CleanupConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
    pub fn slice(&self) -> Duration {
        Duration::from_secs(self.slice_secs)
    }
    pub fn error_cooldown(&self) -> Duration {
        Duration::from_secs(self.error_cooldown_secs)
    }
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_secs: d_interval(),
            conversation_retention_days: d_conv_days(),
            cache_retention_days: d_cache_days(),
            slice_secs: d_slice(),
            error_cooldown_secs: d_cooldown(),
            stop_timeout_secs: d_stop_timeout(),
        }
    }
}

fn d_interval() -> u64 {
    3_600
}
fn d_conv_days() -> u32 {
    30
}
fn d_cache_days() -> u32 {
    7
}
fn d_slice() -> u64 {
    10
}
fn d_cooldown() -> u64 {
    60
}
fn d_stop_timeout() -> u64 {
    5
}
