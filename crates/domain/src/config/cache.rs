use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Call cache + quick answers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Process-wide switch for the expiring call cache.  When off, every
    /// lookup computes.
    #[serde(default = "d_true")]
    pub enabled: bool,
    /// Default expiry window for cached calls, in seconds.
    #[serde(default = "d_expiry")]
    pub expiry_secs: u64,
    /// Upper bound on runtime quick-answer entries.  `0` means unbounded.
    #[serde(default = "d_quick_capacity")]
    pub quick_answer_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            expiry_secs: d_expiry(),
            quick_answer_capacity: d_quick_capacity(),
        }
    }
}

fn d_true() -> bool {
    true
}
fn d_expiry() -> u64 {
    300
}
fn d_quick_capacity() -> usize {
    1024
}
