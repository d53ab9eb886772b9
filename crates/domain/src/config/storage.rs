use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Durable store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// When off, nothing is persisted and the cleanup scheduler refuses to
    /// start.
    #[serde(default = "d_true")]
    pub enabled: bool,
    /// Directory holding conversation logs, cached responses and
    /// preferences.
    #[serde(default = "d_state_path")]
    pub state_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            state_path: d_state_path(),
        }
    }
}

fn d_true() -> bool {
    true
}
fn d_state_path() -> PathBuf {
    PathBuf::from("./data")
}
