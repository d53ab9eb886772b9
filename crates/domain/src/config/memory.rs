use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation memory
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Mirror turns into the durable store and prefer it on reads.
    #[serde(default = "d_true")]
    pub enabled: bool,
    /// In-process cap on turns kept per user.
    #[serde(default = "d_max_messages")]
    pub max_messages: usize,
    /// How many recent turns are forwarded to the agent.
    #[serde(default = "d_context_limit")]
    pub context_limit: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_messages: d_max_messages(),
            context_limit: d_context_limit(),
        }
    }
}

fn d_true() -> bool {
    true
}
fn d_max_messages() -> usize {
    50
}
fn d_context_limit() -> usize {
    10
}
