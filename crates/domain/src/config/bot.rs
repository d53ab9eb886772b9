use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BotConfig {
    /// Append the underlying error text to the generic failure reply.
    #[serde(default)]
    pub debug: bool,
}
