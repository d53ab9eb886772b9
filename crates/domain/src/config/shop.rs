use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// WooCommerce REST connection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopConfig {
    /// Site root, e.g. `https://shop.example.com`.
    #[serde(default)]
    pub base_url: String,
    /// Environment variable holding the consumer key.
    #[serde(default = "d_key_env")]
    pub consumer_key_env: String,
    /// Environment variable holding the consumer secret.
    #[serde(default = "d_secret_env")]
    pub consumer_secret_env: String,
    #[serde(default = "d_api_version")]
    pub api_version: String,
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
    /// Extra attempts for reads that fail with a 5xx or a timeout.
    #[serde(default = "d_max_retries")]
    pub max_retries: u32,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            consumer_key_env: d_key_env(),
            consumer_secret_env: d_secret_env(),
            api_version: d_api_version(),
            timeout_ms: d_timeout_ms(),
            max_retries: d_max_retries(),
        }
    }
}

fn d_key_env() -> String {
    "WOO_CONSUMER_KEY".into()
}
fn d_secret_env() -> String {
    "WOO_CONSUMER_SECRET".into()
}
fn d_api_version() -> String {
    "wc/v3".into()
}
fn d_timeout_ms() -> u64 {
    30_000
}
fn d_max_retries() -> u32 {
    2
}
