use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Logging configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Log output for the long-running `chat` process.  One-shot commands
/// always log compactly to stderr.  `RUST_LOG` overrides `default_filter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Emit one JSON object per log record.
    #[serde(default = "d_json_logs")]
    pub json_logs: bool,

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "d_default_filter")]
    pub default_filter: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            json_logs: d_json_logs(),
            default_filter: d_default_filter(),
        }
    }
}

fn d_json_logs() -> bool {
    true
}

fn d_default_filter() -> String {
    "info,sb_bot=debug".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: ObservabilityConfig = toml::from_str("").unwrap();
        assert!(cfg.json_logs);
        assert_eq!(cfg.default_filter, "info,sb_bot=debug");
    }

    #[test]
    fn deserialize_overrides() {
        let cfg: ObservabilityConfig = toml::from_str(
            r#"
            json_logs = false
            default_filter = "warn"
            "#,
        )
        .unwrap();
        assert!(!cfg.json_logs);
        assert_eq!(cfg.default_filter, "warn");
    }
}
