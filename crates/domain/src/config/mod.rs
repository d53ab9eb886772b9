mod bot;
mod cache;
mod cleanup;
mod llm;
mod memory;
mod observability;
mod shop;
mod storage;

pub use bot::*;
pub use cache::*;
pub use cleanup::*;
pub use llm::*;
pub use memory::*;
pub use observability::*;
pub use shop::*;
pub use storage::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub shop: ShopConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn error(field: &str, message: &str) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: &str, message: &str) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.cache.enabled && self.cache.expiry_secs == 0 {
            errors.push(ConfigError::warning(
                "cache.expiry_secs",
                "expiry of 0 seconds makes every lookup a miss",
            ));
        }

        if self.memory.max_messages == 0 {
            errors.push(ConfigError::error(
                "memory.max_messages",
                "must be greater than 0",
            ));
        }

        if self.memory.context_limit > self.memory.max_messages {
            errors.push(ConfigError::warning(
                "memory.context_limit",
                "larger than memory.max_messages; the agent never sees more than the cap",
            ));
        }

        if self.storage.enabled && self.storage.state_path.as_os_str().is_empty() {
            errors.push(ConfigError::error(
                "storage.state_path",
                "must not be empty when storage is enabled",
            ));
        }

        if self.cleanup.interval_secs == 0 {
            errors.push(ConfigError::error(
                "cleanup.interval_secs",
                "must be greater than 0",
            ));
        }

        if self.cleanup.slice_secs == 0 {
            errors.push(ConfigError::error(
                "cleanup.slice_secs",
                "must be greater than 0",
            ));
        }

        for (field, days) in [
            (
                "cleanup.conversation_retention_days",
                self.cleanup.conversation_retention_days,
            ),
            ("cleanup.cache_retention_days", self.cleanup.cache_retention_days),
        ] {
            if days > MAX_RETENTION_DAYS {
                errors.push(ConfigError::error(
                    field,
                    &format!("must be at most {MAX_RETENTION_DAYS} days"),
                ));
            }
        }

        if self.shop.base_url.is_empty() {
            errors.push(ConfigError::warning(
                "shop.base_url",
                "no shop configured; store tools will fail",
            ));
        }

        if std::env::var(&self.llm.api_key_env).is_err() {
            errors.push(ConfigError::warning(
                "llm.api_key_env",
                "environment variable is not set; the agent cannot be called",
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            errors.push(ConfigError::error(
                "llm.temperature",
                "must be between 0.0 and 2.0",
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert!(cfg.cache.enabled);
        assert_eq!(cfg.cache.expiry_secs, 300);
        assert_eq!(cfg.memory.max_messages, 50);
        assert_eq!(cfg.memory.context_limit, 10);
        assert_eq!(cfg.cleanup.conversation_retention_days, 30);
        assert_eq!(cfg.cleanup.cache_retention_days, 7);
        assert!(!cfg.bot.debug);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [memory]
            max_messages = 5

            [cleanup]
            interval_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(cfg.memory.max_messages, 5);
        assert_eq!(cfg.memory.context_limit, 10);
        assert_eq!(cfg.cleanup.interval_secs, 60);
        assert_eq!(cfg.cleanup.slice_secs, 10);
    }

    #[test]
    fn zero_cap_is_an_error() {
        let mut cfg = Config::default();
        cfg.memory.max_messages = 0;
        let issues = cfg.validate();
        assert!(issues
            .iter()
            .any(|e| e.field == "memory.max_messages" && e.severity == ConfigSeverity::Error));
    }

    #[test]
    fn context_larger_than_cap_warns() {
        let mut cfg = Config::default();
        cfg.memory.max_messages = 4;
        cfg.memory.context_limit = 8;
        let issues = cfg.validate();
        assert!(issues
            .iter()
            .any(|e| e.field == "memory.context_limit" && e.severity == ConfigSeverity::Warning));
    }

    #[test]
    fn retention_beyond_a_century_is_an_error() {
        let mut cfg = Config::default();
        cfg.cleanup.conversation_retention_days = 100_000_000;
        cfg.cleanup.cache_retention_days = MAX_RETENTION_DAYS + 1;
        let issues = cfg.validate();
        for field in [
            "cleanup.conversation_retention_days",
            "cleanup.cache_retention_days",
        ] {
            assert!(issues
                .iter()
                .any(|e| e.field == field && e.severity == ConfigSeverity::Error));
        }

        cfg.cleanup.conversation_retention_days = MAX_RETENTION_DAYS;
        cfg.cleanup.cache_retention_days = MAX_RETENTION_DAYS;
        assert!(!cfg
            .validate()
            .iter()
            .any(|e| e.field.starts_with("cleanup.") && e.field.ends_with("_retention_days")));
    }

    #[test]
    fn display_includes_severity_tag() {
        let e = ConfigError::error("cleanup.interval_secs", "must be greater than 0");
        assert_eq!(
            e.to_string(),
            "[ERROR] cleanup.interval_secs: must be greater than 0"
        );
    }
}
