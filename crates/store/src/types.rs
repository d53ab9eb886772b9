use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use sb_domain::error::{Error, Result};

/// Default language for new users.
pub const DEFAULT_LANGUAGE: &str = "he";

/// Hex SHA-256 of `text`.  Keys cached-response rows and names the
/// per-user conversation logs.
pub fn query_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cached responses
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedResponseRow {
    pub query_hash: String,
    pub query: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    #[serde(default)]
    pub access_count: u64,
}

impl CachedResponseRow {
    pub fn new(query: &str, response: &str, now: DateTime<Utc>) -> Self {
        Self {
            query_hash: query_hash(query),
            query: query.to_owned(),
            response: response.to_owned(),
            created_at: now,
            last_accessed: now,
            access_count: 0,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_accessed = now;
        self.access_count += 1;
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// User preferences
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPreference {
    pub user_id: String,
    pub language: String,
    pub notifications_enabled: bool,
    /// Anything that is not one of the typed fields above.
    #[serde(default)]
    pub preferences: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserPreference {
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_owned(),
            language: DEFAULT_LANGUAGE.to_owned(),
            notifications_enabled: true,
            preferences: serde_json::Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply one `key = value` update.
    pub fn apply(&mut self, key: &str, value: serde_json::Value, now: DateTime<Utc>) -> Result<()> {
        match key {
            "language" => {
                let lang = value
                    .as_str()
                    .ok_or_else(|| Error::Store("language must be a string".into()))?;
                self.language = lang.to_owned();
            }
            "notifications_enabled" => {
                self.notifications_enabled = value
                    .as_bool()
                    .ok_or_else(|| Error::Store("notifications_enabled must be a boolean".into()))?;
            }
            other => {
                self.preferences.insert(other.to_owned(), value);
            }
        }
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_hash_is_stable_hex() {
        let h = query_hash("מה אתה יכול לעשות");
        assert_eq!(h.len(), 64);
        assert_eq!(h, query_hash("מה אתה יכול לעשות"));
        assert_ne!(h, query_hash("something else"));
    }

    #[test]
    fn preference_defaults() {
        let p = UserPreference::new("42", Utc::now());
        assert_eq!(p.language, "he");
        assert!(p.notifications_enabled);
        assert!(p.preferences.is_empty());
    }

    #[test]
    fn typed_keys_update_fields_others_go_to_map() {
        let now = Utc::now();
        let mut p = UserPreference::new("42", now);
        p.apply("language", json!("en"), now).unwrap();
        p.apply("notifications_enabled", json!(false), now).unwrap();
        p.apply("currency", json!("ILS"), now).unwrap();

        assert_eq!(p.language, "en");
        assert!(!p.notifications_enabled);
        assert_eq!(p.preferences.get("currency"), Some(&json!("ILS")));
        assert!(!p.preferences.contains_key("language"));
    }

    #[test]
    fn wrongly_typed_language_is_rejected() {
        let now = Utc::now();
        let mut p = UserPreference::new("42", now);
        assert!(p.apply("language", json!(7), now).is_err());
        assert_eq!(p.language, "he");
    }
}
