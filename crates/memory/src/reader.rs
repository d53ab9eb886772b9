//! Durable-first history reads.

use std::sync::Arc;

use sb_domain::conversation::ConversationTurn;
use sb_store::ConversationStore;

/// Outcome of a durable read attempt.
#[derive(Debug)]
pub enum DurableRead {
    Loaded(Vec<ConversationTurn>),
    /// The caller should use its in-process copy.  `reason` is for logs.
    Fallback { reason: String },
}

/// Tries the durable store and turns every kind of failure into
/// [`DurableRead::Fallback`].  Never returns an error.
#[derive(Clone, Default)]
pub struct HistoryReader {
    store: Option<Arc<dyn ConversationStore>>,
}

impl HistoryReader {
    pub fn new(store: Option<Arc<dyn ConversationStore>>) -> Self {
        Self { store }
    }

    pub fn is_durable(&self) -> bool {
        self.store.is_some()
    }

    pub async fn read(&self, user_id: &str, limit: usize) -> DurableRead {
        let Some(store) = &self.store else {
            return DurableRead::Fallback {
                reason: "persistence disabled".into(),
            };
        };

        match store.fetch_recent(user_id, limit).await {
            Ok(turns) if turns.is_empty() => DurableRead::Fallback {
                reason: "no durable history".into(),
            },
            Ok(turns) => DurableRead::Loaded(turns),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "durable history read failed");
                DurableRead::Fallback {
                    reason: e.to_string(),
                }
            }
        }
    }
}
