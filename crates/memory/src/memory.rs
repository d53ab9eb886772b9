use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use sb_domain::clock::Clock;
use sb_domain::config::MemoryConfig;
use sb_domain::conversation::{AgentMessage, ConversationTurn, TurnRole};
use sb_domain::trace::TraceEvent;
use sb_store::ConversationStore;

use crate::reader::{DurableRead, HistoryReader};

/// Snapshot returned by [`ConversationMemory::get_stats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStats {
    pub total_users: usize,
    pub total_messages: usize,
    pub avg_messages_per_user: f64,
    pub max_messages_per_user: usize,
    pub persistence: bool,
}

/// Bounded per-user history with an optional durable mirror.
///
/// The cap applies to the in-process copy only and is enforced on append,
/// so the read path (durable or not) can never grow it.  The lock is never
/// held across a store call.
pub struct ConversationMemory {
    max_messages: usize,
    context_limit: usize,
    clock: Arc<dyn Clock>,
    conversations: Mutex<HashMap<String, VecDeque<ConversationTurn>>>,
    store: Option<Arc<dyn ConversationStore>>,
    reader: HistoryReader,
}

impl ConversationMemory {
    /// `store` is `None` when persistence is disabled.
    pub fn new(
        cfg: &MemoryConfig,
        store: Option<Arc<dyn ConversationStore>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = if cfg.enabled { store } else { None };
        tracing::info!(
            max_messages = cfg.max_messages,
            context_limit = cfg.context_limit,
            persistence = store.is_some(),
            "conversation memory initialized"
        );
        Self {
            max_messages: cfg.max_messages,
            context_limit: cfg.context_limit,
            clock,
            conversations: Mutex::new(HashMap::new()),
            reader: HistoryReader::new(store.clone()),
            store,
        }
    }

    pub fn persistence_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Record a turn.  Persistence failures are logged; the in-process copy
    /// is updated regardless.
    pub async fn add_message(
        &self,
        user_id: &str,
        role: TurnRole,
        content: &str,
    ) -> ConversationTurn {
        let turn = ConversationTurn::new(user_id, role, content, self.clock.now());

        {
            let mut conversations = self.conversations.lock();
            let history = conversations.entry(user_id.to_owned()).or_default();
            history.push_back(turn.clone());
            while history.len() > self.max_messages {
                history.pop_front();
            }
        }

        tracing::debug!(
            user_id = %user_id,
            role = %role,
            content_len = content.len(),
            "added message"
        );

        if let Some(store) = &self.store {
            let ok = match store.save(&turn).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(
                        user_id = %user_id,
                        message_id = %turn.message_id,
                        error = %e,
                        "failed to persist turn"
                    );
                    false
                }
            };
            TraceEvent::TurnPersisted {
                user_id: user_id.to_owned(),
                message_id: turn.message_id.clone(),
                ok,
            }
            .emit();
        }

        turn
    }

    /// Recent history, oldest first.  `limit` defaults to the storage cap;
    /// `Some(0)` is treated the same as `None`.
    pub async fn get_conversation(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Vec<ConversationTurn> {
        let limit = limit.filter(|n| *n > 0).unwrap_or(self.max_messages);

        match self.reader.read(user_id, limit).await {
            DurableRead::Loaded(turns) => turns,
            DurableRead::Fallback { reason } => {
                let local = self.local_tail(user_id, limit);
                if self.reader.is_durable() {
                    tracing::debug!(
                        user_id = %user_id,
                        reason = %reason,
                        local_turns = local.len(),
                        "using in-process history"
                    );
                    TraceEvent::HistoryFallback {
                        user_id: user_id.to_owned(),
                        reason,
                        local_turns: local.len(),
                    }
                    .emit();
                }
                local
            }
        }
    }

    /// History projected to `{role, content}` pairs.  `limit` defaults to
    /// the context window, not the storage cap.
    pub async fn get_conversation_for_agent(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Vec<AgentMessage> {
        let limit = limit.filter(|n| *n > 0).unwrap_or(self.context_limit);
        self.get_conversation(user_id, Some(limit))
            .await
            .iter()
            .map(ConversationTurn::to_agent_message)
            .collect()
    }

    /// Forget a user's history in-process and, if enabled, durably.
    /// A durable failure is logged and does not undo the local clear.
    pub async fn clear_conversation(&self, user_id: &str) {
        if let Some(history) = self.conversations.lock().get_mut(user_id) {
            history.clear();
        }

        if let Some(store) = &self.store {
            match store.delete_all(user_id).await {
                Ok(n) => tracing::info!(user_id = %user_id, deleted = n, "cleared conversation"),
                Err(e) => tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "failed to delete durable conversation"
                ),
            }
        } else {
            tracing::info!(user_id = %user_id, "cleared conversation");
        }
    }

    pub fn get_stats(&self) -> MemoryStats {
        let conversations = self.conversations.lock();
        let total_users = conversations.len();
        let total_messages: usize = conversations.values().map(VecDeque::len).sum();
        let avg_messages_per_user = if total_users > 0 {
            total_messages as f64 / total_users as f64
        } else {
            0.0
        };
        MemoryStats {
            total_users,
            total_messages,
            avg_messages_per_user,
            max_messages_per_user: self.max_messages,
            persistence: self.store.is_some(),
        }
    }

    fn local_tail(&self, user_id: &str, limit: usize) -> Vec<ConversationTurn> {
        let conversations = self.conversations.lock();
        match conversations.get(user_id) {
            Some(history) => {
                let skip = history.len().saturating_sub(limit);
                history.iter().skip(skip).cloned().collect()
            }
            None => Vec::new(),
        }
    }
}
