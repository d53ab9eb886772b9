//! The per-message pipeline.
//!
//! 1. record the user turn
//! 2. quick answers (canned, runtime cache, keywords, similar questions)
//! 3. durable cached responses
//! 4. the agent, with the recent conversation as context
//! 5. record the assistant turn
//!
//! Agent answers to general questions are remembered in both the runtime
//! quick-answer cache and the durable cached-response table.

use std::sync::Arc;

use serde::Serialize;

use sb_agent::Agent;
use sb_cache::{is_general_question, normalize, AnswerSource, CallCache, QuickAnswers};
use sb_domain::conversation::{AgentMessage, TurnRole};
use sb_memory::{ConversationMemory, MemoryStats};
use sb_store::CacheRowStore;

/// Reply shown to the user when the agent fails.
pub const GENERIC_FAILURE: &str = "מצטער, לא הצלחתי לעבד את הבקשה שלך. נסה שוב מאוחר יותר.";

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Canned,
    Cached,
    Keyword,
    Similar,
    Stored,
    Agent,
    Failed,
}

impl From<AnswerSource> for ReplySource {
    fn from(source: AnswerSource) -> Self {
        match source {
            AnswerSource::Canned => Self::Canned,
            AnswerSource::Cached => Self::Cached,
            AnswerSource::Keyword => Self::Keyword,
            AnswerSource::Similar => Self::Similar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

impl Reply {
    fn new(text: impl Into<String>, source: ReplySource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.source == ReplySource::Failed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssistantStats {
    pub memory: MemoryStats,
    pub call_cache_entries: usize,
    pub quick_answers: usize,
}

pub struct Assistant {
    memory: Arc<ConversationMemory>,
    quick: Arc<QuickAnswers>,
    /// `None` when persistence is disabled.
    responses: Option<Arc<dyn CacheRowStore>>,
    agent: Arc<dyn Agent>,
    call_cache: Arc<CallCache>,
    debug: bool,
}

impl Assistant {
    pub fn new(
        memory: Arc<ConversationMemory>,
        quick: Arc<QuickAnswers>,
        responses: Option<Arc<dyn CacheRowStore>>,
        agent: Arc<dyn Agent>,
        call_cache: Arc<CallCache>,
        debug: bool,
    ) -> Self {
        Self {
            memory,
            quick,
            responses,
            agent,
            call_cache,
            debug,
        }
    }

    /// Answer one message from `user_id`.  Never fails: errors become the
    /// generic failure reply.
    pub async fn handle(&self, user_id: &str, text: &str) -> Reply {
        tracing::info!(user_id = %user_id, chars = text.chars().count(), "message received");

        self.memory.add_message(user_id, TurnRole::User, text).await;
        let reply = self.answer(user_id, text).await;

        // Failure text is not conversation content.
        if !reply.is_failure() {
            self.memory
                .add_message(user_id, TurnRole::Assistant, &reply.text)
                .await;
        }

        tracing::info!(user_id = %user_id, source = ?reply.source, "reply ready");
        reply
    }

    /// Forget the user's conversation.
    pub async fn reset(&self, user_id: &str) {
        self.memory.clear_conversation(user_id).await;
    }

    /// Drop every cached shop read.  Returns how many entries were removed.
    pub fn clear_cache(&self) -> usize {
        self.call_cache.clear_all()
    }

    pub fn stats(&self) -> AssistantStats {
        AssistantStats {
            memory: self.memory.get_stats(),
            call_cache_entries: self.call_cache.len(),
            quick_answers: self.quick.len(),
        }
    }

    // ── Private helpers ──────────────────────────────────────────────

    async fn answer(&self, user_id: &str, text: &str) -> Reply {
        if let Some(hit) = self.quick.lookup(text) {
            return Reply::new(hit.text, hit.source.into());
        }

        let question = normalize(text);
        if let Some(stored) = self.stored_answer(&question).await {
            self.quick.remember(text, &stored);
            return Reply::new(stored, ReplySource::Stored);
        }

        let history = self.history_without_current(user_id, text).await;
        match self.agent.respond(text, &history).await {
            Ok(answer) => {
                if is_general_question(text) {
                    self.remember_answer(text, &question, &answer).await;
                }
                Reply::new(answer, ReplySource::Agent)
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "agent failed");
                let mut reply = GENERIC_FAILURE.to_owned();
                if self.debug {
                    reply.push_str(&format!("\n\nפרטי שגיאה: {e}"));
                }
                Reply::new(reply, ReplySource::Failed)
            }
        }
    }

    async fn stored_answer(&self, question: &str) -> Option<String> {
        let store = self.responses.as_ref()?;
        match store.get_cached_response(question).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "cached response lookup failed");
                None
            }
        }
    }

    async fn remember_answer(&self, text: &str, question: &str, answer: &str) {
        tracing::debug!(question = %question, "remembering answer to general question");
        self.quick.remember(text, answer);
        if let Some(store) = &self.responses {
            if let Err(e) = store.save_cached_response(question, answer).await {
                tracing::warn!(error = %e, "failed to store cached response");
            }
        }
    }

    /// The agent receives the current message separately, so drop it from
    /// the tail of the history it was just appended to.
    async fn history_without_current(&self, user_id: &str, text: &str) -> Vec<AgentMessage> {
        let mut history = self.memory.get_conversation_for_agent(user_id, None).await;
        if history
            .last()
            .is_some_and(|m| m.role == TurnRole::User && m.content == text)
        {
            history.pop();
        }
        history
    }
}
