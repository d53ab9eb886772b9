//! Memory behaviour against fake durable stores.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use sb_domain::clock;
use sb_domain::config::MemoryConfig;
use sb_domain::conversation::{ConversationTurn, TurnRole};
use sb_domain::error::{Error, Result};
use sb_memory::ConversationMemory;
use sb_store::ConversationStore;

/// Every call fails.
#[derive(Default)]
struct BrokenStore {
    calls: AtomicUsize,
}

#[async_trait]
impl ConversationStore for BrokenStore {
    async fn save(&self, _turn: &ConversationTurn) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Store("connection refused".into()))
    }

    async fn fetch_recent(&self, _user_id: &str, _limit: usize) -> Result<Vec<ConversationTurn>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Store("connection refused".into()))
    }

    async fn delete_all(&self, _user_id: &str) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Store("connection refused".into()))
    }

    async fn purge_older_than(&self, _cutoff: DateTime<Utc>) -> Result<u64> {
        Err(Error::Store("connection refused".into()))
    }
}

/// Accepts writes but never has anything to read back.
#[derive(Default)]
struct EmptyStore {
    fetches: AtomicUsize,
}

#[async_trait]
impl ConversationStore for EmptyStore {
    async fn save(&self, _turn: &ConversationTurn) -> Result<()> {
        Ok(())
    }

    async fn fetch_recent(&self, _user_id: &str, _limit: usize) -> Result<Vec<ConversationTurn>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn delete_all(&self, _user_id: &str) -> Result<u64> {
        Ok(0)
    }

    async fn purge_older_than(&self, _cutoff: DateTime<Utc>) -> Result<u64> {
        Ok(0)
    }
}

/// Keeps everything in a vector.
#[derive(Default)]
struct VecStore {
    turns: Mutex<Vec<ConversationTurn>>,
}

#[async_trait]
impl ConversationStore for VecStore {
    async fn save(&self, turn: &ConversationTurn) -> Result<()> {
        self.turns.lock().push(turn.clone());
        Ok(())
    }

    async fn fetch_recent(&self, user_id: &str, limit: usize) -> Result<Vec<ConversationTurn>> {
        let turns: Vec<_> = self
            .turns
            .lock()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        let skip = turns.len().saturating_sub(limit);
        Ok(turns.into_iter().skip(skip).collect())
    }

    async fn delete_all(&self, user_id: &str) -> Result<u64> {
        let mut turns = self.turns.lock();
        let before = turns.len();
        turns.retain(|t| t.user_id != user_id);
        Ok((before - turns.len()) as u64)
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut turns = self.turns.lock();
        let before = turns.len();
        turns.retain(|t| t.timestamp >= cutoff);
        Ok((before - turns.len()) as u64)
    }
}

fn config(max_messages: usize) -> MemoryConfig {
    MemoryConfig {
        enabled: true,
        max_messages,
        context_limit: 4,
    }
}

#[tokio::test]
async fn failing_store_falls_back_silently() {
    let store = Arc::new(BrokenStore::default());
    let memory = ConversationMemory::new(&config(10), Some(store.clone()), clock::system());

    for i in 0..6 {
        memory.add_message("u", TurnRole::User, &format!("m{i}")).await;
    }
    let turns = memory.get_conversation("u", Some(3)).await;
    let contents: Vec<_> = turns.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(contents, ["m3", "m4", "m5"]);
    // 6 saves + 1 fetch were attempted.
    assert_eq!(store.calls.load(Ordering::SeqCst), 7);
}

#[tokio::test]
async fn empty_durable_result_falls_back_to_local_turns() {
    let store = Arc::new(EmptyStore::default());
    let memory = ConversationMemory::new(&config(10), Some(store.clone()), clock::system());

    memory.add_message("u", TurnRole::User, "list products").await;
    memory.add_message("u", TurnRole::Assistant, "here they are").await;
    memory.add_message("u", TurnRole::User, "only the blue ones").await;

    let turns = memory.get_conversation("u", Some(2)).await;
    let contents: Vec<_> = turns.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(contents, ["here they are", "only the blue ones"]);

    let history = memory.get_conversation_for_agent("u", Some(2)).await;
    let contents: Vec<_> = history.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["here they are", "only the blue ones"]);
    assert_eq!(history[0].role, TurnRole::Assistant);
    assert_eq!(history[1].role, TurnRole::User);

    // The durable store was asked both times.
    assert_eq!(store.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failing_delete_still_clears_local_copy() {
    let store = Arc::new(BrokenStore::default());
    let memory = ConversationMemory::new(&config(10), Some(store), clock::system());

    memory.add_message("u", TurnRole::User, "hello").await;
    memory.clear_conversation("u").await;
    memory.clear_conversation("u").await;
    assert!(memory.get_conversation("u", None).await.is_empty());
}

#[tokio::test]
async fn durable_history_is_preferred_across_restarts() {
    let store = Arc::new(VecStore::default());
    {
        let memory = ConversationMemory::new(&config(10), Some(store.clone()), clock::system());
        memory.add_message("u", TurnRole::User, "before restart").await;
        memory.add_message("u", TurnRole::Assistant, "noted").await;
    }

    let memory = ConversationMemory::new(&config(10), Some(store), clock::system());
    assert_eq!(memory.get_stats().total_messages, 0);
    let history = memory.get_conversation_for_agent("u", None).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "before restart");
    assert_eq!(history[1].role, TurnRole::Assistant);
}

#[tokio::test]
async fn durable_read_is_not_bounded_by_local_cap() {
    let store = Arc::new(VecStore::default());
    let memory = ConversationMemory::new(&config(3), Some(store.clone()), clock::system());

    for i in 0..8 {
        memory.add_message("u", TurnRole::User, &format!("m{i}")).await;
    }
    // In-process copy stays capped...
    assert_eq!(memory.get_stats().total_messages, 3);
    // ...while the durable copy keeps everything until purged.
    assert_eq!(store.turns.lock().len(), 8);
    assert_eq!(memory.get_conversation("u", Some(5)).await.len(), 5);
}

#[tokio::test]
async fn clear_removes_durable_turns() {
    let store = Arc::new(VecStore::default());
    let memory = ConversationMemory::new(&config(10), Some(store.clone()), clock::system());

    memory.add_message("u", TurnRole::User, "a").await;
    memory.add_message("other", TurnRole::User, "b").await;
    memory.clear_conversation("u").await;

    assert!(memory.get_conversation("u", None).await.is_empty());
    assert_eq!(store.turns.lock().len(), 1);
    assert!(memory.get_stats().persistence);
}
