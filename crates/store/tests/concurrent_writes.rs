use std::sync::Arc;

use chrono::Utc;
use sb_domain::clock;
use sb_domain::conversation::{ConversationTurn, TurnRole};
use sb_store::{ConversationStore, FileStore};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_saves_from_many_users_all_land() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path(), clock::system()).unwrap());

    let mut handles = Vec::new();
    for user in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let uid = format!("user-{user}");
            for i in 0..20 {
                let turn = ConversationTurn::new(&uid, TurnRole::User, format!("m{i}"), Utc::now());
                store.save(&turn).await.unwrap();
                // Interleave reads so the cache is filled mid-stream.
                if i % 5 == 0 {
                    store.fetch_recent(&uid, 100).await.unwrap();
                }
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    for user in 0..8 {
        let turns = store.fetch_recent(&format!("user-{user}"), 100).await.unwrap();
        assert_eq!(turns.len(), 20, "user-{user}");
    }

    // A fresh handle reads the same state from disk.
    let reopened = FileStore::open(dir.path(), clock::system()).unwrap();
    let turns = reopened.fetch_recent("user-3", 100).await.unwrap();
    assert_eq!(turns.len(), 20);
    assert_eq!(turns.last().unwrap().content, "m19");
}
