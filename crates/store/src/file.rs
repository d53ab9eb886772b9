//! Local-filesystem store.
//!
//! Layout under the state path:
//!
//! ```text
//! conversations/<sha256(user_id)>.jsonl   one turn per line, append-only
//! cached_responses.json                   query_hash -> CachedResponseRow
//! preferences.json                        user_id -> UserPreference
//! ```
//!
//! All file I/O runs on `spawn_blocking`.  Each conversation log keeps its
//! newest [`CACHED_TAIL`] turns in memory, so steady-state reads of recent
//! history never touch disk.  A corrupt JSON document is moved aside to
//! `<name>.json.corrupt` and the store starts that document empty.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;

use sb_domain::clock::Clock;
use sb_domain::conversation::ConversationTurn;
use sb_domain::error::{Error, Result};

use crate::provider::{CacheRowStore, ConversationStore, PreferenceStore};
use crate::types::{query_hash, CachedResponseRow, UserPreference};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FileStore
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct FileStore {
    root: PathBuf,
    clock: Arc<dyn Clock>,
    conversations: Arc<ConversationLog>,
    responses: Arc<JsonDoc<CachedResponseRow>>,
    preferences: Arc<JsonDoc<UserPreference>>,
}

impl FileStore {
    /// Open (creating if needed) the store rooted at `state_path`.
    pub fn open(state_path: &Path, clock: Arc<dyn Clock>) -> Result<Self> {
        let conversations_dir = state_path.join("conversations");
        std::fs::create_dir_all(&conversations_dir).map_err(Error::Io)?;

        let responses = JsonDoc::load(state_path.join("cached_responses.json"))?;
        let preferences = JsonDoc::load(state_path.join("preferences.json"))?;

        tracing::info!(
            path = %state_path.display(),
            cached_responses = responses.len(),
            users_with_preferences = preferences.len(),
            "file store opened"
        );

        Ok(Self {
            root: state_path.to_path_buf(),
            clock,
            conversations: Arc::new(ConversationLog::new(conversations_dir)),
            responses: Arc::new(responses),
            preferences: Arc::new(preferences),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ConversationStore for FileStore {
    async fn save(&self, turn: &ConversationTurn) -> Result<()> {
        let log = self.conversations.clone();
        let turn = turn.clone();
        blocking(move || log.append(turn)).await
    }

    async fn fetch_recent(&self, user_id: &str, limit: usize) -> Result<Vec<ConversationTurn>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        if let Some(turns) = self.conversations.recent(user_id, limit) {
            return Ok(turns);
        }
        let log = self.conversations.clone();
        let uid = user_id.to_owned();
        blocking(move || log.load_recent(&uid, limit)).await
    }

    async fn delete_all(&self, user_id: &str) -> Result<u64> {
        let log = self.conversations.clone();
        let uid = user_id.to_owned();
        blocking(move || log.delete(&uid)).await
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let log = self.conversations.clone();
        blocking(move || log.purge(cutoff)).await
    }
}

#[async_trait]
impl CacheRowStore for FileStore {
    async fn get_cached_response(&self, query: &str) -> Result<Option<String>> {
        let key = query_hash(query);
        let now = self.clock.now();
        let hit = self.responses.update(|rows| {
            rows.get_mut(&key).map(|row| {
                row.touch(now);
                row.response.clone()
            })
        });
        if hit.is_some() {
            self.flush_responses().await?;
        }
        Ok(hit)
    }

    async fn save_cached_response(&self, query: &str, response: &str) -> Result<()> {
        let key = query_hash(query);
        let now = self.clock.now();
        self.responses.update(|rows| {
            rows.entry(key)
                .and_modify(|row| {
                    row.response = response.to_owned();
                    row.last_accessed = now;
                })
                .or_insert_with(|| CachedResponseRow::new(query, response, now));
        });
        self.flush_responses().await
    }

    async fn purge_unaccessed_since(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let removed = self.responses.update(|rows| {
            let before = rows.len();
            rows.retain(|_, row| row.last_accessed >= cutoff);
            (before - rows.len()) as u64
        });
        if removed > 0 {
            self.flush_responses().await?;
        }
        Ok(removed)
    }
}

#[async_trait]
impl PreferenceStore for FileStore {
    async fn get_preferences(&self, user_id: &str) -> Result<UserPreference> {
        if let Some(existing) = self.preferences.get(user_id) {
            return Ok(existing);
        }
        let now = self.clock.now();
        let created = self.preferences.update(|prefs| {
            prefs
                .entry(user_id.to_owned())
                .or_insert_with(|| UserPreference::new(user_id, now))
                .clone()
        });
        tracing::debug!(user_id = %user_id, "created default preferences");
        self.flush_preferences().await?;
        Ok(created)
    }

    async fn update_preference(
        &self,
        user_id: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<UserPreference> {
        let now = self.clock.now();
        let updated = self.preferences.update(|prefs| {
            let entry = prefs
                .entry(user_id.to_owned())
                .or_insert_with(|| UserPreference::new(user_id, now));
            entry.apply(key, value, now).map(|()| entry.clone())
        })?;
        self.flush_preferences().await?;
        Ok(updated)
    }
}

impl FileStore {
    async fn flush_responses(&self) -> Result<()> {
        let doc = self.responses.clone();
        blocking(move || doc.flush()).await
    }

    async fn flush_preferences(&self) -> Result<()> {
        let doc = self.preferences.clone();
        blocking(move || doc.flush()).await
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))?
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation logs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Turns kept in memory per user.  Larger `fetch_recent` limits read the
/// log from disk.
pub const CACHED_TAIL: usize = 200;

/// The newest turns of one user's log, in append order.
struct Tail {
    turns: VecDeque<ConversationTurn>,
    /// No older turns exist on disk.
    complete: bool,
}

impl Tail {
    fn from_log(mut turns: Vec<ConversationTurn>) -> Self {
        let skip = turns.len().saturating_sub(CACHED_TAIL);
        Self {
            complete: skip == 0,
            turns: turns.drain(skip..).collect(),
        }
    }

    fn push(&mut self, turn: ConversationTurn) {
        self.turns.push_back(turn);
        if self.turns.len() > CACHED_TAIL {
            self.turns.pop_front();
            self.complete = false;
        }
    }

    /// The last `limit` turns, or `None` when some of them are only on disk.
    fn last(&self, limit: usize) -> Option<Vec<ConversationTurn>> {
        if limit > self.turns.len() && !self.complete {
            return None;
        }
        let skip = self.turns.len().saturating_sub(limit);
        Some(self.turns.iter().skip(skip).cloned().collect())
    }
}

/// Per-user JSONL files plus a bounded write-through cache of each log's
/// tail.
///
/// All methods except `recent` are synchronous disk operations meant to run
/// on a blocking thread.  `io` serializes disk access so that a cache fill
/// can never race with an append or a purge rewrite.
struct ConversationLog {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Tail>>,
    io: Mutex<()>,
}

impl ConversationLog {
    fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            cache: RwLock::new(HashMap::new()),
            io: Mutex::new(()),
        }
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", query_hash(user_id)))
    }

    /// Serve the last `limit` turns from memory when the cached tail covers
    /// them.
    fn recent(&self, user_id: &str, limit: usize) -> Option<Vec<ConversationTurn>> {
        self.cache.read().get(user_id)?.last(limit)
    }

    #[cfg(test)]
    fn cached_len(&self, user_id: &str) -> Option<usize> {
        self.cache.read().get(user_id).map(|tail| tail.turns.len())
    }

    fn append(&self, turn: ConversationTurn) -> Result<()> {
        let mut line = serde_json::to_string(&turn)
            .map_err(|e| Error::Store(format!("serializing turn: {e}")))?;
        line.push('\n');

        let _io = self.io.lock();
        {
            use std::io::Write;
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.path_for(&turn.user_id))
                .map_err(Error::Io)?;
            file.write_all(line.as_bytes()).map_err(Error::Io)?;
        }

        // Only extend an already-loaded entry; otherwise the next read
        // picks the line up from disk.
        if let Some(tail) = self.cache.write().get_mut(&turn.user_id) {
            tail.push(turn);
        }
        Ok(())
    }

    fn load_recent(&self, user_id: &str, limit: usize) -> Result<Vec<ConversationTurn>> {
        let _io = self.io.lock();
        if let Some(turns) = self.recent(user_id, limit) {
            return Ok(turns);
        }
        let turns: Vec<ConversationTurn> = read_jsonl(&self.path_for(user_id))?
            .into_iter()
            .filter(|t: &ConversationTurn| t.user_id == user_id)
            .collect();
        let recent = turns[turns.len().saturating_sub(limit)..].to_vec();
        self.cache
            .write()
            .insert(user_id.to_owned(), Tail::from_log(turns));
        Ok(recent)
    }

    fn delete(&self, user_id: &str) -> Result<u64> {
        let _io = self.io.lock();
        let path = self.path_for(user_id);
        let count = match self.cache.write().remove(user_id) {
            Some(tail) if tail.complete => tail.turns.len(),
            _ => read_jsonl::<ConversationTurn>(&path)?.len(),
        };
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::Io(e)),
        }
        Ok(count as u64)
    }

    fn purge(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let _io = self.io.lock();
        let mut removed = 0u64;

        for entry in std::fs::read_dir(&self.dir).map_err(Error::Io)? {
            let path = entry.map_err(Error::Io)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            let turns: Vec<ConversationTurn> = read_jsonl(&path)?;
            let before = turns.len();
            let kept: Vec<ConversationTurn> =
                turns.into_iter().filter(|t| t.timestamp >= cutoff).collect();
            if kept.len() == before {
                continue;
            }
            removed += (before - kept.len()) as u64;

            if kept.is_empty() {
                std::fs::remove_file(&path).map_err(Error::Io)?;
            } else {
                let tmp = path.with_extension("jsonl.tmp");
                std::fs::write(&tmp, serialize_jsonl(&kept)?).map_err(Error::Io)?;
                std::fs::rename(&tmp, &path).map_err(Error::Io)?;
            }
        }

        if removed > 0 {
            for tail in self.cache.write().values_mut() {
                tail.turns.retain(|t| t.timestamp >= cutoff);
            }
        }
        Ok(removed)
    }
}

fn serialize_jsonl<T: Serialize>(items: &[T]) -> Result<String> {
    let mut buf = String::new();
    for item in items {
        let json = serde_json::to_string(item)
            .map_err(|e| Error::Store(format!("serializing line: {e}")))?;
        buf.push_str(&json);
        buf.push('\n');
    }
    Ok(buf)
}

/// Parse a JSONL file, skipping lines that do not parse.  A missing file
/// reads as empty.
fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::Io(e)),
    };
    let mut items = Vec::new();
    for (lineno, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = lineno + 1,
                    error = %e,
                    "skipping malformed log line"
                );
            }
        }
    }
    Ok(items)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// JSON documents
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A string-keyed map held in memory and persisted as one JSON file.
struct JsonDoc<T> {
    path: PathBuf,
    map: RwLock<HashMap<String, T>>,
    io: Mutex<()>,
}

impl<T: Serialize + DeserializeOwned + Clone> JsonDoc<T> {
    fn load(path: PathBuf) -> Result<Self> {
        let map = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    let aside = path.with_extension("json.corrupt");
                    std::fs::rename(&path, &aside).map_err(Error::Io)?;
                    tracing::warn!(
                        path = %path.display(),
                        moved_to = %aside.display(),
                        error = %e,
                        "unreadable document moved aside, starting empty"
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(Error::Io(e)),
        };
        Ok(Self {
            path,
            map: RwLock::new(map),
            io: Mutex::new(()),
        })
    }

    fn len(&self) -> usize {
        self.map.read().len()
    }

    fn get(&self, key: &str) -> Option<T> {
        self.map.read().get(key).cloned()
    }

    fn update<R>(&self, f: impl FnOnce(&mut HashMap<String, T>) -> R) -> R {
        f(&mut self.map.write())
    }

    /// Write the current snapshot.  The snapshot is taken under the I/O
    /// lock, so the last flush to finish always carries the newest state.
    fn flush(&self) -> Result<()> {
        let _io = self.io.lock();
        let json = {
            let map = self.map.read();
            serde_json::to_string_pretty(&*map)
                .map_err(|e| Error::Store(format!("serializing {}: {e}", self.path.display())))?
        };
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(Error::Io)?;
        std::fs::rename(&tmp, &self.path).map_err(Error::Io)?;
        Ok(())
    }
}
