//! Retention cleanup: a single background worker that periodically purges
//! old conversation turns and stale cached responses.
//!
//! The scheduler has two states.  `start` spawns a worker with a fresh
//! [`CancelToken`]; `stop` cancels it and waits a bounded time for it to
//! exit.  The worker sleeps in short slices so a stop request is observed
//! within one slice.
//!
//! A worker that misses the stop deadline stays registered.  Its own token
//! is already cancelled, so it exits at its next check; until then `start`
//! keeps reporting "already active" and a later `stop` can wait again.
//! No two workers ever run at the same time.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;

use sb_domain::clock::Clock;
use sb_domain::config::CleanupConfig;
use sb_domain::error::{Error, Result};
use sb_domain::trace::TraceEvent;
use sb_store::{CacheRowStore, ConversationStore};

use crate::runtime::cancel::CancelToken;

/// How often `stop` re-checks whether the worker has exited.
const STOP_POLL: Duration = Duration::from_millis(20);

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Retention purge
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Row counts removed by one purge cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub conversations_deleted: u64,
    pub cache_rows_deleted: u64,
}

impl CleanupReport {
    pub fn total(&self) -> u64 {
        self.conversations_deleted + self.cache_rows_deleted
    }
}

/// One purge cycle against the durable store.
pub struct RetentionPurge {
    conversations: Arc<dyn ConversationStore>,
    responses: Arc<dyn CacheRowStore>,
    clock: Arc<dyn Clock>,
    conversation_retention_days: u32,
    cache_retention_days: u32,
}

impl RetentionPurge {
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        responses: Arc<dyn CacheRowStore>,
        clock: Arc<dyn Clock>,
        cfg: &CleanupConfig,
    ) -> Self {
        Self {
            conversations,
            responses,
            clock,
            conversation_retention_days: cfg.conversation_retention_days,
            cache_retention_days: cfg.cache_retention_days,
        }
    }

    /// Delete turns older than the conversation retention and cached
    /// responses not accessed within the cache retention.
    ///
    /// A retention that reaches past the representable date range is a
    /// config error, so the worker logs it and cools down.
    pub async fn run_once(&self) -> Result<CleanupReport> {
        let start = Instant::now();
        let now = self.clock.now();
        let conversation_cutoff = retention_cutoff(
            now,
            self.conversation_retention_days,
            "cleanup.conversation_retention_days",
        )?;
        let cache_cutoff =
            retention_cutoff(now, self.cache_retention_days, "cleanup.cache_retention_days")?;

        let conversations_deleted = self
            .conversations
            .purge_older_than(conversation_cutoff)
            .await?;
        let cache_rows_deleted = self
            .responses
            .purge_unaccessed_since(cache_cutoff)
            .await?;

        let report = CleanupReport {
            conversations_deleted,
            cache_rows_deleted,
        };
        if report.total() > 0 {
            tracing::info!(
                conversations_deleted,
                cache_rows_deleted,
                "retention purge removed old data"
            );
        } else {
            tracing::debug!("retention purge found nothing to remove");
        }
        TraceEvent::CleanupCycle {
            conversations_deleted,
            cache_rows_deleted,
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();
        Ok(report)
    }
}

fn retention_cutoff(now: DateTime<Utc>, days: u32, field: &str) -> Result<DateTime<Utc>> {
    ChronoDuration::try_days(i64::from(days))
        .and_then(|retention| now.checked_sub_signed(retention))
        .ok_or_else(|| Error::Config(format!("{field} = {days} is out of range")))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scheduler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy)]
pub struct CleanupTiming {
    pub interval: Duration,
    pub slice: Duration,
    pub error_cooldown: Duration,
    pub stop_timeout: Duration,
}

impl From<&CleanupConfig> for CleanupTiming {
    fn from(cfg: &CleanupConfig) -> Self {
        Self {
            interval: cfg.interval(),
            slice: cfg.slice(),
            error_cooldown: cfg.error_cooldown(),
            stop_timeout: cfg.stop_timeout(),
        }
    }
}

struct Worker {
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

impl Worker {
    fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }
}

pub struct CleanupScheduler {
    /// `None` when persistence is disabled.
    purge: Option<Arc<RetentionPurge>>,
    timing: CleanupTiming,
    worker: Mutex<Option<Worker>>,
}

impl CleanupScheduler {
    pub fn new(cfg: &CleanupConfig, purge: Option<Arc<RetentionPurge>>) -> Self {
        Self::with_timing(CleanupTiming::from(cfg), purge)
    }

    pub fn with_timing(timing: CleanupTiming, purge: Option<Arc<RetentionPurge>>) -> Self {
        Self {
            purge,
            timing,
            worker: Mutex::new(None),
        }
    }

    /// Spawn the worker.  Returns `false` when a worker is already active,
    /// persistence is disabled, or there is no tokio runtime to spawn on.
    pub fn start(&self) -> bool {
        let Some(purge) = self.purge.clone() else {
            tracing::warn!("persistence disabled; cleanup scheduler not started");
            return false;
        };

        let mut slot = self.worker.lock();
        if slot.as_ref().is_some_and(Worker::is_alive) {
            tracing::warn!("cleanup scheduler already active");
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "no async runtime; cleanup scheduler not started");
                return false;
            }
        };

        let cancel = CancelToken::new();
        let handle = runtime.spawn(run_worker(purge, self.timing, cancel.clone()));
        *slot = Some(Worker { cancel, handle });

        tracing::info!(
            interval_secs = self.timing.interval.as_secs(),
            "cleanup scheduler started"
        );
        true
    }

    /// Cancel the worker and wait up to the stop timeout for it to exit.
    ///
    /// Returns `false` when nothing was running or the worker did not exit
    /// in time.  In the latter case the worker stays registered (see the
    /// module docs).
    pub async fn stop(&self) -> bool {
        let cancel = {
            let mut slot = self.worker.lock();
            match slot.as_ref() {
                Some(w) if w.is_alive() => w.cancel.clone(),
                _ => {
                    *slot = None;
                    return false;
                }
            }
        };
        cancel.cancel();

        let deadline = Instant::now() + self.timing.stop_timeout;
        loop {
            {
                let mut slot = self.worker.lock();
                match slot.as_ref() {
                    Some(w) if w.cancel.is_cancelled() && w.is_alive() => {}
                    Some(w) if w.cancel.is_cancelled() => {
                        *slot = None;
                        tracing::info!("cleanup scheduler stopped");
                        return true;
                    }
                    // Cleared or replaced by a newer start: ours is gone.
                    _ => return true,
                }
            }

            if Instant::now() >= deadline {
                tracing::warn!(
                    timeout_secs = self.timing.stop_timeout.as_secs_f64(),
                    "cleanup worker did not stop in time; it will exit at its next check"
                );
                return false;
            }
            tokio::time::sleep(STOP_POLL).await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().as_ref().is_some_and(Worker::is_alive)
    }

    /// Run one purge cycle in the caller's task.
    pub async fn run_once(&self) -> Result<CleanupReport> {
        match &self.purge {
            Some(purge) => purge.run_once().await,
            None => Err(Error::Config(
                "persistence is disabled; nothing to clean up".into(),
            )),
        }
    }
}

// ── Private helpers ──────────────────────────────────────────────────

async fn run_worker(purge: Arc<RetentionPurge>, timing: CleanupTiming, cancel: CancelToken) {
    tracing::debug!("cleanup worker running");

    while !cancel.is_cancelled() {
        let pause = match purge.run_once().await {
            Ok(_) => timing.interval,
            Err(e) => {
                tracing::error!(error = %e, "cleanup cycle failed");
                timing.error_cooldown
            }
        };
        if !sleep_sliced(pause, timing.slice, &cancel).await {
            break;
        }
    }

    tracing::debug!("cleanup worker exited");
}

/// Sleep for `total` in steps of at most `slice`, returning early with
/// `false` once `cancel` is set.
async fn sleep_sliced(total: Duration, slice: Duration, cancel: &CancelToken) -> bool {
    if total.is_zero() {
        tokio::task::yield_now().await;
        return !cancel.is_cancelled();
    }
    let slice = if slice.is_zero() { total } else { slice.min(total) };

    let mut slept = Duration::ZERO;
    while slept < total {
        if cancel.is_cancelled() {
            return false;
        }
        let step = slice.min(total - slept);
        tokio::time::sleep(step).await;
        slept += step;
    }
    !cancel.is_cancelled()
}
