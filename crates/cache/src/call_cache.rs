//! Expiring call cache.
//!
//! Maps a [`CallSignature`] key to the last computed result and the time it
//! was written.  A read is a hit only while `now - written_at` is strictly
//! below the expiry window; anything else recomputes and overwrites.  The
//! map lock is never held while the computation runs.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;

use sb_domain::clock::{self, Clock};
use sb_domain::config::CacheConfig;
use sb_domain::trace::TraceEvent;

use crate::signature::CallSignature;

/// One stored result.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Function the entry was computed for; `clear_for` matches on it.
    pub function: String,
    pub data: Value,
    pub written_at: DateTime<Utc>,
}

enum Lookup {
    Hit(Value),
    Miss,
}

pub struct CallCache {
    enabled: bool,
    default_expiry: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl CallCache {
    pub fn new(enabled: bool, default_expiry: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            enabled,
            default_expiry,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(cfg: &CacheConfig) -> Self {
        Self::new(
            cfg.enabled,
            Duration::from_secs(cfg.expiry_secs),
            clock::system(),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn default_expiry(&self) -> Duration {
        self.default_expiry
    }

    /// Return the cached value for `sig`, or run `compute` and store its
    /// result.  A failing `compute` propagates unchanged and writes nothing.
    pub fn get_or_compute<E>(
        &self,
        sig: &CallSignature,
        expiry: Option<Duration>,
        compute: impl FnOnce() -> Result<Value, E>,
    ) -> Result<Value, E> {
        if !self.enabled {
            return compute();
        }

        let key = sig.key();
        if let Lookup::Hit(data) = self.lookup(&key, sig.function(), expiry) {
            return Ok(data);
        }

        let data = compute()?;
        self.store(key, sig.function(), data.clone());
        Ok(data)
    }

    /// Async variant of [`get_or_compute`](Self::get_or_compute) for
    /// computations that perform I/O.
    pub async fn get_or_compute_async<E, F, Fut>(
        &self,
        sig: &CallSignature,
        expiry: Option<Duration>,
        compute: F,
    ) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if !self.enabled {
            return compute().await;
        }

        let key = sig.key();
        if let Lookup::Hit(data) = self.lookup(&key, sig.function(), expiry) {
            return Ok(data);
        }

        let data = compute().await?;
        self.store(key, sig.function(), data.clone());
        Ok(data)
    }

    /// Peek at a live entry without computing.
    pub fn get(&self, sig: &CallSignature, expiry: Option<Duration>) -> Option<Value> {
        if !self.enabled {
            return None;
        }
        match self.lookup(&sig.key(), sig.function(), expiry) {
            Lookup::Hit(data) => Some(data),
            Lookup::Miss => None,
        }
    }

    /// Drop every entry.  Returns how many were removed.
    pub fn clear_all(&self) -> usize {
        let removed = {
            let mut entries = self.entries.lock();
            let n = entries.len();
            entries.clear();
            n
        };
        tracing::info!(removed, "call cache cleared");
        TraceEvent::CacheCleared {
            function: None,
            removed,
        }
        .emit();
        removed
    }

    /// Drop every entry derived from `function`, leaving the rest alone.
    pub fn clear_for(&self, function: &str) -> usize {
        let removed = {
            let mut entries = self.entries.lock();
            let before = entries.len();
            entries.retain(|_, entry| entry.function != function);
            before - entries.len()
        };
        tracing::info!(function, removed, "call cache cleared for function");
        TraceEvent::CacheCleared {
            function: Some(function.to_owned()),
            removed,
        }
        .emit();
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    // ── Private helpers ───────────────────────────────────────────────

    fn lookup(&self, key: &str, function: &str, expiry: Option<Duration>) -> Lookup {
        let expiry = expiry.unwrap_or(self.default_expiry);
        let now = self.clock.now();

        let found = {
            let entries = self.entries.lock();
            entries.get(key).cloned()
        };

        match found {
            Some(entry) => {
                let age = now.signed_duration_since(entry.written_at);
                let window = i64::try_from(expiry.as_millis()).unwrap_or(i64::MAX);
                if age.num_milliseconds() < window {
                    tracing::debug!(function, "returning result from call cache");
                    TraceEvent::CacheHit {
                        function: function.to_owned(),
                        age_secs: age.num_seconds(),
                    }
                    .emit();
                    Lookup::Hit(entry.data)
                } else {
                    TraceEvent::CacheMiss {
                        function: function.to_owned(),
                        expired: true,
                    }
                    .emit();
                    Lookup::Miss
                }
            }
            None => {
                TraceEvent::CacheMiss {
                    function: function.to_owned(),
                    expired: false,
                }
                .emit();
                Lookup::Miss
            }
        }
    }

    fn store(&self, key: String, function: &str, data: Value) {
        let entry = CacheEntry {
            function: function.to_owned(),
            data,
            written_at: self.clock.now(),
        };
        self.entries.lock().insert(key, entry);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::Duration as ChronoDuration;
    use sb_domain::clock::ManualClock;
    use serde_json::json;

    use super::*;

    fn cache_with_clock(enabled: bool) -> (CallCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = CallCache::new(enabled, Duration::from_secs(300), clock.clone());
        (cache, clock)
    }

    #[test]
    fn hit_within_window_skips_compute() {
        let (cache, clock) = cache_with_clock(true);
        let sig = CallSignature::new("get_products");
        let calls = Cell::new(0);
        let fetch = || {
            calls.set(calls.get() + 1);
            Ok::<_, String>(json!([{"id": 1}]))
        };

        let first = cache.get_or_compute(&sig, Some(Duration::from_secs(300)), fetch).unwrap();
        clock.advance(ChronoDuration::seconds(299));
        let second = cache
            .get_or_compute(&sig, Some(Duration::from_secs(300)), || {
                calls.set(calls.get() + 1);
                Ok::<_, String>(json!("fresh"))
            })
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn expired_entry_recomputes() {
        let (cache, clock) = cache_with_clock(true);
        let sig = CallSignature::new("get_products");
        let calls = Cell::new(0);
        let mut fetch = || {
            calls.set(calls.get() + 1);
            Ok::<_, String>(json!(calls.get()))
        };

        cache.get_or_compute(&sig, Some(Duration::from_secs(300)), &mut fetch).unwrap();
        cache.get_or_compute(&sig, Some(Duration::from_secs(300)), &mut fetch).unwrap();
        assert_eq!(calls.get(), 1);

        clock.advance(ChronoDuration::seconds(301));
        let v = cache
            .get_or_compute(&sig, Some(Duration::from_secs(300)), &mut fetch)
            .unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(v, json!(2));
    }

    #[test]
    fn age_equal_to_expiry_is_a_miss() {
        let (cache, clock) = cache_with_clock(true);
        let sig = CallSignature::new("get_orders");
        cache
            .get_or_compute(&sig, Some(Duration::from_secs(10)), || Ok::<_, String>(json!(1)))
            .unwrap();
        clock.advance(ChronoDuration::seconds(10));
        assert!(cache.get(&sig, Some(Duration::from_secs(10))).is_none());
    }

    #[test]
    fn default_expiry_applies_when_none_given() {
        let (cache, clock) = cache_with_clock(true);
        let sig = CallSignature::new("get_store_info");
        cache.get_or_compute(&sig, None, || Ok::<_, String>(json!({}))).unwrap();
        clock.advance(ChronoDuration::seconds(299));
        assert!(cache.get(&sig, None).is_some());
        clock.advance(ChronoDuration::seconds(1));
        assert!(cache.get(&sig, None).is_none());
    }

    #[test]
    fn kwarg_order_hits_same_entry() {
        let (cache, _clock) = cache_with_clock(true);
        let calls = Cell::new(0);
        let a = CallSignature::new("search").kwarg("a", 1).kwarg("b", 2);
        let b = CallSignature::new("search").kwarg("b", 2).kwarg("a", 1);

        for sig in [&a, &b] {
            cache
                .get_or_compute(sig, None, || {
                    calls.set(calls.get() + 1);
                    Ok::<_, String>(json!("r"))
                })
                .unwrap();
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn disabled_cache_always_computes() {
        let (cache, _clock) = cache_with_clock(false);
        let sig = CallSignature::new("get_products");
        let calls = Cell::new(0);
        for _ in 0..2 {
            cache
                .get_or_compute(&sig, None, || {
                    calls.set(calls.get() + 1);
                    Ok::<_, String>(json!([]))
                })
                .unwrap();
        }
        assert_eq!(calls.get(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn failed_compute_writes_nothing_and_retries() {
        let (cache, _clock) = cache_with_clock(true);
        let sig = CallSignature::new("get_products");

        let err = cache
            .get_or_compute(&sig, None, || Err::<Value, _>("shop down".to_string()))
            .unwrap_err();
        assert_eq!(err, "shop down");
        assert!(cache.is_empty());

        let calls = Cell::new(0);
        cache
            .get_or_compute(&sig, None, || {
                calls.set(calls.get() + 1);
                Ok::<_, String>(json!([1]))
            })
            .unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn clear_for_removes_only_matching_function() {
        let (cache, _clock) = cache_with_clock(true);
        let ok = |v: Value| move || Ok::<_, String>(v);
        cache.get_or_compute(&CallSignature::new("get_products"), None, ok(json!(1))).unwrap();
        cache
            .get_or_compute(&CallSignature::new("get_product").arg(3), None, ok(json!(2)))
            .unwrap();
        cache
            .get_or_compute(&CallSignature::new("get_product").arg(4), None, ok(json!(3)))
            .unwrap();
        cache.get_or_compute(&CallSignature::new("get_orders"), None, ok(json!(4))).unwrap();

        assert_eq!(cache.clear_for("get_product"), 2);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&CallSignature::new("get_products"), None).is_some());
        assert!(cache.get(&CallSignature::new("get_orders"), None).is_some());
    }

    #[test]
    fn clear_for_ignores_names_sharing_a_colon_prefix() {
        let (cache, _clock) = cache_with_clock(true);
        cache
            .get_or_compute(&CallSignature::new("a"), None, || Ok::<_, String>(json!(1)))
            .unwrap();
        cache
            .get_or_compute(&CallSignature::new("a:b"), None, || Ok::<_, String>(json!(2)))
            .unwrap();

        assert_eq!(cache.clear_for("a"), 1);
        assert_eq!(cache.get(&CallSignature::new("a:b"), None), Some(json!(2)));
        assert!(cache.get(&CallSignature::new("a"), None).is_none());
    }

    #[test]
    fn huge_expiry_does_not_wrap_to_a_miss() {
        let clock = Arc::new(ManualClock::default());
        let cache = CallCache::new(true, Duration::from_secs(u64::MAX / 1000), clock.clone());
        let sig = CallSignature::new("get_categories");
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Ok::<_, String>(json!(["c"]))
        };

        cache.get_or_compute(&sig, None, compute).unwrap();
        clock.advance(ChronoDuration::days(365));
        cache.get_or_compute(&sig, None, compute).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn clear_all_empties() {
        let (cache, _clock) = cache_with_clock(true);
        cache
            .get_or_compute(&CallSignature::new("a"), None, || Ok::<_, String>(json!(1)))
            .unwrap();
        cache
            .get_or_compute(&CallSignature::new("b"), None, || Ok::<_, String>(json!(2)))
            .unwrap();
        assert_eq!(cache.clear_all(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn recompute_overwrites_timestamp() {
        let (cache, clock) = cache_with_clock(true);
        let sig = CallSignature::new("get_categories");
        let expiry = Some(Duration::from_secs(60));
        cache.get_or_compute(&sig, expiry, || Ok::<_, String>(json!("v1"))).unwrap();
        clock.advance(ChronoDuration::seconds(61));
        cache.get_or_compute(&sig, expiry, || Ok::<_, String>(json!("v2"))).unwrap();
        clock.advance(ChronoDuration::seconds(30));
        assert_eq!(cache.get(&sig, expiry), Some(json!("v2")));
    }

    #[tokio::test]
    async fn async_variant_caches() {
        let (cache, clock) = cache_with_clock(true);
        let sig = CallSignature::new("get_products");
        let counter = std::sync::atomic::AtomicUsize::new(0);
        let calls = &counter;
        let fetch = move || async move {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok::<_, String>(json!(["p"]))
        };

        cache.get_or_compute_async(&sig, Some(Duration::from_secs(300)), fetch).await.unwrap();
        cache.get_or_compute_async(&sig, Some(Duration::from_secs(300)), fetch).await.unwrap();
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);

        clock.advance(ChronoDuration::seconds(301));
        cache.get_or_compute_async(&sig, Some(Duration::from_secs(300)), fetch).await.unwrap();
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
