// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Keyed cache with time-to-live expiry.
//!
//! Entries are valid while `now - inserted_at < ttl`; an expired entry is a
//! miss and is never served. There is no size-based eviction, so the cache
//! holds at most one entry per key seen within the last `ttl` once
//! [`TtlCache::invalidate_expired`] runs. Callers key by ICAO24 address, which
//! keeps the bound at the number of aircraft seen near home in one TTL.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::Mutex as AsyncMutex;

use crate::clock::Clock;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Generic TTL cache shared by the remote lookup components.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    // Per-key fetch locks so concurrent misses issue one upstream call
    inflight: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.entries.lock().map(|e| e.len()).unwrap_or(0);
        f.debug_struct("TtlCache")
            .field("entries", &len)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache.
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Time-to-live applied to every entry.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a live entry. Missing and expired entries both return `None`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(key)?;

        if self.clock.now().saturating_duration_since(entry.inserted_at) < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Insert or replace an entry, stamping it with the current time.
    pub fn put(&self, key: K, value: V) {
        let inserted_at = self.clock.now();
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, CacheEntry { value, inserted_at });
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn invalidate_expired(&self) -> usize {
        let now = self.clock.now();
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.inserted_at) < self.ttl);
        before - entries.len()
    }

    /// Number of stored entries, expired ones included until the next purge.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the live entry for `key`, or run `fetch` and cache its result.
    ///
    /// At most one `fetch` runs per key at a time; callers that miss while a
    /// fetch is in flight wait for it and then read its result from the cache.
    /// Errors are returned to the caller and never cached.
    pub async fn get_or_try_fetch<F, Fut, E>(&self, key: &K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let lock = self.key_lock(key);
        let result = {
            let _guard = lock.lock().await;

            if let Some(value) = self.get(key) {
                Ok(value)
            } else {
                let fetched = fetch().await;
                if let Ok(value) = &fetched {
                    self.put(key.clone(), value.clone());
                }
                fetched
            }
        };

        self.release_key_lock(key, &lock);
        result
    }

    fn key_lock(&self, key: &K) -> Arc<AsyncMutex<()>> {
        match self.inflight.lock() {
            Ok(mut inflight) => Arc::clone(
                inflight
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            ),
            Err(_) => Arc::new(AsyncMutex::new(())),
        }
    }

    fn release_key_lock(&self, key: &K, lock: &Arc<AsyncMutex<()>>) {
        if let Ok(mut inflight) = self.inflight.lock() {
            // Only the map and this caller hold it: nobody else is waiting
            if Arc::strong_count(lock) <= 2 {
                inflight.remove(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache_with_clock(ttl_secs: u64) -> (TtlCache<String, u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::new(Duration::from_secs(ttl_secs), clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_put_then_get() {
        let (cache, _clock) = cache_with_clock(60);
        cache.put("a1b2c3".to_string(), 7);
        assert_eq!(cache.get(&"a1b2c3".to_string()), Some(7));
    }

    #[test]
    fn test_expired_entry_is_absent() {
        let (cache, clock) = cache_with_clock(60);
        cache.put("a1b2c3".to_string(), 7);

        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.get(&"a1b2c3".to_string()), Some(7));

        // Age equal to the TTL is already expired
        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&"a1b2c3".to_string()), None);
    }

    #[test]
    fn test_invalidate_expired_keeps_live_entries() {
        let (cache, clock) = cache_with_clock(60);
        cache.put("old".to_string(), 1);
        clock.advance(Duration::from_secs(45));
        cache.put("new".to_string(), 2);
        clock.advance(Duration::from_secs(30));

        assert_eq!(cache.invalidate_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"new".to_string()), Some(2));
    }

    #[tokio::test]
    async fn test_fetch_errors_are_not_cached() {
        let (cache, _clock) = cache_with_clock(60);
        let key = "a1b2c3".to_string();

        let failed: Result<u32, &str> = cache.get_or_try_fetch(&key, || async { Err("timeout") }).await;
        assert_eq!(failed, Err("timeout"));
        assert!(cache.is_empty());

        let ok: Result<u32, &str> = cache.get_or_try_fetch(&key, || async { Ok(3) }).await;
        assert_eq!(ok, Ok(3));
        assert_eq!(cache.get(&key), Some(3));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_fetch_once() {
        let clock = Arc::new(ManualClock::new());
        let cache: Arc<TtlCache<String, u32>> = Arc::new(TtlCache::new(Duration::from_secs(60), clock));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            tasks.spawn(async move {
                cache
                    .get_or_try_fetch(&"a1b2c3".to_string(), || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, ()>(42)
                    })
                    .await
            });
        }

        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
