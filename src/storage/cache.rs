// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bounded, concurrency-safe key/value cache.
//!
//! A single actor task owns an [`LruCache`]. Every caller talks to it through
//! a [`Cache`] handle over one FIFO channel, so the order in which operations
//! are submitted is the order in which they take effect:
//!
//! - `set`, `update`, `remove`, `remove_where` and `remove_all` are barrier
//!   writes. They are enqueued and return immediately, and they run alone.
//! - `get`, `exists`, `all_keys` and `stats` wait for a reply. Because they
//!   queue behind every write submitted before them, a read never observes a
//!   stale or half-applied write.
//!
//! When the capacity ceiling is reached the least recently used entry is
//! evicted. `get`, `exists` and every write refresh recency; `all_keys` and
//! `stats` do not.
//!
//! The command channel is unbounded so writers never wait. Queued commands
//! are not counted against the capacity, and nothing throttles a caller that
//! submits faster than the actor applies.

use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use utoipa::ToSchema;

/// Default hard maximum number of entries.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("cache actor is no longer running")]
    Closed,

    #[error("entry at {key} could not be decoded as {expected}")]
    Decode { key: String, expected: &'static str },
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Point-in-time view of cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CacheStats {
    /// Number of entries currently stored.
    pub entries: usize,
    /// Hard maximum number of entries.
    pub capacity: usize,
    /// Entries evicted because the capacity ceiling was reached.
    pub evictions: u64,
}

type Apply<V> = Box<dyn FnOnce(Option<V>) -> Option<V> + Send>;
type Predicate<K> = Box<dyn Fn(&K) -> bool + Send>;

enum Command<K, V> {
    Get {
        key: K,
        reply: oneshot::Sender<Option<V>>,
    },
    Exists {
        key: K,
        reply: oneshot::Sender<bool>,
    },
    Keys {
        reply: oneshot::Sender<Vec<K>>,
    },
    Stats {
        reply: oneshot::Sender<CacheStats>,
    },
    Set {
        key: K,
        value: V,
    },
    Update {
        key: K,
        apply: Apply<V>,
    },
    Remove {
        key: K,
    },
    RemoveWhere {
        predicate: Predicate<K>,
    },
    RemoveAll,
}

/// Handle to the cache actor. Cheap to clone; all clones share one store.
pub struct Cache<K, V> {
    cmd_tx: mpsc::UnboundedSender<Command<K, V>>,
    capacity: NonZeroUsize,
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            capacity: self.capacity,
        }
    }
}

impl<K, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("capacity", &self.capacity)
            .field("closed", &self.cmd_tx.is_closed())
            .finish()
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + fmt::Debug + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Create a cache holding at most `capacity` entries and spawn its actor.
    ///
    /// A capacity of zero is clamped to one. Must be called from within a
    /// Tokio runtime.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let actor = CacheActor {
            entries: LruCache::new(capacity),
            evictions: 0,
        };
        tokio::spawn(actor.run(cmd_rx));

        Self { cmd_tx, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Look up `key`, waiting behind any previously submitted write.
    pub async fn get(&self, key: &K) -> CacheResult<Option<V>> {
        let key = key.clone();
        self.request(|reply| Command::Get { key, reply }).await
    }

    pub async fn exists(&self, key: &K) -> CacheResult<bool> {
        let key = key.clone();
        self.request(|reply| Command::Exists { key, reply }).await
    }

    /// Snapshot of stored keys, most recently used first.
    pub async fn all_keys(&self) -> CacheResult<Vec<K>> {
        self.request(|reply| Command::Keys { reply }).await
    }

    pub async fn stats(&self) -> CacheResult<CacheStats> {
        self.request(|reply| Command::Stats { reply }).await
    }

    /// Replace whatever is stored at `key` with `value`.
    pub fn set(&self, key: K, value: V) -> CacheResult<()> {
        self.submit(Command::Set { key, value })
    }

    /// Read-modify-write `key` as one exclusive step.
    ///
    /// `apply` receives the current value (already taken out of the store)
    /// and returns the value to store, or `None` to leave the key absent.
    pub fn update<F>(&self, key: K, apply: F) -> CacheResult<()>
    where
        F: FnOnce(Option<V>) -> Option<V> + Send + 'static,
    {
        self.submit(Command::Update {
            key,
            apply: Box::new(apply),
        })
    }

    pub fn remove(&self, key: K) -> CacheResult<()> {
        self.submit(Command::Remove { key })
    }

    /// Remove every entry whose key matches `predicate`.
    pub fn remove_where<F>(&self, predicate: F) -> CacheResult<()>
    where
        F: Fn(&K) -> bool + Send + 'static,
    {
        self.submit(Command::RemoveWhere {
            predicate: Box::new(predicate),
        })
    }

    pub fn remove_all(&self) -> CacheResult<()> {
        self.submit(Command::RemoveAll)
    }

    fn submit(&self, command: Command<K, V>) -> CacheResult<()> {
        self.cmd_tx.send(command).map_err(|_| CacheError::Closed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command<K, V>,
    ) -> CacheResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(build(reply_tx))?;
        reply_rx.await.map_err(|_| CacheError::Closed)
    }
}

struct CacheActor<K: Hash + Eq, V> {
    entries: LruCache<K, V>,
    evictions: u64,
}

impl<K, V> CacheActor<K, V>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: Clone,
{
    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<Command<K, V>>) {
        while let Some(command) = cmd_rx.recv().await {
            self.handle(command);
        }
        debug!("cache actor stopped");
    }

    fn handle(&mut self, command: Command<K, V>) {
        // Reply send errors mean the caller went away; nothing to do.
        match command {
            Command::Get { key, reply } => {
                let _ = reply.send(self.entries.get(&key).cloned());
            }
            Command::Exists { key, reply } => {
                let _ = reply.send(self.entries.get(&key).is_some());
            }
            Command::Keys { reply } => {
                let keys = self.entries.iter().map(|(key, _)| key.clone()).collect();
                let _ = reply.send(keys);
            }
            Command::Stats { reply } => {
                let _ = reply.send(CacheStats {
                    entries: self.entries.len(),
                    capacity: self.entries.cap().get(),
                    evictions: self.evictions,
                });
            }
            Command::Set { key, value } => {
                self.entries.pop(&key);
                self.insert(key, value);
            }
            Command::Update { key, apply } => {
                let current = self.entries.pop(&key);
                if let Some(value) = apply(current) {
                    self.insert(key, value);
                }
            }
            Command::Remove { key } => {
                self.entries.pop(&key);
            }
            Command::RemoveWhere { predicate } => {
                let doomed: Vec<K> = self
                    .entries
                    .iter()
                    .filter(|&(key, _)| predicate(key))
                    .map(|(key, _)| key.clone())
                    .collect();
                for key in doomed {
                    self.entries.pop(&key);
                }
            }
            Command::RemoveAll => self.entries.clear(),
        }
    }

    /// Insert a key known to be absent, evicting the LRU entry when full.
    fn insert(&mut self, key: K, value: V) {
        if let Some((evicted, _)) = self.entries.push(key, value) {
            self.evictions += 1;
            warn!(
                key = ?evicted,
                capacity = self.entries.cap().get(),
                "Cache at capacity, evicted least recently used entry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> Cache<String, u32> {
        Cache::new(capacity)
    }

    #[tokio::test]
    async fn read_after_set_observes_write() {
        let cache = cache(8);
        cache.set("a".into(), 1).unwrap();

        assert_eq!(cache.get(&"a".into()).await.unwrap(), Some(1));
        assert!(cache.exists(&"a".into()).await.unwrap());
        assert!(!cache.exists(&"b".into()).await.unwrap());
        assert_eq!(cache.get(&"b".into()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn writes_apply_in_submission_order() {
        let cache = cache(8);
        let key = "k".to_string();

        cache.set(key.clone(), 1).unwrap();
        cache.set(key.clone(), 2).unwrap();
        cache.remove(key.clone()).unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), None);

        cache.set(key.clone(), 3).unwrap();
        cache.update(key.clone(), |v| v.map(|v| v * 10)).unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), Some(30));
    }

    #[tokio::test]
    async fn update_returning_none_leaves_key_absent() {
        let cache = cache(8);
        cache
            .update("x".into(), |current| {
                assert!(current.is_none());
                None
            })
            .unwrap();
        assert!(!cache.exists(&"x".into()).await.unwrap());

        cache.set("x".into(), 5).unwrap();
        cache.update("x".into(), |_| None).unwrap();
        assert!(!cache.exists(&"x".into()).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_distinct_key_writes_are_all_kept() {
        let cache = cache(DEFAULT_CAPACITY);

        let handles: Vec<_> = (0..200u32)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.set(format!("key-{i}"), i).unwrap() })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let keys = cache.all_keys().await.unwrap();
        assert_eq!(keys.len(), 200);
        assert_eq!(cache.stats().await.unwrap().evictions, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_to_one_key_never_lose_an_increment() {
        let cache = cache(8);
        let key = "counter".to_string();

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let cache = cache.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    cache
                        .update(key, |v| Some(v.unwrap_or(0) + 1))
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.get(&key).await.unwrap(), Some(100));
    }

    #[tokio::test]
    async fn evicts_least_recently_used_entry_at_capacity() {
        let cache = cache(2);
        cache.set("a".into(), 1).unwrap();
        cache.set("b".into(), 2).unwrap();

        // Touch "a" so "b" becomes the eviction candidate.
        assert_eq!(cache.get(&"a".into()).await.unwrap(), Some(1));
        cache.set("c".into(), 3).unwrap();

        assert!(cache.exists(&"a".into()).await.unwrap());
        assert!(!cache.exists(&"b".into()).await.unwrap());
        assert!(cache.exists(&"c".into()).await.unwrap());

        let stats = cache.stats().await.unwrap();
        assert_eq!(
            stats,
            CacheStats {
                entries: 2,
                capacity: 2,
                evictions: 1
            }
        );
    }

    #[tokio::test]
    async fn overwriting_at_capacity_does_not_evict_or_duplicate() {
        let cache = cache(2);
        cache.set("a".into(), 1).unwrap();
        cache.set("b".into(), 2).unwrap();
        cache.set("a".into(), 10).unwrap();

        let mut keys = cache.all_keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(cache.get(&"a".into()).await.unwrap(), Some(10));
        assert_eq!(cache.stats().await.unwrap().evictions, 0);
    }

    #[tokio::test]
    async fn inserting_far_beyond_capacity_keeps_newest_entries() {
        let cache = cache(4);
        for i in 0..50u32 {
            cache.set(format!("k{i}"), i).unwrap();
        }

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.entries, 4);
        assert_eq!(stats.evictions, 46);
        assert_eq!(
            cache.all_keys().await.unwrap(),
            vec!["k49", "k48", "k47", "k46"]
        );
    }

    #[tokio::test]
    async fn remove_where_and_remove_all() {
        let cache = cache(8);
        for key in ["s1-a", "s1-b", "s2-a"] {
            cache.set(key.to_string(), 0).unwrap();
        }

        cache.remove_where(|key| key.starts_with("s1-")).unwrap();
        assert_eq!(cache.all_keys().await.unwrap(), vec!["s2-a".to_string()]);

        cache.remove_all().unwrap();
        assert!(cache.all_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_capacity_is_clamped_to_one() {
        let cache = cache(0);
        assert_eq!(cache.capacity(), 1);

        cache.set("a".into(), 1).unwrap();
        cache.set("b".into(), 2).unwrap();
        assert_eq!(cache.all_keys().await.unwrap(), vec!["b".to_string()]);
    }
}
