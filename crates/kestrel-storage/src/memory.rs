use std::collections::{BTreeMap, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::MemoryKvConfig;
use crate::error::{StorageError, StorageResult};
use crate::traits::{KvEntry, KvEvent, KvEventKind, KvList, KvStore, KvWatch};

/// In-memory, `BTreeMap`-based versioned key-value store.
///
/// Intended for tests and embedding. Entries live behind a `RwLock`; every
/// write is recorded in a bounded history (for watches resuming from a past
/// revision) and fanned out on a broadcast channel (for live watches).
/// Data is lost when the store is dropped.
pub struct MemoryKvStore {
    inner: RwLock<Inner>,
    events: broadcast::Sender<KvEvent>,
    config: MemoryKvConfig,
}

#[derive(Default)]
struct Inner {
    entries: BTreeMap<String, Stored>,
    revision: u64,
    history: VecDeque<KvEvent>,
    /// Highest revision evicted from `history`.
    compacted: u64,
}

struct Stored {
    value: Bytes,
    version: u64,
    create_version: u64,
}

impl Inner {
    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    fn entry(&self, key: &str) -> Option<KvEntry> {
        self.entries.get(key).map(|s| KvEntry {
            key: key.to_string(),
            value: s.value.clone(),
            version: s.version,
            create_version: s.create_version,
        })
    }
}

impl MemoryKvStore {
    /// Create an empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MemoryKvConfig::default())
    }

    pub fn with_config(config: MemoryKvConfig) -> Self {
        let (events, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            inner: RwLock::new(Inner::default()),
            events,
            config,
        }
    }

    /// The current store revision (0 before the first write).
    pub fn revision(&self) -> StorageResult<u64> {
        Ok(self.read_inner()?.revision)
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.read_inner()?.entries.len())
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Number of live watch subscriptions.
    pub fn watcher_count(&self) -> usize {
        self.events.receiver_count()
    }

    fn read_inner(&self) -> StorageResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|e| StorageError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write_inner(&self) -> StorageResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|e| StorageError::Unavailable(format!("lock poisoned: {e}")))
    }

    /// Record an event and fan it out. Called with the write lock held so
    /// that history order, broadcast order, and revision order agree.
    fn publish(&self, inner: &mut Inner, event: KvEvent) {
        inner.history.push_back(event.clone());
        while inner.history.len() > self.config.history_capacity {
            if let Some(evicted) = inner.history.pop_front() {
                inner.compacted = evicted.revision;
            }
        }
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn create(&self, key: &str, value: Bytes) -> StorageResult<u64> {
        let mut inner = self.write_inner()?;
        if inner.entries.contains_key(key) {
            return Err(StorageError::KeyExists {
                key: key.to_string(),
            });
        }
        let revision = inner.next_revision();
        inner.entries.insert(
            key.to_string(),
            Stored {
                value: value.clone(),
                version: revision,
                create_version: revision,
            },
        );
        self.publish(
            &mut inner,
            KvEvent {
                kind: KvEventKind::Put,
                key: key.to_string(),
                value: Some(value),
                prev_value: None,
                revision,
            },
        );
        debug!(key, revision, "kv create");
        Ok(revision)
    }

    async fn get(&self, key: &str) -> StorageResult<KvEntry> {
        self.read_inner()?
            .entry(key)
            .ok_or_else(|| StorageError::KeyNotFound {
                key: key.to_string(),
            })
    }

    async fn compare_and_swap(&self, key: &str, expected: u64, value: Bytes) -> StorageResult<u64> {
        let mut inner = self.write_inner()?;
        let (actual, prev_value) = match inner.entries.get(key) {
            Some(stored) => (stored.version, stored.value.clone()),
            None => {
                return Err(StorageError::KeyNotFound {
                    key: key.to_string(),
                })
            }
        };
        if actual != expected {
            return Err(StorageError::VersionConflict {
                key: key.to_string(),
                expected,
                actual,
            });
        }

        let revision = inner.next_revision();
        if let Some(stored) = inner.entries.get_mut(key) {
            stored.value = value.clone();
            stored.version = revision;
        }
        self.publish(
            &mut inner,
            KvEvent {
                kind: KvEventKind::Put,
                key: key.to_string(),
                value: Some(value),
                prev_value: Some(prev_value),
                revision,
            },
        );
        debug!(key, expected, revision, "kv compare-and-swap");
        Ok(revision)
    }

    async fn delete(&self, key: &str, expected: u64) -> StorageResult<KvEntry> {
        let mut inner = self.write_inner()?;
        let prior = inner.entry(key).ok_or_else(|| StorageError::KeyNotFound {
            key: key.to_string(),
        })?;
        if expected != 0 && prior.version != expected {
            return Err(StorageError::VersionConflict {
                key: key.to_string(),
                expected,
                actual: prior.version,
            });
        }

        inner.entries.remove(key);
        let revision = inner.next_revision();
        self.publish(
            &mut inner,
            KvEvent {
                kind: KvEventKind::Delete,
                key: key.to_string(),
                value: None,
                prev_value: Some(prior.value.clone()),
                revision,
            },
        );
        debug!(key, revision, "kv delete");
        Ok(prior)
    }

    async fn list_prefix(&self, prefix: &str) -> StorageResult<KvList> {
        let inner = self.read_inner()?;
        let entries = inner
            .entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, s)| KvEntry {
                key: k.clone(),
                value: s.value.clone(),
                version: s.version,
                create_version: s.create_version,
            })
            .collect();
        Ok(KvList {
            entries,
            revision: inner.revision,
        })
    }

    async fn watch_prefix(
        &self,
        prefix: &str,
        from_revision: Option<u64>,
    ) -> StorageResult<Box<dyn KvWatch>> {
        // Holding the read lock blocks writers, so the backlog and the live
        // subscription meet exactly at the current revision.
        let inner = self.read_inner()?;
        let (backlog, last) = match from_revision {
            None => (VecDeque::new(), inner.revision),
            Some(from) if from < inner.compacted => {
                return Err(StorageError::Compacted {
                    requested: from,
                    oldest: inner.compacted + 1,
                });
            }
            Some(from) => {
                let backlog = inner
                    .history
                    .iter()
                    .filter(|e| e.revision > from && e.key.starts_with(prefix))
                    .cloned()
                    .collect();
                (backlog, from)
            }
        };
        let rx = self.events.subscribe();
        drop(inner);

        debug!(prefix, from = ?from_revision, backlog = backlog.len(), "kv watch opened");
        Ok(Box::new(MemoryKvWatch {
            prefix: prefix.to_string(),
            backlog,
            rx,
            last,
            done: false,
        }))
    }
}

impl std::fmt::Debug for MemoryKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (keys, revision) = self
            .read_inner()
            .map(|i| (i.entries.len(), i.revision))
            .unwrap_or_default();
        f.debug_struct("MemoryKvStore")
            .field("keys", &keys)
            .field("revision", &revision)
            .field("watchers", &self.watcher_count())
            .finish()
    }
}

/// Watch over a [`MemoryKvStore`] prefix: replayed history first, then live
/// events from the broadcast channel.
struct MemoryKvWatch {
    prefix: String,
    backlog: VecDeque<KvEvent>,
    rx: broadcast::Receiver<KvEvent>,
    /// Revision of the last delivered event.
    last: u64,
    done: bool,
}

#[async_trait]
impl KvWatch for MemoryKvWatch {
    async fn next(&mut self) -> Option<StorageResult<KvEvent>> {
        if self.done {
            return None;
        }
        if let Some(event) = self.backlog.pop_front() {
            self.last = event.revision;
            return Some(Ok(event));
        }
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if event.revision <= self.last || !event.key.starts_with(&self.prefix) {
                        continue;
                    }
                    self.last = event.revision;
                    return Some(Ok(event));
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(prefix = %self.prefix, missed, "kv watch lagged");
                    self.done = true;
                    return Some(Err(StorageError::WatchLagged { missed }));
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}

impl Drop for MemoryKvWatch {
    fn drop(&mut self) {
        debug!(prefix = %self.prefix, last = self.last, "kv watch closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_and_get() {
        let store = MemoryKvStore::new();
        let v = store.create("/a/1", b("one")).await.unwrap();
        assert_eq!(v, 1);

        let entry = store.get("/a/1").await.unwrap();
        assert_eq!(entry.value, b("one"));
        assert_eq!(entry.version, 1);
        assert_eq!(entry.create_version, 1);
    }

    #[tokio::test]
    async fn create_existing_key_fails() {
        let store = MemoryKvStore::new();
        store.create("/a/1", b("one")).await.unwrap();
        let err = store.create("/a/1", b("again")).await.unwrap_err();
        assert!(matches!(err, StorageError::KeyExists { .. }));
        assert_eq!(store.get("/a/1").await.unwrap().value, b("one"));
    }

    #[tokio::test]
    async fn get_missing_key() {
        let store = MemoryKvStore::new();
        let err = store.get("/nope").await.unwrap_err();
        assert!(matches!(err, StorageError::KeyNotFound { .. }));
    }

    #[tokio::test]
    async fn versions_strictly_increase() {
        let store = MemoryKvStore::new();
        let v1 = store.create("/k", b("1")).await.unwrap();
        let v2 = store.compare_and_swap("/k", v1, b("2")).await.unwrap();
        let v3 = store.compare_and_swap("/k", v2, b("3")).await.unwrap();
        assert!(v1 < v2 && v2 < v3);
        assert_eq!(store.revision().unwrap(), v3);
    }

    // -----------------------------------------------------------------------
    // Conditional writes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn compare_and_swap_conflict_leaves_value() {
        let store = MemoryKvStore::new();
        let v1 = store.create("/k", b("1")).await.unwrap();
        store.compare_and_swap("/k", v1, b("2")).await.unwrap();

        let err = store.compare_and_swap("/k", v1, b("stale")).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::VersionConflict { expected, actual, .. } if expected == v1 && actual == v1 + 1
        ));
        assert_eq!(store.get("/k").await.unwrap().value, b("2"));
    }

    #[tokio::test]
    async fn compare_and_swap_missing_key() {
        let store = MemoryKvStore::new();
        let err = store.compare_and_swap("/k", 1, b("x")).await.unwrap_err();
        assert!(matches!(err, StorageError::KeyNotFound { .. }));
    }

    #[tokio::test]
    async fn delete_returns_prior_entry() {
        let store = MemoryKvStore::new();
        let v = store.create("/k", b("1")).await.unwrap();
        let prior = store.delete("/k", v).await.unwrap();
        assert_eq!(prior.value, b("1"));
        assert!(store.is_empty().unwrap());
        assert!(matches!(
            store.delete("/k", 0).await.unwrap_err(),
            StorageError::KeyNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn delete_checks_version_unless_zero() {
        let store = MemoryKvStore::new();
        let v = store.create("/k", b("1")).await.unwrap();
        let err = store.delete("/k", v + 7).await.unwrap_err();
        assert!(matches!(err, StorageError::VersionConflict { .. }));
        store.delete("/k", 0).await.unwrap();
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn list_prefix_is_ordered_and_bounded() {
        let store = MemoryKvStore::new();
        store.create("/q/ns-b/x", b("bx")).await.unwrap();
        store.create("/q/ns-a/y", b("ay")).await.unwrap();
        store.create("/q/ns-a/x", b("ax")).await.unwrap();
        store.create("/q/ns-ab/z", b("abz")).await.unwrap();
        store.create("/other/1", b("o")).await.unwrap();

        let list = store.list_prefix("/q/ns-a/").await.unwrap();
        let keys: Vec<&str> = list.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["/q/ns-a/x", "/q/ns-a/y"]);
        assert_eq!(list.revision, 5);

        let all = store.list_prefix("/q/").await.unwrap();
        assert_eq!(all.entries.len(), 4);
    }

    // -----------------------------------------------------------------------
    // Watching
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn watch_from_now_sees_only_new_events() {
        let store = MemoryKvStore::new();
        store.create("/q/old", b("old")).await.unwrap();

        let mut watch = store.watch_prefix("/q/", None).await.unwrap();
        store.create("/q/new", b("new")).await.unwrap();
        store.create("/elsewhere", b("x")).await.unwrap();
        store.delete("/q/old", 0).await.unwrap();

        let first = watch.next().await.unwrap().unwrap();
        assert_eq!(first.key, "/q/new");
        assert!(first.is_create());

        let second = watch.next().await.unwrap().unwrap();
        assert_eq!(second.kind, KvEventKind::Delete);
        assert_eq!(second.prev_value, Some(b("old")));
    }

    #[tokio::test]
    async fn watch_from_revision_replays_history() {
        let store = MemoryKvStore::new();
        let v1 = store.create("/q/a", b("1")).await.unwrap();
        let v2 = store.compare_and_swap("/q/a", v1, b("2")).await.unwrap();
        store.create("/q/b", b("3")).await.unwrap();

        let mut watch = store.watch_prefix("/q/", Some(v1)).await.unwrap();
        let e1 = watch.next().await.unwrap().unwrap();
        assert_eq!(e1.revision, v2);
        assert_eq!(e1.prev_value, Some(b("1")));
        let e2 = watch.next().await.unwrap().unwrap();
        assert_eq!(e2.key, "/q/b");

        store.create("/q/c", b("4")).await.unwrap();
        let e3 = watch.next().await.unwrap().unwrap();
        assert_eq!(e3.key, "/q/c");
    }

    #[tokio::test]
    async fn watch_from_revision_zero_replays_first_write() {
        let store = MemoryKvStore::new();
        let v1 = store.create("/q/a", b("1")).await.unwrap();
        assert_eq!(v1, 1);

        let mut watch = store.watch_prefix("/q/", Some(0)).await.unwrap();
        let first = watch.next().await.unwrap().unwrap();
        assert_eq!(first.key, "/q/a");
        assert_eq!(first.revision, v1);
        assert!(first.is_create());
    }

    #[tokio::test]
    async fn watch_before_history_is_compacted() {
        let store = MemoryKvStore::with_config(MemoryKvConfig {
            history_capacity: 2,
            channel_capacity: 16,
        });
        for i in 0..5 {
            store.create(&format!("/k/{i}"), b("v")).await.unwrap();
        }
        let err = store.watch_prefix("/k/", Some(1)).await.err().unwrap();
        assert!(matches!(err, StorageError::Compacted { requested: 1, oldest: 4 }));
        assert!(store.watch_prefix("/k/", Some(3)).await.is_ok());
    }

    #[tokio::test]
    async fn lagging_watch_ends_with_error() {
        let store = MemoryKvStore::with_config(MemoryKvConfig {
            history_capacity: 16,
            channel_capacity: 2,
        });
        let mut watch = store.watch_prefix("/k/", None).await.unwrap();
        for i in 0..5 {
            store.create(&format!("/k/{i}"), b("v")).await.unwrap();
        }
        let err = watch.next().await.unwrap().unwrap_err();
        assert!(matches!(err, StorageError::WatchLagged { missed: 3 }));
        assert!(err.is_transient());
        assert!(watch.next().await.is_none());
    }

    #[tokio::test]
    async fn dropping_watch_releases_subscription() {
        let store = MemoryKvStore::new();
        let watch = store.watch_prefix("/k/", None).await.unwrap();
        assert_eq!(store.watcher_count(), 1);
        drop(watch);
        assert_eq!(store.watcher_count(), 0);
    }
}
