use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageResult;

/// A stored value and the revisions that describe it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub value: Bytes,
    /// Revision of the last write to this key.
    pub version: u64,
    /// Revision at which this key was created.
    pub create_version: u64,
}

/// Entries under a prefix, in key order, plus the store revision they were
/// read at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KvList {
    pub entries: Vec<KvEntry>,
    pub revision: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KvEventKind {
    /// The key was created or overwritten.
    Put,
    /// The key was removed.
    Delete,
}

/// One change to one key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KvEvent {
    pub kind: KvEventKind,
    pub key: String,
    /// New value; `None` for deletes.
    pub value: Option<Bytes>,
    /// Value before the change; `None` when the key was just created.
    pub prev_value: Option<Bytes>,
    /// Store revision produced by this change.
    pub revision: u64,
}

impl KvEvent {
    /// Returns `true` if this put created the key.
    pub fn is_create(&self) -> bool {
        self.kind == KvEventKind::Put && self.prev_value.is_none()
    }
}

/// Consistent, versioned key-value store.
///
/// All implementations must satisfy these invariants:
/// - A single revision counter covers the whole store and increases by one on
///   every successful write; the written key's `version` becomes that revision.
/// - Conditional operations compare against the key's current `version` and
///   fail with `VersionConflict` without writing on mismatch.
/// - `list_prefix` is a point-in-time read: the returned revision is the
///   store revision the entries were read at.
/// - A watch delivers every change under its prefix with revision greater
///   than its start revision, in revision order, exactly once.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Create `key`. Fails with `KeyExists` if an entry is present.
    /// Returns the new version.
    async fn create(&self, key: &str, value: Bytes) -> StorageResult<u64>;

    /// Read `key`. Fails with `KeyNotFound` if absent.
    async fn get(&self, key: &str) -> StorageResult<KvEntry>;

    /// Overwrite `key` only if its version equals `expected`.
    /// Returns the new version.
    async fn compare_and_swap(&self, key: &str, expected: u64, value: Bytes) -> StorageResult<u64>;

    /// Remove `key` only if its version equals `expected` (`0` skips the
    /// check). Returns the entry as it was before removal.
    async fn delete(&self, key: &str, expected: u64) -> StorageResult<KvEntry>;

    /// Read every entry whose key starts with `prefix`.
    async fn list_prefix(&self, prefix: &str) -> StorageResult<KvList>;

    /// Stream changes under `prefix`.
    ///
    /// `Some(rev)` replays every retained change with revision greater than
    /// `rev` (so `Some(0)` starts at the first write ever made), then
    /// follows live changes. `None` starts at the current revision. Fails
    /// with `Compacted` when history after `rev` is no longer retained.
    async fn watch_prefix(&self, prefix: &str, from_revision: Option<u64>)
        -> StorageResult<Box<dyn KvWatch>>;
}

/// A live change subscription. Dropping it releases the subscription.
#[async_trait]
pub trait KvWatch: Send {
    /// The next change, or `None` once the store has shut down.
    ///
    /// After an `Err` the subscription is finished and returns `None`.
    async fn next(&mut self) -> Option<StorageResult<KvEvent>>;
}
