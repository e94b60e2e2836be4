//! Versioned key-value storage for Kestrel.
//!
//! The registry engine never talks to a concrete database. It consumes the
//! [`KvStore`] trait, a small consistent key-value interface with a single,
//! store-wide revision counter:
//!
//! - every successful write bumps the revision and stamps the written key
//!   with it, so per-key versions strictly increase;
//! - conditional writes ([`KvStore::compare_and_swap`], [`KvStore::delete`])
//!   succeed only if the key's current version matches;
//! - [`KvStore::watch_prefix`] streams every change under a prefix that
//!   happened strictly after a given revision.
//!
//! # Storage Backends
//!
//! - [`MemoryKvStore`] -- `BTreeMap`-based store with a bounded event history,
//!   for tests and embedding
//!
//! # Design Rules
//!
//! 1. Values are opaque bytes; the store never interprets them.
//! 2. Same-key writers are serialized by the version check, not by callers.
//! 3. A watch never skips an event silently: if it cannot keep up it ends
//!    with an error and the caller re-lists.
//! 4. All backend failures are propagated, never swallowed.

pub mod config;
pub mod error;
pub mod memory;
pub mod traits;

pub use config::MemoryKvConfig;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryKvStore;
pub use traits::{KvEntry, KvEvent, KvEventKind, KvList, KvStore, KvWatch};
