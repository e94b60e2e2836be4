//! Generic registry engine for Kestrel resources.
//!
//! A [`GenericStore`] exposes any [`Resource`](kestrel_types::Resource) type
//! as create/get/update/delete/list/watch operations over a
//! [`KvStore`](kestrel_storage::KvStore). Per-type behaviour is
//! configuration: a [`KeyBuilder`] decides where objects live, a
//! [`CreateStrategy`] and [`UpdateStrategy`] decide what writes are
//! allowed, and a [`StoreConfig`] tunes the rest.
//!
//! # Modules
//!
//! - [`error`] -- [`RegistryError`] and the result alias
//! - [`key`] -- Storage key derivation for namespaced and cluster resources
//! - [`predicate`] -- Label and field predicates for list and watch
//! - [`strategy`] -- Create/update policies and the generic hooks around them
//! - [`codec`] -- JSON encoding of stored records
//! - [`config`] -- [`StoreConfig`]
//! - [`store`] -- [`GenericStore`]
//! - [`watch`] -- [`Watcher`] and [`WatchEvent`]
//! - [`subresource`] -- [`SubresourceStore`], an update-only view
//!
//! # Design Rules
//!
//! 1. The engine holds no mutable state. Concurrency control is the
//!    backend's compare-and-swap; conflicts are returned, never retried.
//! 2. `resource_version` belongs to the store. It is never persisted inside
//!    a value and is always the version of the entry an object was read
//!    from or written to.
//! 3. A subresource is a second store value over the same storage handle
//!    with a different update strategy. Nothing else differs.
//! 4. A watch is a task feeding a bounded channel. The task ends, and the
//!    store subscription with it, when the request context is cancelled or
//!    the watcher goes away.

pub mod codec;
pub mod config;
pub mod error;
pub mod key;
pub mod predicate;
pub mod store;
pub mod strategy;
pub mod subresource;
pub mod watch;

#[cfg(test)]
mod testing;

pub use config::StoreConfig;
pub use error::{RegistryError, Result};
pub use key::{KeyBuilder, Scope};
pub use predicate::Predicate;
pub use store::{Deleted, GenericStore, ObjectHook};
pub use strategy::{
    before_create, before_update, validate_object_meta, validate_object_meta_update,
    CreateStrategy, UpdateStrategy,
};
pub use subresource::SubresourceStore;
pub use watch::{WatchEvent, Watcher};
