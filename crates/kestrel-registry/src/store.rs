//! The generic store: CRUD, list, and watch for one resource type.

use std::sync::Arc;

use kestrel_storage::{KvStore, StorageError};
use kestrel_types::{FieldError, RequestContext, Resource, ResourceList, ResourceVersion, Status};
use tracing::{debug, info, warn};

use crate::codec;
use crate::config::StoreConfig;
use crate::error::{RegistryError, Result};
use crate::key::KeyBuilder;
use crate::predicate::Predicate;
use crate::strategy::{before_create, before_update, CreateStrategy, UpdateStrategy};
use crate::watch::{WatchFilter, Watcher};

/// A hook run on an object on its way out of the store.
///
/// Hooks that run after a write has committed cannot undo it: an `Err`
/// there is logged and the stored object is returned without the hook's
/// changes.
pub type ObjectHook<T> = Arc<dyn Fn(&mut T) -> Result<()> + Send + Sync>;

/// Outcome of a delete.
#[derive(Clone, Debug, PartialEq)]
pub enum Deleted<T> {
    /// The object as it was just before removal.
    Object(T),
    /// An acknowledgement without the object.
    Status(Status),
}

/// Maps objects of type `T` onto entries of a versioned key-value store.
///
/// The store holds no mutable state of its own. Concurrent writers to the
/// same object are serialized by the backend's compare-and-swap, and a
/// writer that loses the race gets [`RegistryError::Conflict`]; nothing is
/// retried internally.
///
/// Cloning is cheap. A clone with a different update strategy
/// ([`with_update_strategy`](Self::with_update_strategy)) is how a
/// subresource shares the record of its parent.
pub struct GenericStore<T: Resource> {
    storage: Arc<dyn KvStore>,
    keys: KeyBuilder,
    create_strategy: Arc<dyn CreateStrategy<T>>,
    update_strategy: Arc<dyn UpdateStrategy<T>>,
    config: StoreConfig,
    after_create: Option<ObjectHook<T>>,
    after_update: Option<ObjectHook<T>>,
    decorator: Option<ObjectHook<T>>,
}

impl<T: Resource> Clone for GenericStore<T> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            keys: self.keys.clone(),
            create_strategy: Arc::clone(&self.create_strategy),
            update_strategy: Arc::clone(&self.update_strategy),
            config: self.config.clone(),
            after_create: self.after_create.clone(),
            after_update: self.after_update.clone(),
            decorator: self.decorator.clone(),
        }
    }
}

impl<T: Resource> std::fmt::Debug for GenericStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericStore")
            .field("kind", &T::KIND)
            .field("keys", &self.keys)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: Resource> GenericStore<T> {
    /// A store whose create and update policies come from one strategy.
    pub fn new<S>(storage: Arc<dyn KvStore>, keys: KeyBuilder, strategy: Arc<S>) -> Self
    where
        S: CreateStrategy<T> + UpdateStrategy<T> + 'static,
    {
        Self {
            storage,
            keys,
            create_strategy: strategy.clone(),
            update_strategy: strategy,
            config: StoreConfig::default(),
            after_create: None,
            after_update: None,
            decorator: None,
        }
    }

    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the update policy, keeping storage, keys and everything else.
    pub fn with_update_strategy(mut self, strategy: Arc<dyn UpdateStrategy<T>>) -> Self {
        self.update_strategy = strategy;
        self
    }

    /// Run `hook` on the result of every successful create. Failures are
    /// logged, never returned, since the object is already stored.
    pub fn with_after_create(mut self, hook: ObjectHook<T>) -> Self {
        self.after_create = Some(hook);
        self
    }

    /// Like [`with_after_create`](Self::with_after_create), for updates.
    pub fn with_after_update(mut self, hook: ObjectHook<T>) -> Self {
        self.after_update = Some(hook);
        self
    }

    /// Run `hook` on every object returned to a caller, including watch
    /// events. On reads a failure is returned; after a write it is logged.
    pub fn with_decorator(mut self, hook: ObjectHook<T>) -> Self {
        self.decorator = Some(hook);
        self
    }

    pub fn keys(&self) -> &KeyBuilder {
        &self.keys
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn KvStore> {
        &self.storage
    }

    /// An empty object, for decoding request bodies.
    pub fn new_object(&self) -> T {
        T::default()
    }

    /// An empty list, for decoding list bodies.
    pub fn new_list(&self) -> ResourceList<T> {
        ResourceList::default()
    }

    /// Store a new object. Fails with `AlreadyExists` if the key is taken.
    pub async fn create(&self, ctx: &RequestContext, mut obj: T) -> Result<T> {
        let name = obj.meta().name.clone();
        let key = self.keys.key(ctx, &name)?;
        before_create(self.create_strategy.as_ref(), ctx, &mut obj)?;

        let value = codec::encode(&obj)?;
        let version = self
            .storage
            .create(&key, value)
            .await
            .map_err(|e| RegistryError::from_storage(T::KIND, &name, e))?;
        obj.meta_mut().resource_version = ResourceVersion::new(version);
        info!(kind = T::KIND, key = %key, version, "created");

        Ok(self.after_commit(self.after_create.as_ref(), &key, obj))
    }

    pub async fn get(&self, ctx: &RequestContext, name: &str) -> Result<T> {
        let key = self.keys.key(ctx, name)?;
        let entry = self
            .storage
            .get(&key)
            .await
            .map_err(|e| RegistryError::from_storage(T::KIND, name, e))?;
        let obj = codec::decode(&entry.value, entry.version)?;
        self.decorate(obj)
    }

    /// Replace an object, returning it and whether the call created it.
    ///
    /// A set resource version must equal the stored one. An unset version
    /// is allowed when the update strategy permits unconditional updates.
    /// Either way the write is a compare-and-swap on the version read here,
    /// so a concurrent writer yields `Conflict`, never a lost update.
    pub async fn update(&self, ctx: &RequestContext, mut obj: T) -> Result<(T, bool)> {
        let name = obj.meta().name.clone();
        let key = self.keys.key(ctx, &name)?;
        let requested = obj.meta().resource_version;

        let current = match self.storage.get(&key).await {
            Ok(entry) => entry,
            Err(StorageError::KeyNotFound { .. }) => {
                return self.create_on_update(ctx, &key, obj, requested).await;
            }
            Err(e) => return Err(RegistryError::from_storage(T::KIND, &name, e)),
        };

        if requested.is_unset() {
            if !self.update_strategy.allow_unconditional_update() {
                return Err(RegistryError::invalid(
                    T::KIND,
                    &name,
                    vec![FieldError::required(
                        "metadata.resourceVersion",
                        "must be specified for an update",
                    )],
                ));
            }
        } else if requested.revision() != current.version {
            debug!(kind = T::KIND, key = %key, requested = %requested, stored = current.version, "stale update");
            return Err(RegistryError::conflict(T::KIND, &name));
        }

        let old: T = codec::decode(&current.value, current.version)?;
        before_update(self.update_strategy.as_ref(), ctx, &mut obj, &old)?;

        let value = codec::encode(&obj)?;
        let version = self
            .storage
            .compare_and_swap(&key, current.version, value)
            .await
            .map_err(|e| RegistryError::from_storage(T::KIND, &name, e))?;
        obj.meta_mut().resource_version = ResourceVersion::new(version);
        info!(kind = T::KIND, key = %key, version, "updated");

        Ok((self.after_commit(self.after_update.as_ref(), &key, obj), false))
    }

    async fn create_on_update(
        &self,
        ctx: &RequestContext,
        key: &str,
        mut obj: T,
        requested: ResourceVersion,
    ) -> Result<(T, bool)> {
        let name = obj.meta().name.clone();
        if !self.update_strategy.allow_create_on_update() {
            return Err(RegistryError::NotFound {
                kind: T::KIND,
                name,
            });
        }
        if !requested.is_unset() {
            // The caller expected a specific version of an object that no
            // longer exists.
            return Err(RegistryError::conflict(T::KIND, &name));
        }

        before_create(self.create_strategy.as_ref(), ctx, &mut obj)?;
        let value = codec::encode(&obj)?;
        let version = self.storage.create(key, value).await.map_err(|e| match e {
            StorageError::KeyExists { .. } => RegistryError::conflict(T::KIND, &name),
            other => RegistryError::from_storage(T::KIND, &name, other),
        })?;
        obj.meta_mut().resource_version = ResourceVersion::new(version);
        info!(kind = T::KIND, key = %key, version, "created on update");

        Ok((self.after_commit(self.after_create.as_ref(), key, obj), true))
    }

    /// Remove an object.
    ///
    /// The delete is conditioned on the version read just before it, so it
    /// cannot remove a state the caller never observed.
    pub async fn delete(&self, ctx: &RequestContext, name: &str) -> Result<Deleted<T>> {
        let key = self.keys.key(ctx, name)?;
        let current = self
            .storage
            .get(&key)
            .await
            .map_err(|e| RegistryError::from_storage(T::KIND, name, e))?;
        let removed = self
            .storage
            .delete(&key, current.version)
            .await
            .map_err(|e| RegistryError::from_storage(T::KIND, name, e))?;
        info!(kind = T::KIND, key = %key, version = removed.version, "deleted");

        if self.config.return_deleted_object {
            let obj = codec::decode(&removed.value, removed.version)?;
            Ok(Deleted::Object(self.after_commit(None, &key, obj)))
        } else {
            Ok(Deleted::Status(Status::success(T::KIND, name, "deleted")))
        }
    }

    /// Every object visible from `ctx` that satisfies `predicate`, in key
    /// order, plus the store revision the read was taken at.
    pub async fn list(&self, ctx: &RequestContext, predicate: &Predicate) -> Result<ResourceList<T>> {
        let single = self.single_key(ctx, predicate);
        let prefix = match &single {
            Some(key) => key.clone(),
            None => self.keys.list_prefix(ctx)?,
        };
        let listing = self
            .storage
            .list_prefix(&prefix)
            .await
            .map_err(|e| RegistryError::from_storage(T::KIND, "", e))?;

        let mut items = Vec::new();
        for entry in listing.entries {
            if single.as_deref().is_some_and(|k| k != entry.key) {
                continue;
            }
            let obj: T = codec::decode(&entry.value, entry.version)?;
            if predicate.matches(&obj) {
                items.push(self.decorate(obj)?);
            }
        }
        debug!(kind = T::KIND, prefix = %prefix, count = items.len(), revision = listing.revision, "listed");

        Ok(ResourceList {
            resource_version: ResourceVersion::new(listing.revision),
            items,
        })
    }

    /// Stream changes to objects matching `predicate`.
    ///
    /// With a set `resource_version`, events start strictly after it. With
    /// an unset one, every currently matching object is first reported as
    /// `Added`, followed by changes after that snapshot. Fails with `Gone`
    /// if the version is older than the history the store retains.
    pub async fn watch(
        &self,
        ctx: &RequestContext,
        predicate: Predicate,
        resource_version: ResourceVersion,
    ) -> Result<Watcher<T>> {
        let single = self.single_key(ctx, &predicate);
        let prefix = match &single {
            Some(key) => key.clone(),
            None => self.keys.list_prefix(ctx)?,
        };

        // Always an explicit revision: an empty store lists at 0, and the
        // watch must still replay a write that lands right after that list.
        let (initial, from) = if resource_version.is_unset() {
            let snapshot = self.list(ctx, &predicate).await?;
            (snapshot.items, snapshot.resource_version.revision())
        } else {
            (Vec::new(), resource_version.revision())
        };

        let source = self
            .storage
            .watch_prefix(&prefix, Some(from))
            .await
            .map_err(|e| RegistryError::from_storage(T::KIND, "", e))?;
        debug!(kind = T::KIND, prefix = %prefix, from, "watch started");

        let filter = WatchFilter {
            predicate,
            exact_key: single,
            decorator: self.decorator.clone(),
        };
        Ok(Watcher::spawn(
            source,
            initial,
            filter,
            ctx.clone(),
            self.config.watch_channel_capacity,
        ))
    }

    /// Key of the one object a predicate pins by name, when it can be
    /// addressed from `ctx`.
    fn single_key(&self, ctx: &RequestContext, predicate: &Predicate) -> Option<String> {
        let name = predicate.matches_single_name()?;
        if self.keys.is_namespaced() && ctx.namespace().is_none() {
            return None;
        }
        self.keys.key(ctx, name).ok()
    }

    fn decorate(&self, mut obj: T) -> Result<T> {
        if let Some(decorator) = &self.decorator {
            decorator(&mut obj)?;
        }
        Ok(obj)
    }

    /// Apply `hook` then the decorator to an object that is already stored.
    /// Each runs on a copy that is kept only if the hook succeeds.
    fn after_commit(&self, hook: Option<&ObjectHook<T>>, key: &str, mut obj: T) -> T {
        for (stage, hook) in hook
            .map(|h| ("after write", h))
            .into_iter()
            .chain(self.decorator.as_ref().map(|h| ("decorator", h)))
        {
            let mut candidate = obj.clone();
            match hook(&mut candidate) {
                Ok(()) => obj = candidate,
                Err(e) => warn!(kind = T::KIND, key = %key, stage, error = %e, "hook failed after commit"),
            }
        }
        obj
    }
}
