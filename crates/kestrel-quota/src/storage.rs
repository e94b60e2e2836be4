//! Wiring of the quota resource onto the generic registry.

use std::sync::Arc;

use kestrel_labels::{FieldSelector, Selector};
use kestrel_registry::{GenericStore, KeyBuilder, Predicate, StoreConfig, SubresourceStore};
use kestrel_storage::KvStore;
use tracing::debug;

use crate::strategy::{QuotaStatusStrategy, QuotaStrategy};
use crate::types::ResourceQuota;

/// Key prefix under which quotas are stored.
pub const PREFIX: &str = "/resourcequotas";

/// Name of the collection as clients address it.
pub const ENDPOINT_NAME: &str = "resourcequotas";

/// Full CRUD/list/watch access to quotas.
pub type QuotaStore = GenericStore<ResourceQuota>;

/// Update-only access to quota status.
pub type QuotaStatusStore = SubresourceStore<ResourceQuota>;

/// The configuration quotas are normally served with: deletes return the
/// removed quota.
pub fn quota_store_config() -> StoreConfig {
    StoreConfig::default().with_return_deleted_object(true)
}

/// Build the quota store and its status subresource over `storage`.
///
/// Both share the storage handle, keys and `config`, which is used as
/// given. Only the update strategy differs. Pass [`quota_store_config`] for
/// the usual quota behaviour.
pub fn new_storage(storage: Arc<dyn KvStore>, config: StoreConfig) -> (QuotaStore, QuotaStatusStore) {
    let store: QuotaStore =
        GenericStore::new(storage, KeyBuilder::namespaced(PREFIX), Arc::new(QuotaStrategy))
            .with_config(config);
    let status = store
        .clone()
        .with_update_strategy(Arc::new(QuotaStatusStrategy));
    debug!(endpoint = ENDPOINT_NAME, prefix = PREFIX, "quota storage ready");
    (store, SubresourceStore::new(status))
}

/// Predicate selecting quotas by label and by name/namespace fields.
pub fn match_resource_quota(label: Selector, field: FieldSelector) -> Predicate {
    Predicate::new(label, field)
}
