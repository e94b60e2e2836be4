use kestrel_registry::{CreateStrategy, UpdateStrategy};
use kestrel_types::FieldErrors;

use crate::types::{ResourceQuota, ResourceQuotaStatus};
use crate::validation::{
    validate_resource_quota, validate_resource_quota_status_update, validate_resource_quota_update,
};

/// Policy for creating and fully updating quotas.
///
/// Users own `spec`; `status` belongs to the quota controller, so it is
/// cleared on create and carried over unchanged on update.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuotaStrategy;

impl CreateStrategy<ResourceQuota> for QuotaStrategy {
    fn namespace_scoped(&self) -> bool {
        true
    }

    fn prepare_for_create(&self, obj: &mut ResourceQuota) {
        obj.status = ResourceQuotaStatus::default();
    }

    fn validate(&self, obj: &ResourceQuota) -> FieldErrors {
        validate_resource_quota(obj)
    }
}

impl UpdateStrategy<ResourceQuota> for QuotaStrategy {
    fn namespace_scoped(&self) -> bool {
        true
    }

    fn allow_create_on_update(&self) -> bool {
        false
    }

    fn prepare_for_update(&self, obj: &mut ResourceQuota, old: &ResourceQuota) {
        obj.status = old.status.clone();
    }

    fn validate_update(&self, obj: &ResourceQuota, old: &ResourceQuota) -> FieldErrors {
        validate_resource_quota_update(obj, old)
    }
}

/// Policy for the status subresource: only `status` may change.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuotaStatusStrategy;

impl UpdateStrategy<ResourceQuota> for QuotaStatusStrategy {
    fn namespace_scoped(&self) -> bool {
        true
    }

    fn allow_create_on_update(&self) -> bool {
        false
    }

    fn prepare_for_update(&self, obj: &mut ResourceQuota, old: &ResourceQuota) {
        obj.metadata.uid.clone_from(&old.metadata.uid);
        obj.metadata.creation_timestamp = old.metadata.creation_timestamp;
    }

    fn validate_update(&self, obj: &ResourceQuota, old: &ResourceQuota) -> FieldErrors {
        validate_resource_quota_status_update(obj, old)
    }
}
