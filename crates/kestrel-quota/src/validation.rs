//! Field validation for resource quotas.

use kestrel_labels::names::validate_qualified_name;
use kestrel_registry::validate_object_meta;
use kestrel_types::{FieldError, FieldErrors};

use crate::quantity::Quantity;
use crate::types::{ResourceAmounts, ResourceQuota};

/// Validate a quota as a whole: metadata plus every resource amount.
pub fn validate_resource_quota(quota: &ResourceQuota) -> FieldErrors {
    let mut errors = validate_object_meta(&quota.metadata, true);
    validate_amounts("spec.hard", &quota.spec.hard, &mut errors);
    validate_amounts("status.hard", &quota.status.hard, &mut errors);
    validate_amounts("status.used", &quota.status.used, &mut errors);
    errors
}

/// Validate a full update. Identity fields are checked by the registry.
pub fn validate_resource_quota_update(quota: &ResourceQuota, _old: &ResourceQuota) -> FieldErrors {
    validate_resource_quota(quota)
}

/// Validate a status update: only `status` may differ from `old`.
pub fn validate_resource_quota_status_update(
    quota: &ResourceQuota,
    old: &ResourceQuota,
) -> FieldErrors {
    let mut errors = Vec::new();
    if quota.spec != old.spec {
        errors.push(FieldError::forbidden(
            "spec",
            "may not be changed through the status subresource",
        ));
    }
    if quota.metadata.labels != old.metadata.labels {
        errors.push(FieldError::forbidden(
            "metadata.labels",
            "may not be changed through the status subresource",
        ));
    }
    if quota.metadata.annotations != old.metadata.annotations {
        errors.push(FieldError::forbidden(
            "metadata.annotations",
            "may not be changed through the status subresource",
        ));
    }
    validate_amounts("status.hard", &quota.status.hard, &mut errors);
    validate_amounts("status.used", &quota.status.used, &mut errors);
    errors
}

fn validate_amounts(path: &str, amounts: &ResourceAmounts, errors: &mut FieldErrors) {
    for (resource, amount) in amounts {
        let field = format!("{path}[{resource}]");
        if let Err(e) = validate_qualified_name(resource) {
            errors.push(FieldError::invalid(&field, resource, e.reason));
        }
        match Quantity::parse(amount) {
            Ok(q) if q.is_negative() => errors.push(FieldError::invalid(
                &field,
                amount,
                "must be greater than or equal to 0",
            )),
            Ok(_) => {}
            Err(e) => errors.push(FieldError::invalid(&field, amount, e.to_string())),
        }
    }
}
