//! Create and update policies, and the generic hooks that wrap them.
//!
//! A strategy supplies the per-type behaviour (normalization and
//! validation). [`before_create`] and [`before_update`] apply the rules every
//! resource shares: namespace scoping, server-assigned metadata, and the
//! immutability of identity fields. The store calls the hooks, never the
//! strategy methods directly.

use chrono::Utc;
use kestrel_labels::names::{
    validate_dns1123_label, validate_dns1123_subdomain, validate_label_value,
    validate_qualified_name,
};
use kestrel_types::{FieldError, FieldErrors, ObjectMeta, RequestContext, Resource, ResourceVersion};
use uuid::Uuid;

use crate::error::{RegistryError, Result};

/// Policy applied when an object is created.
pub trait CreateStrategy<T: Resource>: Send + Sync {
    /// Whether objects of this type live in a namespace.
    fn namespace_scoped(&self) -> bool;

    /// Normalize a new object before validation, e.g. clear fields clients
    /// may not set.
    fn prepare_for_create(&self, obj: &mut T);

    /// Validate a new object. An empty list means valid.
    fn validate(&self, obj: &T) -> FieldErrors;
}

/// Policy applied when an object is replaced.
pub trait UpdateStrategy<T: Resource>: Send + Sync {
    fn namespace_scoped(&self) -> bool;

    /// Whether an update of a missing object creates it.
    fn allow_create_on_update(&self) -> bool;

    /// Whether an update may omit the resource version. Such updates are
    /// conditioned on the version the store reads just before writing.
    fn allow_unconditional_update(&self) -> bool {
        true
    }

    /// Merge `old` into `obj` before validation, e.g. restore fields this
    /// update path does not govern.
    fn prepare_for_update(&self, obj: &mut T, old: &T);

    /// Validate the transition from `old` to `obj`. An empty list means valid.
    fn validate_update(&self, obj: &T, old: &T) -> FieldErrors;
}

/// Generic checks and defaults applied before every create.
pub fn before_create<T: Resource>(
    strategy: &dyn CreateStrategy<T>,
    ctx: &RequestContext,
    obj: &mut T,
) -> Result<()> {
    scope_namespace(strategy.namespace_scoped(), ctx, obj.meta_mut())?;

    let meta = obj.meta_mut();
    meta.resource_version = ResourceVersion::UNSET;
    meta.uid = Uuid::now_v7().to_string();
    meta.creation_timestamp = Some(Utc::now());

    strategy.prepare_for_create(obj);

    let errors = strategy.validate(obj);
    if !errors.is_empty() {
        return Err(RegistryError::invalid(T::KIND, &obj.meta().name, errors));
    }
    Ok(())
}

/// Generic checks and defaults applied before every update.
pub fn before_update<T: Resource>(
    strategy: &dyn UpdateStrategy<T>,
    ctx: &RequestContext,
    obj: &mut T,
    old: &T,
) -> Result<()> {
    scope_namespace(strategy.namespace_scoped(), ctx, obj.meta_mut())?;

    let (meta, old_meta) = (obj.meta_mut(), old.meta());
    if meta.uid.is_empty() {
        meta.uid.clone_from(&old_meta.uid);
    }
    if meta.creation_timestamp.is_none() {
        meta.creation_timestamp = old_meta.creation_timestamp;
    }

    strategy.prepare_for_update(obj, old);

    let mut errors = validate_object_meta_update(obj.meta(), old.meta());
    errors.extend(strategy.validate_update(obj, old));
    if !errors.is_empty() {
        return Err(RegistryError::invalid(T::KIND, &obj.meta().name, errors));
    }
    Ok(())
}

/// Reconcile the object's namespace with the request scope.
fn scope_namespace(namespaced: bool, ctx: &RequestContext, meta: &mut ObjectMeta) -> Result<()> {
    if !namespaced {
        meta.namespace.clear();
        return Ok(());
    }
    let Some(ns) = ctx.namespace() else {
        return Err(RegistryError::BadRequest("namespace parameter required".into()));
    };
    if meta.namespace.is_empty() {
        meta.namespace = ns.to_string();
    } else if meta.namespace != ns {
        return Err(RegistryError::BadRequest(format!(
            "the namespace of the provided object ({}) does not match the namespace sent on the request ({ns})",
            meta.namespace
        )));
    }
    Ok(())
}

/// Validate the metadata shared by every resource.
///
/// Names must be DNS subdomains. Namespaced objects need a namespace that
/// is a DNS label; cluster-scoped objects must not carry one.
pub fn validate_object_meta(meta: &ObjectMeta, namespaced: bool) -> FieldErrors {
    let mut errors = Vec::new();

    if meta.name.is_empty() {
        errors.push(FieldError::required("metadata.name", "name is required"));
    } else if let Err(e) = validate_dns1123_subdomain(&meta.name) {
        errors.push(FieldError::invalid("metadata.name", &meta.name, e.reason));
    }

    if namespaced {
        if meta.namespace.is_empty() {
            errors.push(FieldError::required("metadata.namespace", ""));
        } else if let Err(e) = validate_dns1123_label(&meta.namespace) {
            errors.push(FieldError::invalid("metadata.namespace", &meta.namespace, e.reason));
        }
    } else if !meta.namespace.is_empty() {
        errors.push(FieldError::forbidden(
            "metadata.namespace",
            "not allowed on this type",
        ));
    }

    for (key, value) in &meta.labels {
        if let Err(e) = validate_qualified_name(key) {
            errors.push(FieldError::invalid("metadata.labels", key, e.reason));
        }
        if let Err(e) = validate_label_value(value) {
            errors.push(FieldError::invalid(
                format!("metadata.labels[{key}]"),
                value,
                e.reason,
            ));
        }
    }
    for key in meta.annotations.keys() {
        if let Err(e) = validate_qualified_name(&key.to_lowercase()) {
            errors.push(FieldError::invalid("metadata.annotations", key, e.reason));
        }
    }

    errors
}

/// Reject changes to identity fields fixed at creation.
pub fn validate_object_meta_update(meta: &ObjectMeta, old: &ObjectMeta) -> FieldErrors {
    let mut errors = Vec::new();
    if meta.name != old.name {
        errors.push(FieldError::invalid("metadata.name", &meta.name, "field is immutable"));
    }
    if meta.namespace != old.namespace {
        errors.push(FieldError::invalid(
            "metadata.namespace",
            &meta.namespace,
            "field is immutable",
        ));
    }
    if meta.uid != old.uid {
        errors.push(FieldError::invalid("metadata.uid", &meta.uid, "field is immutable"));
    }
    if meta.creation_timestamp != old.creation_timestamp {
        errors.push(FieldError::invalid(
            "metadata.creationTimestamp",
            meta.creation_timestamp.map(|t| t.to_rfc3339()).unwrap_or_default(),
            "field is immutable",
        ));
    }
    errors
}
