//! A small resource type and strategies used by the unit tests.

use kestrel_labels::Set;
use kestrel_types::{FieldError, FieldErrors, ObjectMeta, Resource};
use serde::{Deserialize, Serialize};

use crate::strategy::{validate_object_meta, CreateStrategy, UpdateStrategy};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: WidgetSpec,
    #[serde(default)]
    pub status: WidgetStatus,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetSpec {
    #[serde(default)]
    pub color: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetStatus {
    #[serde(default)]
    pub phase: String,
}

impl Widget {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            metadata: ObjectMeta::namespaced(namespace, name),
            ..Default::default()
        }
    }

    pub fn colored(namespace: &str, name: &str, color: &str) -> Self {
        let mut w = Self::new(namespace, name);
        w.spec.color = color.to_string();
        w
    }
}

impl Resource for Widget {
    const KIND: &'static str = "Widget";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn selectable_fields(&self) -> Set {
        Set::new()
            .with("metadata.name", self.metadata.name.as_str())
            .with("metadata.namespace", self.metadata.namespace.as_str())
            .with("spec.color", self.spec.color.as_str())
    }
}

/// Main strategy: status is read-only through a full update.
pub struct WidgetStrategy;

impl CreateStrategy<Widget> for WidgetStrategy {
    fn namespace_scoped(&self) -> bool {
        true
    }

    fn prepare_for_create(&self, obj: &mut Widget) {
        obj.status = WidgetStatus::default();
    }

    fn validate(&self, obj: &Widget) -> FieldErrors {
        validate_object_meta(&obj.metadata, true)
    }
}

impl UpdateStrategy<Widget> for WidgetStrategy {
    fn namespace_scoped(&self) -> bool {
        true
    }

    fn allow_create_on_update(&self) -> bool {
        false
    }

    fn prepare_for_update(&self, obj: &mut Widget, old: &Widget) {
        obj.status = old.status.clone();
    }

    fn validate_update(&self, obj: &Widget, _old: &Widget) -> FieldErrors {
        validate_object_meta(&obj.metadata, true)
    }
}

/// Status strategy: only `status` may change.
pub struct WidgetStatusStrategy;

impl UpdateStrategy<Widget> for WidgetStatusStrategy {
    fn namespace_scoped(&self) -> bool {
        true
    }

    fn allow_create_on_update(&self) -> bool {
        false
    }

    fn prepare_for_update(&self, obj: &mut Widget, old: &Widget) {
        obj.metadata.uid.clone_from(&old.metadata.uid);
        obj.metadata.creation_timestamp = old.metadata.creation_timestamp;
    }

    fn validate_update(&self, obj: &Widget, old: &Widget) -> FieldErrors {
        let mut errors = Vec::new();
        if obj.spec != old.spec {
            errors.push(FieldError::forbidden("spec", "may not be changed through status"));
        }
        errors
    }
}

/// Upserting strategy that insists on a resource version for updates.
pub struct StrictUpsertStrategy;

impl CreateStrategy<Widget> for StrictUpsertStrategy {
    fn namespace_scoped(&self) -> bool {
        true
    }

    fn prepare_for_create(&self, obj: &mut Widget) {
        WidgetStrategy.prepare_for_create(obj)
    }

    fn validate(&self, obj: &Widget) -> FieldErrors {
        WidgetStrategy.validate(obj)
    }
}

impl UpdateStrategy<Widget> for StrictUpsertStrategy {
    fn namespace_scoped(&self) -> bool {
        true
    }

    fn allow_create_on_update(&self) -> bool {
        true
    }

    fn allow_unconditional_update(&self) -> bool {
        false
    }

    fn prepare_for_update(&self, obj: &mut Widget, old: &Widget) {
        WidgetStrategy.prepare_for_update(obj, old)
    }

    fn validate_update(&self, obj: &Widget, old: &Widget) -> FieldErrors {
        WidgetStrategy.validate_update(obj, old)
    }
}
