use std::collections::BTreeMap;

use kestrel_labels::Set;
use kestrel_types::{ObjectMeta, Resource, ResourceList, FIELD_NAME, FIELD_NAMESPACE};
use serde::{Deserialize, Serialize};

/// Well-known resource names.
pub const RESOURCE_CPU: &str = "cpu";
pub const RESOURCE_MEMORY: &str = "memory";
pub const RESOURCE_PODS: &str = "pods";
pub const RESOURCE_SERVICES: &str = "services";
pub const RESOURCE_REPLICATION_CONTROLLERS: &str = "replicationcontrollers";
pub const RESOURCE_QUOTAS: &str = "resourcequotas";
pub const RESOURCE_SECRETS: &str = "secrets";
pub const RESOURCE_PERSISTENT_VOLUME_CLAIMS: &str = "persistentvolumeclaims";

/// Resource name to quantity text, e.g. `cpu -> "4"`.
pub type ResourceAmounts = BTreeMap<String, String>;

/// Aggregate limits for a namespace, and what is currently in use.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQuota {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ResourceQuotaSpec,
    #[serde(default)]
    pub status: ResourceQuotaStatus,
}

/// Desired limits. Written by users.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQuotaSpec {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hard: ResourceAmounts,
}

/// Enforced limits and observed usage. Written by the quota controller
/// through the status subresource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQuotaStatus {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hard: ResourceAmounts,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub used: ResourceAmounts,
}

pub type ResourceQuotaList = ResourceList<ResourceQuota>;

impl ResourceQuota {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::namespaced(namespace, name),
            ..Default::default()
        }
    }

    pub fn with_hard(mut self, resource: impl Into<String>, amount: impl Into<String>) -> Self {
        self.spec.hard.insert(resource.into(), amount.into());
        self
    }
}

impl Resource for ResourceQuota {
    const KIND: &'static str = "ResourceQuota";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn selectable_fields(&self) -> Set {
        Set::new()
            .with(FIELD_NAME, self.metadata.name.as_str())
            .with(FIELD_NAMESPACE, self.metadata.namespace.as_str())
    }
}
