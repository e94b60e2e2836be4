use std::fmt::Debug;

use kestrel_labels::Set;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;
use crate::version::ResourceVersion;

/// Field name under which every resource exposes its name for selection.
pub const FIELD_NAME: &str = "metadata.name";

/// Field name under which every resource exposes its namespace for selection.
pub const FIELD_NAMESPACE: &str = "metadata.namespace";

/// Capability trait implemented by every type the registry can store.
///
/// `Default` is the zero-value constructor used to decode request bodies;
/// [`ResourceList::default`] plays the same role for lists.
pub trait Resource:
    Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Kind name used in errors and logs, e.g. `"ResourceQuota"`.
    const KIND: &'static str;

    fn meta(&self) -> &ObjectMeta;

    fn meta_mut(&mut self) -> &mut ObjectMeta;

    /// Fields that field selectors can match against.
    ///
    /// The default exposes name and namespace. Types with more indexable
    /// fields override this; it must be pure and cheap, since it runs for
    /// every listed object and every watch event.
    fn selectable_fields(&self) -> Set {
        let meta = self.meta();
        Set::new()
            .with(FIELD_NAME, meta.name.as_str())
            .with(FIELD_NAMESPACE, meta.namespace.as_str())
    }
}

/// A list of resources plus the store revision the list was read at.
///
/// The revision is the resume cursor for a subsequent watch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceList<T> {
    #[serde(default, skip_serializing_if = "ResourceVersion::is_unset")]
    pub resource_version: ResourceVersion,
    pub items: Vec<T>,
}

impl<T> Default for ResourceList<T> {
    fn default() -> Self {
        Self {
            resource_version: ResourceVersion::UNSET,
            items: Vec::new(),
        }
    }
}

impl<T> ResourceList<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Acknowledgement returned when an operation has no object to return.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub kind: String,
    pub name: String,
    pub message: String,
}

impl Status {
    pub fn success(kind: impl Into<String>, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            message: message.into(),
        }
    }
}
