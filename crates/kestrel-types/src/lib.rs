//! Foundation types for Kestrel.
//!
//! Every stored resource is a typed object carrying an [`ObjectMeta`]. The
//! registry engine in `kestrel-registry` is generic over the [`Resource`]
//! trait defined here, and every other Kestrel crate depends on this one.
//!
//! # Key Types
//!
//! - [`ObjectMeta`] -- name, namespace, uid, labels, annotations, version
//! - [`ResourceVersion`] -- opaque, monotonically increasing write token
//! - [`Resource`] -- capability trait implemented by every stored type
//! - [`ResourceList`] -- list wrapper carrying the snapshot version
//! - [`Status`] -- acknowledgement returned by operations without an object
//! - [`RequestContext`] -- request scope plus a cancellation signal
//! - [`FieldError`] -- one field-level validation failure

pub mod context;
pub mod error;
pub mod meta;
pub mod resource;
pub mod validation;
pub mod version;

pub use context::{CancelHandle, RequestContext};
pub use error::TypeError;
pub use meta::ObjectMeta;
pub use resource::{Resource, ResourceList, Status, FIELD_NAME, FIELD_NAMESPACE};
pub use validation::{FieldError, FieldErrorKind, FieldErrors};
pub use version::ResourceVersion;
