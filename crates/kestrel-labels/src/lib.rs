//! Label and field selection for Kestrel resources.
//!
//! Every stored resource carries a set of string labels and exposes a small,
//! type-specific set of selectable fields. Clients narrow list and watch
//! results with two selector kinds:
//!
//! - [`Selector`] -- a label selector (`app=web,tier!=db,env in (prod,qa),!canary`)
//! - [`FieldSelector`] -- a field selector (`metadata.name=q1,metadata.namespace!=kube`)
//!
//! Both selectors are conjunctions: every requirement must hold. An empty
//! selector matches everything.
//!
//! # Modules
//!
//! - [`error`] -- Selector and name errors
//! - [`set`] -- [`Set`] and the [`Labels`] lookup trait
//! - [`selector`] -- Label selector parsing and matching
//! - [`fields`] -- Field selector parsing and matching
//! - [`names`] -- DNS label/subdomain, qualified name, and path segment rules

pub mod error;
pub mod fields;
pub mod names;
pub mod selector;
pub mod set;

pub use error::{NameError, SelectorError};
pub use fields::{FieldRequirement, FieldSelector};
pub use selector::{Operator, Requirement, Selector};
pub use set::{Labels, Set};
