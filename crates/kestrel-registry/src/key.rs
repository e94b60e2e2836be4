//! Storage key derivation.
//!
//! Keys have the shape `<prefix>/<namespace>/<name>` for namespaced
//! resources and `<prefix>/<name>` for cluster-scoped ones. Neither
//! namespace nor name may contain `/`, so the mapping is injective.

use kestrel_labels::names::validate_path_segment;
use kestrel_types::RequestContext;

use crate::error::{RegistryError, Result};

/// Whether a resource lives inside namespaces or at cluster scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Namespaced,
    Cluster,
}

/// Derives storage keys for one resource type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBuilder {
    prefix: String,
    scope: Scope,
}

impl KeyBuilder {
    /// Key builder for a namespaced resource stored under `prefix`.
    pub fn namespaced(prefix: impl Into<String>) -> Self {
        Self::new(prefix, Scope::Namespaced)
    }

    /// Key builder for a cluster-scoped resource stored under `prefix`.
    pub fn cluster(prefix: impl Into<String>) -> Self {
        Self::new(prefix, Scope::Cluster)
    }

    pub fn new(prefix: impl Into<String>, scope: Scope) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        let prefix = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        Self { prefix, scope }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn is_namespaced(&self) -> bool {
        self.scope == Scope::Namespaced
    }

    /// Root of everything visible from `ctx`.
    ///
    /// A namespaced resource listed from a namespaced context is rooted at
    /// its namespace; every other combination is rooted at the prefix.
    pub fn root_key(&self, ctx: &RequestContext) -> Result<String> {
        match (self.scope, ctx.namespace()) {
            (Scope::Namespaced, Some(ns)) => {
                check_segment(ns)?;
                Ok(format!("{}/{ns}", self.prefix))
            }
            _ => Ok(self.prefix.clone()),
        }
    }

    /// [`root_key`](Self::root_key) with a trailing `/`, suitable for a
    /// prefix read: `ns-a` must not pick up keys under `ns-ab`.
    pub fn list_prefix(&self, ctx: &RequestContext) -> Result<String> {
        let mut root = self.root_key(ctx)?;
        root.push('/');
        Ok(root)
    }

    /// Key of the object `name` in the scope of `ctx`.
    pub fn key(&self, ctx: &RequestContext, name: &str) -> Result<String> {
        match self.scope {
            Scope::Namespaced => {
                let ns = ctx.namespace().ok_or_else(|| {
                    RegistryError::BadRequest("namespace parameter required".into())
                })?;
                check_segment(ns)?;
                check_segment(name)?;
                Ok(format!("{}/{ns}/{name}", self.prefix))
            }
            Scope::Cluster => {
                check_segment(name)?;
                Ok(format!("{}/{name}", self.prefix))
            }
        }
    }
}

fn check_segment(segment: &str) -> Result<()> {
    validate_path_segment(segment).map_err(|e| RegistryError::InvalidName {
        name: e.name,
        reason: e.reason,
    })
}
