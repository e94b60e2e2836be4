use kestrel_storage::StorageError;
use kestrel_types::FieldErrors;

/// Errors surfaced by registry operations.
///
/// Every variant reaches the caller unchanged; the engine never retries.
/// [`RegistryError::Conflict`] is the optimistic-concurrency failure (re-read
/// and retry), while [`RegistryError::Storage`] is a backend failure whose
/// retry policy is up to the caller.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A name or namespace cannot be turned into a storage key.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// The request is malformed independently of the object's content.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Strategy validation rejected the object.
    #[error("{kind} {name:?} is invalid: {}", join_field_errors(.errors))]
    Invalid {
        kind: &'static str,
        name: String,
        errors: FieldErrors,
    },

    #[error("{kind} {name:?} already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("{kind} {name:?} not found")]
    NotFound { kind: &'static str, name: String },

    /// The stored version moved on since the caller read it.
    #[error("operation cannot be fulfilled on {kind} {name:?}: {message}")]
    Conflict {
        kind: &'static str,
        name: String,
        message: String,
    },

    /// A watch asked to resume from a version older than retained history.
    #[error("too old resource version: {requested} (oldest available: {oldest})")]
    Gone { requested: u64, oldest: u64 },

    /// A stored value could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// The key-value backend failed.
    #[error("storage error: {0}")]
    Storage(#[source] StorageError),
}

/// Message attached to every optimistic-concurrency conflict.
pub const CONFLICT_MESSAGE: &str =
    "the object has been modified; please apply your changes to the latest version and try again";

impl RegistryError {
    /// Translate a storage failure for the object `kind`/`name`.
    pub fn from_storage(kind: &'static str, name: &str, err: StorageError) -> Self {
        match err {
            StorageError::KeyNotFound { .. } => Self::NotFound {
                kind,
                name: name.to_string(),
            },
            StorageError::KeyExists { .. } => Self::AlreadyExists {
                kind,
                name: name.to_string(),
            },
            StorageError::VersionConflict { .. } => Self::conflict(kind, name),
            StorageError::Compacted { requested, oldest } => Self::Gone { requested, oldest },
            other => Self::Storage(other),
        }
    }

    pub(crate) fn conflict(kind: &'static str, name: &str) -> Self {
        Self::Conflict {
            kind,
            name: name.to_string(),
            message: CONFLICT_MESSAGE.to_string(),
        }
    }

    pub(crate) fn invalid(kind: &'static str, name: &str, errors: FieldErrors) -> Self {
        Self::Invalid {
            kind,
            name: name.to_string(),
            errors,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }

    /// Backend failures, as opposed to failures caused by the request.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Field errors carried by an `Invalid` error.
    pub fn field_errors(&self) -> &[kestrel_types::FieldError] {
        match self {
            Self::Invalid { errors, .. } => errors,
            _ => &[],
        }
    }
}

fn join_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
