/// Errors from key-value store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No entry exists at the key.
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    /// A create targeted a key that already holds an entry.
    #[error("key already exists: {key}")]
    KeyExists { key: String },

    /// A conditional write saw a different version than expected.
    #[error("version conflict on {key}: expected {expected}, found {actual}")]
    VersionConflict {
        key: String,
        expected: u64,
        actual: u64,
    },

    /// The requested watch start revision has been dropped from history.
    #[error("revision {requested} has been compacted; oldest available is {oldest}")]
    Compacted { requested: u64, oldest: u64 },

    /// A watcher fell behind the live event stream and missed events.
    #[error("watch fell behind and missed {missed} events")]
    WatchLagged { missed: u64 },

    /// The backend cannot serve requests right now.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Returns `true` for failures of the backend itself rather than of the
    /// request: retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_) | Self::WatchLagged { .. })
    }
}

/// Result alias for store operations.
pub type StorageResult<T> = Result<T, StorageError>;
