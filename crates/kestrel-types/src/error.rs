use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid resource version {0:?}: must be a non-negative integer")]
    InvalidResourceVersion(String),
}
