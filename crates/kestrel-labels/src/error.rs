use thiserror::Error;

/// Errors produced while parsing or building a selector.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectorError {
    /// The selector text could not be parsed.
    #[error("unable to parse selector {input:?}: {reason}")]
    Parse { input: String, reason: String },

    /// A requirement key is not a valid label key.
    #[error("invalid label key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// A requirement value is not a valid label value.
    #[error("invalid label value {value:?}: {reason}")]
    InvalidValue { value: String, reason: String },

    /// The operator was given the wrong number of values.
    #[error("operator {operator} {reason}")]
    Arity { operator: String, reason: String },
}

impl SelectorError {
    pub(crate) fn parse(input: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// A name failed one of the validation rules in [`crate::names`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid name {name:?}: {reason}")]
pub struct NameError {
    pub name: String,
    pub reason: String,
}

impl NameError {
    pub(crate) fn new(name: &str, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
