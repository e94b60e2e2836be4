use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a field-level validation failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldErrorKind {
    /// A required value was missing.
    Required,
    /// The value is malformed or out of range.
    Invalid,
    /// The value may not be set or changed in this operation.
    Forbidden,
    /// The value is well-formed but not one of the accepted values.
    NotSupported,
    /// The value duplicates another entry.
    Duplicate,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Required => "Required value",
            Self::Invalid => "Invalid value",
            Self::Forbidden => "Forbidden",
            Self::NotSupported => "Unsupported value",
            Self::Duplicate => "Duplicate value",
        };
        f.write_str(s)
    }
}

/// One field-level validation failure, e.g.
/// `spec.hard[cpu]: Invalid value: "-1": must be non-negative`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    /// Dotted path to the offending field.
    pub field: String,
    /// The rejected value, when there is one worth echoing back.
    pub value: Option<String>,
    pub detail: String,
}

impl FieldError {
    pub fn required(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: FieldErrorKind::Required,
            field: field.into(),
            value: None,
            detail: detail.into(),
        }
    }

    pub fn invalid(
        field: impl Into<String>,
        value: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind: FieldErrorKind::Invalid,
            field: field.into(),
            value: Some(value.into()),
            detail: detail.into(),
        }
    }

    pub fn forbidden(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: FieldErrorKind::Forbidden,
            field: field.into(),
            value: None,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}: {}: {value:?}", self.field, self.kind)?,
            None => write!(f, "{}: {}", self.field, self.kind)?,
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// The result of a validation pass; empty means valid.
pub type FieldErrors = Vec<FieldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_value() {
        let err = FieldError::invalid("spec.hard[cpu]", "-1", "must be non-negative");
        assert_eq!(
            err.to_string(),
            "spec.hard[cpu]: Invalid value: \"-1\": must be non-negative"
        );
    }

    #[test]
    fn display_without_value() {
        let err = FieldError::required("metadata.name", "");
        assert_eq!(err.to_string(), "metadata.name: Required value");
        let err = FieldError::forbidden("spec", "may not be changed");
        assert_eq!(err.to_string(), "spec: Forbidden: may not be changed");
    }
}
