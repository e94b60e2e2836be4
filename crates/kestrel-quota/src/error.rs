/// Errors from parsing a resource quantity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    #[error("quantity must not be empty")]
    Empty,

    #[error("invalid quantity {input:?}: {reason}")]
    Malformed { input: String, reason: String },

    #[error("unknown suffix {suffix:?} in quantity {input:?}")]
    UnknownSuffix { input: String, suffix: String },

    #[error("quantity {0:?} is too large")]
    Overflow(String),
}

impl QuantityError {
    pub(crate) fn malformed(input: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
