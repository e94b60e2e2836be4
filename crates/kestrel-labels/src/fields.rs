//! Field selectors.
//!
//! A field selector is a comma-separated list of `field=value`,
//! `field==value`, or `field!=value` terms evaluated against the selectable
//! fields a resource type exposes (for example `metadata.name`). A field the
//! resource does not expose compares as the empty string.

use std::fmt;
use std::str::FromStr;

use crate::error::SelectorError;
use crate::set::Labels;

/// One `field op value` term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldRequirement {
    Equals { field: String, value: String },
    NotEquals { field: String, value: String },
}

impl FieldRequirement {
    pub fn field(&self) -> &str {
        match self {
            Self::Equals { field, .. } | Self::NotEquals { field, .. } => field,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Equals { value, .. } | Self::NotEquals { value, .. } => value,
        }
    }

    pub fn matches(&self, fields: &impl Labels) -> bool {
        let actual = fields.get(self.field()).unwrap_or("");
        match self {
            Self::Equals { value, .. } => actual == value,
            Self::NotEquals { value, .. } => actual != value,
        }
    }
}

impl fmt::Display for FieldRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { field, value } => write!(f, "{field}={value}"),
            Self::NotEquals { field, value } => write!(f, "{field}!={value}"),
        }
    }
}

/// A conjunction of [`FieldRequirement`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldSelector {
    requirements: Vec<FieldRequirement>,
}

impl FieldSelector {
    /// A selector that matches every field set.
    pub fn everything() -> Self {
        Self::default()
    }

    /// Selector with a single `field=value` term.
    pub fn one_term_equal(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            requirements: vec![FieldRequirement::Equals {
                field: field.into(),
                value: value.into(),
            }],
        }
    }

    pub fn and(mut self, requirement: FieldRequirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Parse selector text. Empty or all-whitespace text selects everything.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        if input.trim().is_empty() {
            return Ok(Self::everything());
        }
        let mut requirements = Vec::new();
        for term in input.split(',') {
            let term = term.trim();
            if term.is_empty() {
                return Err(SelectorError::parse(input, "empty requirement"));
            }
            requirements.push(parse_term(input, term)?);
        }
        Ok(Self { requirements })
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn requirements(&self) -> &[FieldRequirement] {
        &self.requirements
    }

    pub fn matches(&self, fields: &impl Labels) -> bool {
        self.requirements.iter().all(|r| r.matches(fields))
    }

    /// If this selector pins `field` to exactly one value, return it.
    ///
    /// Used to turn a list filtered by name into a single keyed read.
    pub fn matches_single(&self, field: &str) -> Option<&str> {
        self.requirements.iter().find_map(|r| match r {
            FieldRequirement::Equals { field: f, value } if f == field => Some(value.as_str()),
            _ => None,
        })
    }
}

impl FromStr for FieldSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, r) in self.requirements.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{r}")?;
        }
        Ok(())
    }
}

fn parse_term(input: &str, term: &str) -> Result<FieldRequirement, SelectorError> {
    let (field, value, negate) = if let Some((f, v)) = term.split_once("!=") {
        (f, v, true)
    } else if let Some((f, v)) = term.split_once("==") {
        (f, v, false)
    } else if let Some((f, v)) = term.split_once('=') {
        (f, v, false)
    } else {
        return Err(SelectorError::parse(
            input,
            format!("{term:?} is not of the form field=value"),
        ));
    };

    let field = field.trim();
    let value = value.trim();
    if field.is_empty() {
        return Err(SelectorError::parse(input, format!("missing field in {term:?}")));
    }
    if field.contains(char::is_whitespace) || value.contains(['=', '!']) {
        return Err(SelectorError::parse(input, format!("malformed term {term:?}")));
    }

    let (field, value) = (field.to_string(), value.to_string());
    Ok(if negate {
        FieldRequirement::NotEquals { field, value }
    } else {
        FieldRequirement::Equals { field, value }
    })
}
