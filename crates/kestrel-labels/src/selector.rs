//! Label selectors.
//!
//! Grammar, with requirements separated by `,`:
//!
//! ```text
//! requirement := key                       exists
//!              | '!' key                   does not exist
//!              | key ('=' | '==') value    equals
//!              | key '!=' value            not equals
//!              | key 'in' '(' values ')'   value in set
//!              | key 'notin' '(' values ')' value not in set
//! values      := value (',' value)*
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::SelectorError;
use crate::names::{validate_label_value, validate_qualified_name};
use crate::set::Labels;

/// Comparison applied by a single [`Requirement`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equals => "=",
            Self::NotEquals => "!=",
            Self::In => "in",
            Self::NotIn => "notin",
            Self::Exists => "exists",
            Self::DoesNotExist => "!",
        };
        f.write_str(s)
    }
}

/// One term of a label selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requirement {
    key: String,
    operator: Operator,
    values: BTreeSet<String>,
}

impl Requirement {
    /// Build a requirement, validating the key, the values, and the number of
    /// values the operator expects.
    pub fn new<I, S>(key: impl Into<String>, operator: Operator, values: I) -> Result<Self, SelectorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.into();
        validate_qualified_name(&key).map_err(|e| SelectorError::InvalidKey {
            key: key.clone(),
            reason: e.reason,
        })?;

        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        let arity_error = |reason: &str| SelectorError::Arity {
            operator: operator.to_string(),
            reason: reason.to_string(),
        };
        match operator {
            Operator::Equals | Operator::NotEquals if values.len() != 1 => {
                return Err(arity_error("requires exactly one value"));
            }
            Operator::In | Operator::NotIn if values.is_empty() => {
                return Err(arity_error("requires at least one value"));
            }
            Operator::Exists | Operator::DoesNotExist if !values.is_empty() => {
                return Err(arity_error("takes no values"));
            }
            _ => {}
        }
        for value in &values {
            validate_label_value(value).map_err(|e| SelectorError::InvalidValue {
                value: value.clone(),
                reason: e.reason,
            })?;
        }

        Ok(Self {
            key,
            operator,
            values,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    /// Evaluate this requirement against a label set.
    ///
    /// `Equals` and `In` require the key to be present; `NotEquals` and
    /// `NotIn` are satisfied by an absent key.
    pub fn matches(&self, labels: &impl Labels) -> bool {
        match self.operator {
            Operator::Equals | Operator::In => labels
                .get(&self.key)
                .is_some_and(|v| self.values.contains(v)),
            Operator::NotEquals | Operator::NotIn => labels
                .get(&self.key)
                .map_or(true, |v| !self.values.contains(v)),
            Operator::Exists => labels.has(&self.key),
            Operator::DoesNotExist => !labels.has(&self.key),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = || self.values.iter().cloned().collect::<Vec<_>>().join(",");
        match self.operator {
            Operator::Exists => write!(f, "{}", self.key),
            Operator::DoesNotExist => write!(f, "!{}", self.key),
            Operator::Equals | Operator::NotEquals => {
                write!(f, "{}{}{}", self.key, self.operator, joined())
            }
            Operator::In | Operator::NotIn => {
                write!(f, "{} {} ({})", self.key, self.operator, joined())
            }
        }
    }
}

/// A conjunction of label [`Requirement`]s.
///
/// Requirements are kept sorted by key so that two selectors built from the
/// same terms in a different order compare and print identically.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    requirements: Vec<Requirement>,
}

impl Selector {
    /// A selector that matches every label set.
    pub fn everything() -> Self {
        Self::default()
    }

    /// Build a selector from already-validated requirements.
    pub fn from_requirements(mut requirements: Vec<Requirement>) -> Self {
        requirements.sort_by(|a, b| a.key.cmp(&b.key));
        Self { requirements }
    }

    /// Convenience: a selector requiring every pair in `set` to match exactly.
    pub fn from_set<'a>(
        set: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, SelectorError> {
        let requirements = set
            .into_iter()
            .map(|(k, v)| Requirement::new(k, Operator::Equals, [v]))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_requirements(requirements))
    }

    /// Append a requirement, keeping key order.
    pub fn and(mut self, requirement: Requirement) -> Self {
        let at = self
            .requirements
            .partition_point(|r| r.key <= requirement.key);
        self.requirements.insert(at, requirement);
        self
    }

    /// Parse selector text. Empty or all-whitespace text selects everything.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut requirements = Vec::new();
        if input.trim().is_empty() {
            return Ok(Self::everything());
        }
        for term in split_terms(input)? {
            requirements.push(parse_requirement(input, term)?);
        }
        Ok(Self::from_requirements(requirements))
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Returns `true` if every requirement matches.
    pub fn matches(&self, labels: &impl Labels) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
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

/// Split on commas that are not inside a parenthesized value list.
fn split_terms(input: &str) -> Result<Vec<&str>, SelectorError> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in input.char_indices() {
        match ch {
            '(' => {
                if depth > 0 {
                    return Err(SelectorError::parse(input, "nested '('"));
                }
                depth += 1;
            }
            ')' => {
                if depth == 0 {
                    return Err(SelectorError::parse(input, "unbalanced ')'"));
                }
                depth -= 1;
            }
            ',' if depth == 0 => {
                terms.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(SelectorError::parse(input, "missing ')'"));
    }
    terms.push(&input[start..]);

    let terms: Vec<&str> = terms.into_iter().map(str::trim).collect();
    if terms.iter().any(|t| t.is_empty()) {
        return Err(SelectorError::parse(input, "empty requirement"));
    }
    Ok(terms)
}

fn parse_requirement(input: &str, term: &str) -> Result<Requirement, SelectorError> {
    if let Some(key) = term.strip_prefix('!') {
        return Requirement::new(key.trim(), Operator::DoesNotExist, Vec::<String>::new());
    }

    let key_end = term
        .find(|c: char| c.is_whitespace() || matches!(c, '=' | '!' | '('))
        .unwrap_or(term.len());
    let (key, rest) = term.split_at(key_end);
    if key.is_empty() {
        return Err(SelectorError::parse(input, format!("missing key in {term:?}")));
    }
    let rest = rest.trim_start();

    if rest.is_empty() {
        return Requirement::new(key, Operator::Exists, Vec::<String>::new());
    }
    if let Some(value) = rest.strip_prefix("!=") {
        return Requirement::new(key, Operator::NotEquals, [value.trim()]);
    }
    if let Some(value) = rest.strip_prefix("==").or_else(|| rest.strip_prefix('=')) {
        return Requirement::new(key, Operator::Equals, [value.trim()]);
    }
    if let Some(list) = rest.strip_prefix("notin") {
        return Requirement::new(key, Operator::NotIn, parse_value_list(input, list)?);
    }
    if let Some(list) = rest.strip_prefix("in") {
        return Requirement::new(key, Operator::In, parse_value_list(input, list)?);
    }
    Err(SelectorError::parse(
        input,
        format!("unknown operator in {term:?}"),
    ))
}

fn parse_value_list<'a>(input: &str, list: &'a str) -> Result<Vec<&'a str>, SelectorError> {
    let inner = list
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| SelectorError::parse(input, "set values must be wrapped in '(' ')'"))?;
    if inner.trim().is_empty() {
        return Err(SelectorError::parse(input, "empty value set"));
    }
    Ok(inner.split(',').map(str::trim).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::set::Set;
    use proptest::prelude::*;

    fn labels(pairs: &[(&str, &str)]) -> Set {
        pairs.iter().copied().collect()
    }

    #[test]
    fn empty_selector_matches_everything() {
        let sel = Selector::parse("").unwrap();
        assert!(sel.is_empty());
        assert!(sel.matches(&Set::new()));
        assert!(sel.matches(&labels(&[("app", "web")])));
        assert!(Selector::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn equality_operators() {
        let sel = Selector::parse("app=web,tier==front").unwrap();
        assert!(sel.matches(&labels(&[("app", "web"), ("tier", "front")])));
        assert!(!sel.matches(&labels(&[("app", "web")])));
        assert!(!sel.matches(&labels(&[("app", "db"), ("tier", "front")])));
    }

    #[test]
    fn not_equals_matches_missing_key() {
        let sel = Selector::parse("env!=prod").unwrap();
        assert!(sel.matches(&Set::new()));
        assert!(sel.matches(&labels(&[("env", "qa")])));
        assert!(!sel.matches(&labels(&[("env", "prod")])));
    }

    #[test]
    fn set_operators() {
        let sel = Selector::parse("env in (prod, qa),zone notin (us-east)").unwrap();
        assert!(sel.matches(&labels(&[("env", "qa")])));
        assert!(sel.matches(&labels(&[("env", "prod"), ("zone", "eu")])));
        assert!(!sel.matches(&labels(&[("env", "prod"), ("zone", "us-east")])));
        assert!(!sel.matches(&labels(&[("env", "dev")])));
        assert!(!sel.matches(&Set::new()));
    }

    #[test]
    fn existence_operators() {
        let sel = Selector::parse("managed,!canary").unwrap();
        assert!(sel.matches(&labels(&[("managed", "")])));
        assert!(!sel.matches(&labels(&[("managed", "yes"), ("canary", "1")])));
        assert!(!sel.matches(&Set::new()));
    }

    #[test]
    fn display_is_canonical() {
        let sel = Selector::parse("zone notin (b,a), app = web ,!x,y").unwrap();
        assert_eq!(sel.to_string(), "app=web,!x,y,zone notin (a,b)");
    }

    #[test]
    fn and_keeps_key_order() {
        let sel = Selector::parse("b=1")
            .unwrap()
            .and(Requirement::new("a", Operator::Exists, Vec::<String>::new()).unwrap());
        assert_eq!(sel.to_string(), "a,b=1");
    }

    #[test]
    fn from_set_builds_equality_terms() {
        let sel = Selector::from_set([("tier", "web"), ("app", "shop")]).unwrap();
        assert_eq!(sel.to_string(), "app=shop,tier=web");
    }

    #[test]
    fn parse_errors() {
        for bad in [
            "app=web,",
            ",app",
            "env in prod",
            "env in ()",
            "env in (a",
            "env notin a)",
            "app=web=x",
            "=web",
            "app ~ web",
            "bad key=1",
            "app=has space",
        ] {
            assert!(Selector::parse(bad).is_err(), "expected error for {bad:?}");
        }
    }

    #[test]
    fn requirement_arity_is_checked() {
        assert!(Requirement::new("a", Operator::Equals, ["x", "y"]).is_err());
        assert!(Requirement::new("a", Operator::In, Vec::<String>::new()).is_err());
        assert!(Requirement::new("a", Operator::Exists, ["x"]).is_err());
    }

    proptest! {
        #[test]
        fn display_then_parse_is_stable(
            keys in proptest::collection::btree_set("[a-z][a-z0-9]{0,6}", 1..5),
            value in "[a-z0-9]{1,6}",
        ) {
            let reqs: Vec<Requirement> = keys
                .iter()
                .enumerate()
                .map(|(i, k)| match i % 4 {
                    0 => Requirement::new(k.clone(), Operator::Equals, [value.clone()]),
                    1 => Requirement::new(k.clone(), Operator::NotIn, [value.clone(), "zz".into()]),
                    2 => Requirement::new(k.clone(), Operator::DoesNotExist, Vec::<String>::new()),
                    _ => Requirement::new(k.clone(), Operator::Exists, Vec::<String>::new()),
                })
                .collect::<Result<_, _>>()
                .unwrap();
            let sel = Selector::from_requirements(reqs);
            let reparsed = Selector::parse(&sel.to_string()).unwrap();
            prop_assert_eq!(reparsed, sel);
        }
    }
}
