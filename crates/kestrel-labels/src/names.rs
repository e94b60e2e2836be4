//! Name validation rules shared by selectors, storage keys, and resource
//! validation.
//!
//! - DNS-1123 label: at most 63 characters, lowercase alphanumerics and `-`,
//!   starting and ending with an alphanumeric.
//! - DNS-1123 subdomain: at most 253 characters, one or more DNS-1123 labels
//!   joined by `.`.
//! - Qualified name: an optional DNS-1123 subdomain prefix and `/`, followed
//!   by a name of at most 63 characters made of alphanumerics, `-`, `_`, `.`,
//!   starting and ending with an alphanumeric.
//! - Label value: empty, or a qualified name without a prefix.
//! - Path segment: anything that can sit between two `/` in a storage key.

use crate::error::NameError;

/// Maximum length of a DNS-1123 label and of the name part of a qualified name.
pub const DNS1123_LABEL_MAX_LEN: usize = 63;

/// Maximum length of a DNS-1123 subdomain.
pub const DNS1123_SUBDOMAIN_MAX_LEN: usize = 253;

/// Path segments that would change the meaning of a storage key.
const RESERVED_SEGMENTS: &[&str] = &[".", ".."];

/// Characters that cannot appear in a storage key path segment.
const FORBIDDEN_SEGMENT_CHARS: &[char] = &['/', '%'];

/// Validate a DNS-1123 label, e.g. a namespace name.
pub fn validate_dns1123_label(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::new(name, "must not be empty"));
    }
    if name.len() > DNS1123_LABEL_MAX_LEN {
        return Err(NameError::new(
            name,
            format!("must be no more than {DNS1123_LABEL_MAX_LEN} characters"),
        ));
    }
    check_dns_label_chars(name)
}

/// Validate a DNS-1123 subdomain, e.g. a resource name.
///
/// ```
/// use kestrel_labels::names::validate_dns1123_subdomain;
///
/// assert!(validate_dns1123_subdomain("compute-quota").is_ok());
/// assert!(validate_dns1123_subdomain("quota.team-a").is_ok());
/// assert!(validate_dns1123_subdomain("Quota").is_err());
/// assert!(validate_dns1123_subdomain("a..b").is_err());
/// ```
pub fn validate_dns1123_subdomain(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::new(name, "must not be empty"));
    }
    if name.len() > DNS1123_SUBDOMAIN_MAX_LEN {
        return Err(NameError::new(
            name,
            format!("must be no more than {DNS1123_SUBDOMAIN_MAX_LEN} characters"),
        ));
    }
    for label in name.split('.') {
        if label.is_empty() {
            return Err(NameError::new(name, "must not contain empty '.'-separated parts"));
        }
        check_dns_label_chars(label).map_err(|e| NameError::new(name, e.reason))?;
    }
    Ok(())
}

/// Validate a qualified name such as a label key (`example.com/tier`) or a
/// resource name (`cpu`, `requests.memory`).
pub fn validate_qualified_name(name: &str) -> Result<(), NameError> {
    let short = match name.split_once('/') {
        Some((prefix, short)) => {
            if prefix.is_empty() {
                return Err(NameError::new(name, "prefix part must not be empty"));
            }
            validate_dns1123_subdomain(prefix)
                .map_err(|e| NameError::new(name, format!("prefix part {}", e.reason)))?;
            short
        }
        None => name,
    };
    if short.is_empty() {
        return Err(NameError::new(name, "name part must not be empty"));
    }
    if short.contains('/') {
        return Err(NameError::new(name, "must contain at most one '/'"));
    }
    check_qualified_chars(name, short)
}

/// Validate a label value. Empty values are allowed.
pub fn validate_label_value(value: &str) -> Result<(), NameError> {
    if value.is_empty() {
        return Ok(());
    }
    check_qualified_chars(value, value)
}

/// Validate that a name can be used as one path segment of a storage key.
///
/// ```
/// use kestrel_labels::names::validate_path_segment;
///
/// assert!(validate_path_segment("q1").is_ok());
/// assert!(validate_path_segment("..").is_err());
/// assert!(validate_path_segment("a/b").is_err());
/// ```
pub fn validate_path_segment(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::new(name, "must not be empty"));
    }
    if RESERVED_SEGMENTS.contains(&name) {
        return Err(NameError::new(name, format!("may not be '{name}'")));
    }
    for ch in FORBIDDEN_SEGMENT_CHARS {
        if name.contains(*ch) {
            return Err(NameError::new(name, format!("may not contain '{ch}'")));
        }
    }
    Ok(())
}

fn check_dns_label_chars(label: &str) -> Result<(), NameError> {
    let bytes = label.as_bytes();
    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !edge_ok(bytes[0]) || !edge_ok(bytes[bytes.len() - 1]) {
        return Err(NameError::new(
            label,
            "must start and end with a lowercase alphanumeric character",
        ));
    }
    if let Some(bad) = label
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(NameError::new(
            label,
            format!("contains invalid character {bad:?}"),
        ));
    }
    Ok(())
}

fn check_qualified_chars(full: &str, short: &str) -> Result<(), NameError> {
    if short.len() > DNS1123_LABEL_MAX_LEN {
        return Err(NameError::new(
            full,
            format!("name part must be no more than {DNS1123_LABEL_MAX_LEN} characters"),
        ));
    }
    let bytes = short.as_bytes();
    if !bytes[0].is_ascii_alphanumeric() || !bytes[bytes.len() - 1].is_ascii_alphanumeric() {
        return Err(NameError::new(
            full,
            "must start and end with an alphanumeric character",
        ));
    }
    if let Some(bad) = short
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(NameError::new(
            full,
            format!("contains invalid character {bad:?}"),
        ));
    }
    Ok(())
}
