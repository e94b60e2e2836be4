use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Opaque token identifying one revision of a stored record.
///
/// Assigned by the storage layer on every successful write and strictly
/// increasing for a given key. The zero value means "unset": an object that
/// has never been stored, or an update that does not pin a version.
///
/// On the wire it is a decimal string, and the empty string is the unset
/// value, so clients never need to interpret it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceVersion(u64);

impl ResourceVersion {
    /// The unset version.
    pub const UNSET: Self = Self(0);

    pub const fn new(revision: u64) -> Self {
        Self(revision)
    }

    /// Returns `true` if no version has been assigned.
    pub fn is_unset(&self) -> bool {
        self.0 == 0
    }

    /// The storage revision this token encodes.
    pub fn revision(&self) -> u64 {
        self.0
    }

    /// Parse a client-supplied token. Empty text is the unset version.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::UNSET);
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidResourceVersion(s.to_string()))
    }
}

impl fmt::Display for ResourceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unset() {
            Ok(())
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for ResourceVersion {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for ResourceVersion {
    fn from(revision: u64) -> Self {
        Self(revision)
    }
}

impl Serialize for ResourceVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
