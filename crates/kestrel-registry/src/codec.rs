//! JSON encoding of stored records.
//!
//! The resource version is owned by the store, not by the value: it is
//! cleared before a record is written and filled in from the entry's
//! version when it is read back.

use bytes::Bytes;
use kestrel_types::{Resource, ResourceVersion};

use crate::error::{RegistryError, Result};

/// Encode `obj` for storage, without its resource version.
pub fn encode<T: Resource>(obj: &T) -> Result<Bytes> {
    let mut stored = obj.clone();
    stored.meta_mut().resource_version = ResourceVersion::UNSET;
    serde_json::to_vec(&stored)
        .map(Bytes::from)
        .map_err(|e| RegistryError::Codec(format!("encode {}: {e}", T::KIND)))
}

/// Decode a stored value and stamp it with `version`.
pub fn decode<T: Resource>(value: &[u8], version: u64) -> Result<T> {
    let mut obj: T = serde_json::from_slice(value)
        .map_err(|e| RegistryError::Codec(format!("decode {}: {e}", T::KIND)))?;
    obj.meta_mut().resource_version = ResourceVersion::new(version);
    Ok(obj)
}
