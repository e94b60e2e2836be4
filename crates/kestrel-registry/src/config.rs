use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Per-resource store behaviour.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Return the last state of a deleted object instead of a status
    /// acknowledgement.
    pub return_deleted_object: bool,
    /// Events buffered per watcher before the producer waits for the
    /// consumer.
    pub watch_channel_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            return_deleted_object: false,
            watch_channel_capacity: 100,
        }
    }
}

impl StoreConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input).map_err(|e| RegistryError::Config(e.to_string()))?;
        if config.watch_channel_capacity == 0 {
            return Err(RegistryError::Config(
                "watch_channel_capacity must be greater than zero".into(),
            ));
        }
        Ok(config)
    }

    pub fn with_return_deleted_object(mut self, enabled: bool) -> Self {
        self.return_deleted_object = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StoreConfig::default();
        assert!(!config.return_deleted_object);
        assert_eq!(config.watch_channel_capacity, 100);
    }

    #[test]
    fn partial_toml() {
        let config = StoreConfig::from_toml_str("return_deleted_object = true").unwrap();
        assert!(config.return_deleted_object);
        assert_eq!(config.watch_channel_capacity, 100);
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = StoreConfig::from_toml_str("watch_channel_capacity = 0").unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(StoreConfig::from_toml_str("return_deleted_object = ").is_err());
    }
}
