use serde::{Deserialize, Serialize};

/// Configuration for [`crate::MemoryKvStore`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryKvConfig {
    /// Number of past change events retained for watches that resume from an
    /// older revision. Older starting points fail with `Compacted`.
    pub history_capacity: usize,
    /// Capacity of the live event channel. A watcher further behind than this
    /// is terminated with `WatchLagged`.
    pub channel_capacity: usize,
}

impl Default for MemoryKvConfig {
    fn default() -> Self {
        Self {
            history_capacity: 1000,
            channel_capacity: 1024,
        }
    }
}
