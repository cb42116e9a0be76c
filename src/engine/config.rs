//! Engine configuration: bounds and tunables for a sort run, deserializable
//! from a TOML file or built programmatically.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_chunk_floor() -> usize {
    500_000
}

fn default_chunk_ceiling() -> usize {
    2_000_000
}

fn default_read_deadline() -> Duration {
    Duration::from_secs(5)
}

fn default_merge_batch_size() -> usize {
    1_000
}

fn default_io_buffer_bytes() -> usize {
    4 * 1024 * 1024
}

/// Bounds and tunables for a single [`crate::external_sort`] invocation.
///
/// Construct with `Config::default()` and override individual fields, or
/// load one from a TOML file with [`Config::from_toml_str`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory for spill files; created if absent with owner rwx.
    pub temp_dir: PathBuf,

    /// Lower bound on adaptive chunk sizing, in records.
    pub chunk_floor: usize,

    /// Upper bound on adaptive chunk sizing, in records.
    pub chunk_ceiling: usize,

    /// Per-read drain detector: how long a single input read may block
    /// before the current chunk is treated as final.
    #[serde(with = "humantime_serde")]
    pub read_deadline: Duration,

    /// Records per output-endpoint publish batch.
    pub merge_batch_size: usize,

    /// Spill read/write buffer size, in bytes.
    pub io_buffer_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            temp_dir: std::env::temp_dir().join("streamsort"),
            chunk_floor: default_chunk_floor(),
            chunk_ceiling: default_chunk_ceiling(),
            read_deadline: default_read_deadline(),
            merge_batch_size: default_merge_batch_size(),
            io_buffer_bytes: default_io_buffer_bytes(),
        }
    }
}

impl Config {
    /// Parse a `Config` from TOML text, falling back to defaults for any
    /// field the document omits.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    pub fn with_chunk_bounds(mut self, floor: usize, ceiling: usize) -> Self {
        self.chunk_floor = floor;
        self.chunk_ceiling = ceiling;
        self
    }

    pub fn with_read_deadline(mut self, deadline: Duration) -> Self {
        self.read_deadline = deadline;
        self
    }

    pub fn with_merge_batch_size(mut self, size: usize) -> Self {
        self.merge_batch_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_documented_values() {
        let c = Config::default();
        assert_eq!(c.chunk_floor, 500_000);
        assert_eq!(c.chunk_ceiling, 2_000_000);
        assert_eq!(c.read_deadline, Duration::from_secs(5));
        assert_eq!(c.merge_batch_size, 1_000);
        assert_eq!(c.io_buffer_bytes, 4 * 1024 * 1024);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let c = Config::from_toml_str(r#"chunk_floor = 3
chunk_ceiling = 3
"#)
        .unwrap();
        assert_eq!(c.chunk_floor, 3);
        assert_eq!(c.chunk_ceiling, 3);
        assert_eq!(c.merge_batch_size, 1_000);
    }

    #[test]
    fn read_deadline_accepts_human_duration() {
        let c = Config::from_toml_str(r#"read_deadline = "10s""#).unwrap();
        assert_eq!(c.read_deadline, Duration::from_secs(10));
    }
}
