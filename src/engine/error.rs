//! Structured errors for the external-sort engine.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong running [`crate::external_sort`].
///
/// Every fatal variant carries enough context (phase, chunk index, path) to
/// diagnose without re-running.
#[derive(Debug, Error)]
pub enum SortError {
    #[error("selector {0:?} is not one of id, name, continent")]
    InvalidSelector(String),

    #[error("temp directory {path} is unavailable: {source}")]
    TempDirUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input endpoint failed during chunk {chunk_index}: {source}")]
    InputFatal {
        chunk_index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("spill file {path} failed during {phase}: {source}")]
    SpillIo {
        phase: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output endpoint publish failed after {records_emitted} records: {source}")]
    OutputIo {
        records_emitted: u64,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SortError>;
