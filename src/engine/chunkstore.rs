//! Chunk store (C2): persist a sorted run to a spill file and stream it back
//! record-by-record through large-buffered I/O.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::engine::error::SortError;
use crate::engine::key::KeyedRecord;

/// Name a spill file for chunk `index` under `dir`.
pub fn chunk_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("chunk_{index}.tmp"))
}

/// Write `records` (already sorted by the caller) to `path`, one per line.
/// Flushes on completion; fsync is intentionally skipped — spill files are
/// scratch, and a crash voids the run regardless.
pub fn write_chunk(
    path: &Path,
    records: &[KeyedRecord],
    io_buffer_bytes: usize,
) -> Result<(), SortError> {
    let file = File::create(path).map_err(|source| SortError::SpillIo {
        phase: "spill-write",
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::with_capacity(io_buffer_bytes, file);

    for keyed in records {
        writer
            .write_all(&keyed.record)
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(|source| SortError::SpillIo {
                phase: "spill-write",
                path: path.to_path_buf(),
                source,
            })?;
    }

    writer.flush().map_err(|source| SortError::SpillIo {
        phase: "spill-write",
        path: path.to_path_buf(),
        source,
    })
}

/// Per-spill-file reader state: a buffered handle that yields one
/// newline-terminated record at a time, trailing `\n` stripped. The final
/// record of a file is accepted without a trailing newline.
pub struct ScanCursor {
    reader: BufReader<File>,
    path: PathBuf,
}

impl ScanCursor {
    pub fn open(path: &Path, io_buffer_bytes: usize) -> Result<Self, SortError> {
        let file = File::open(path).map_err(|source| SortError::SpillIo {
            phase: "merge-open",
            path: path.to_path_buf(),
            source,
        })?;
        Ok(ScanCursor {
            reader: BufReader::with_capacity(io_buffer_bytes, file),
            path: path.to_path_buf(),
        })
    }

    /// Yield the next record, or `None` at end of file.
    pub fn next(&mut self) -> Result<Option<Vec<u8>>, SortError> {
        let mut buf = Vec::new();
        let n = self
            .reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| SortError::SpillIo {
                phase: "merge-read",
                path: self.path.clone(),
                source,
            })?;
        if n == 0 {
            return Ok(None);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        Ok(Some(buf))
    }
}

/// Best-effort delete; cleanup failures are swallowed, matching the rest of
/// this module's policy that spill files are disposable scratch state.
pub fn remove_chunk(path: &Path) {
    let _ = std::fs::remove_file(path);
}

/// Create `dir` (and parents) with owner read/write/execute permissions if
/// it does not already exist.
pub fn ensure_temp_dir(dir: &Path) -> Result<(), SortError> {
    std::fs::create_dir_all(dir).map_err(|source| SortError::TempDirUnavailable {
        path: dir.to_path_buf(),
        source,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o700);
        std::fs::set_permissions(dir, perms).map_err(|source| SortError::TempDirUnavailable {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    Ok(())
}
