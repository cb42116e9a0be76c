//! Chunk builder (C3): adaptive sizing, the ingest loop, and the in-memory
//! sort that precedes every spill.

use std::time::Duration;

use rayon::prelude::*;

use crate::engine::config::Config;
use crate::engine::endpoint::{InputEndpoint, ReadOutcome};
use crate::engine::error::SortError;
use crate::engine::key::{KeyedRecord, Selector};

/// Estimated per-keyed-record memory footprint: 53-byte payload + per-record
/// overhead (Vec header, key enum, heap allocator bookkeeping).
const EST_RECORD_FOOTPRINT_BYTES: usize = 73;

/// Fraction of currently-available memory the chunk budget may claim.
const MEMORY_FRACTION: f64 = 0.60;

/// Above this many records, sort in parallel: pure CPU-bound in-memory work
/// with no I/O to overlap against benefits from the extra cores.
const PARALLEL_SORT_THRESHOLD: usize = 10_000;

/// Decide the per-chunk record budget `B`: `B * EST_RECORD_FOOTPRINT_BYTES`
/// fits within `MEMORY_FRACTION` of currently-available memory, clamped to
/// `[chunk_floor, chunk_ceiling]`.
///
/// Deliberately avoids a "runtime allocator bytes-in-use" heuristic for
/// available memory — that reflects process-level accounting, not the OS,
/// and pins to the floor on a cold process. This probes actual OS-reported
/// available memory where possible and otherwise falls back to the floor,
/// the conservative default (see DESIGN.md).
pub fn compute_chunk_budget(config: &Config) -> usize {
    let available = available_memory_bytes().unwrap_or(0);
    let usable_bytes = (available as f64 * MEMORY_FRACTION) as u64;
    let by_memory = (usable_bytes / EST_RECORD_FOOTPRINT_BYTES as u64) as usize;

    by_memory.clamp(config.chunk_floor, config.chunk_ceiling)
}

/// Best-effort OS-level free-memory probe. Returns `None` (forcing the
/// floor) when the platform offers no cheap way to ask.
#[cfg(target_os = "linux")]
fn available_memory_bytes() -> Option<u64> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    for line in meminfo.lines() {
        if let Some(rest) = line.strip_prefix("MemAvailable:") {
            let kib: u64 = rest.trim().trim_end_matches(" kB").trim().parse().ok()?;
            return Some(kib * 1024);
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
fn available_memory_bytes() -> Option<u64> {
    None
}

/// Outcome of pulling one chunk's worth of records from the input endpoint.
pub enum ChunkOutcome {
    /// A (possibly partial, non-empty) sorted chunk ready to spill.
    Chunk(Vec<KeyedRecord>),
    /// Zero records observed: the phase is done.
    EndOfInput,
}

/// Pull records from `input` until `budget` is filled or the input drains,
/// then sort the chunk in place by the pre-extracted keys.
///
/// Each read is bounded by `read_deadline`; a timeout or drain signal ends
/// ingest for this chunk and the partial chunk is still spilled. Any other
/// read error is fatal and propagated.
pub fn build_chunk(
    input: &mut dyn InputEndpoint,
    selector: Selector,
    budget: usize,
    read_deadline: Duration,
    chunk_index: usize,
) -> Result<ChunkOutcome, SortError> {
    let mut chunk: Vec<KeyedRecord> = Vec::with_capacity(budget);

    while chunk.len() < budget {
        match input.read(read_deadline) {
            ReadOutcome::Record(payload) => {
                // Copy out of whatever buffer the endpoint may reuse.
                let record = payload;
                chunk.push(KeyedRecord::new(record, selector));
            }
            ReadOutcome::Drained => break,
            ReadOutcome::Fatal(source) => {
                return Err(SortError::InputFatal {
                    chunk_index,
                    source,
                });
            }
        }
    }

    if chunk.is_empty() {
        return Ok(ChunkOutcome::EndOfInput);
    }

    sort_chunk(&mut chunk);
    Ok(ChunkOutcome::Chunk(chunk))
}

/// Sort `chunk` in place using only the pre-extracted keys — record bytes
/// are never reparsed. Not required to be stable; chunks past the parallel
/// threshold sort with rayon since this is pure CPU-bound work with no I/O
/// dependency to serialize against.
fn sort_chunk(chunk: &mut [KeyedRecord]) {
    if chunk.len() > PARALLEL_SORT_THRESHOLD {
        chunk.par_sort_unstable_by(|a, b| a.compare(b));
    } else {
        chunk.sort_unstable_by(|a, b| a.compare(b));
    }
}
