//! Orchestration: the phase driver. Validates the selector, computes the
//! chunk budget, drives chunking to drain, then drives the k-way merge.

use std::time::Instant;

use tracing::{info, info_span};

use crate::engine::builder::{build_chunk, compute_chunk_budget, ChunkOutcome};
use crate::engine::chunkstore::{chunk_path, ensure_temp_dir, write_chunk};
use crate::engine::config::Config;
use crate::engine::endpoint::{InputEndpoint, OutputEndpoint};
use crate::engine::error::SortError;
use crate::engine::key::Selector;
use crate::engine::merge::merge_chunks;

/// Summary of a completed run, returned on success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortStats {
    pub chunks_written: usize,
    pub records_ingested: u64,
    pub records_emitted: u64,
}

/// Run the external sort: consume `input` to exhaustion under `selector`,
/// spilling sorted chunks under `config.temp_dir`, then k-way merge them to
/// `output` in globally non-decreasing key order.
///
/// Returns success (with zero or more chunks merged) or a structured
/// [`SortError`]. A crash mid-run voids the run; the caller re-invokes with
/// a fresh consumer identity on the input.
pub fn external_sort(
    input: &mut dyn InputEndpoint,
    output: &mut dyn OutputEndpoint,
    selector: Selector,
    config: &Config,
) -> Result<SortStats, SortError> {
    ensure_temp_dir(&config.temp_dir)?;

    let budget = compute_chunk_budget(config);
    info!(selector = %selector, budget, "chunk budget computed");

    let mut chunk_paths = Vec::new();
    let mut records_ingested: u64 = 0;

    let chunking_span = info_span!("chunking");
    let _enter = chunking_span.enter();
    let chunking_start = Instant::now();

    loop {
        let chunk_index = chunk_paths.len();
        match build_chunk(input, selector, budget, config.read_deadline, chunk_index)? {
            ChunkOutcome::EndOfInput => break,
            ChunkOutcome::Chunk(chunk) => {
                records_ingested += chunk.len() as u64;
                let path = chunk_path(&config.temp_dir, chunk_index);
                write_chunk(&path, &chunk, config.io_buffer_bytes)?;
                info!(chunk_index, records = chunk.len(), "chunk spilled");
                chunk_paths.push(path);
            }
        }
    }

    info!(
        chunks = chunk_paths.len(),
        records_ingested,
        elapsed_ms = chunking_start.elapsed().as_millis() as u64,
        "chunking phase complete"
    );
    drop(_enter);

    if chunk_paths.is_empty() {
        return Ok(SortStats {
            chunks_written: 0,
            records_ingested: 0,
            records_emitted: 0,
        });
    }

    let merging_span = info_span!("merging", spill_files = chunk_paths.len());
    let _enter = merging_span.enter();
    let merging_start = Instant::now();

    let records_emitted = merge_chunks(
        &chunk_paths,
        selector,
        output,
        config.merge_batch_size,
        config.io_buffer_bytes,
    )?;

    info!(
        records_emitted,
        elapsed_ms = merging_start.elapsed().as_millis() as u64,
        "merging phase complete"
    );

    Ok(SortStats {
        chunks_written: chunk_paths.len(),
        records_ingested,
        records_emitted,
    })
}
