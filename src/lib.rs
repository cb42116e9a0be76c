//! External merge-sort engine for ordering large CSV record streams under a
//! fixed memory budget: consume from an input message topic, spill
//! memory-budgeted sorted chunks to disk, k-way merge them with a min-heap,
//! and republish in globally sorted order to an output topic.
//!
//! The broker itself is out of scope — see [`engine::endpoint`] for the two
//! abstract endpoints this crate depends on.

/// Use mimalloc as the global allocator. Sort workloads allocate one small
/// buffer per ingested record; mimalloc's thread-local caching keeps that
/// cheap at the record counts this engine is built for.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod engine;

pub use engine::{
    external_sort, parse_selector, Config, InMemoryInput, InMemoryOutput, InputEndpoint, Key,
    KeyedRecord, OutputEndpoint, ReadOutcome, Result, Selector, SortError, SortStats,
};
