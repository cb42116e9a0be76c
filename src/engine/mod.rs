pub mod builder;
pub mod chunkstore;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod key;
pub mod merge;
pub mod orchestrator;

pub use config::Config;
pub use endpoint::{InMemoryInput, InMemoryOutput, InputEndpoint, OutputEndpoint, ReadOutcome};
pub use error::{Result, SortError};
pub use key::{parse_selector, Key, KeyedRecord, Selector};
pub use orchestrator::{external_sort, SortStats};
