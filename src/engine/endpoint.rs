//! The two abstract broker endpoints the engine depends on. Connection
//! pooling, partition assignment, and wire protocol are out of scope — an
//! implementation only needs to satisfy these two traits.

use std::collections::VecDeque;
use std::io;
use std::sync::mpsc;
use std::time::Duration;

/// Result of a single bounded read from the input endpoint.
pub enum ReadOutcome {
    /// A record was available. May alias an internal buffer the endpoint
    /// reuses on the next call — the engine is required to copy it out
    /// before returning from [`InputEndpoint::read`].
    Record(Vec<u8>),
    /// No record arrived before the deadline, or the topic is known empty.
    /// Recoverable: the current chunk is treated as final, not as an error.
    Drained,
    /// A non-timeout, non-drain failure. Fatal to the phase.
    Fatal(io::Error),
}

/// Consumed abstraction over the input message topic.
pub trait InputEndpoint {
    /// Block for up to `deadline` waiting for the next record.
    fn read(&mut self, deadline: Duration) -> ReadOutcome;
}

/// Consumed abstraction over the output message topic.
pub trait OutputEndpoint {
    /// Publish a batch of up to ≈1000 records, in order.
    fn publish(&mut self, batch: &[Vec<u8>]) -> io::Result<()>;
}

/// Wraps a blocking, non-cancellable read call with a deadline, for endpoint
/// implementations with no native timeout support. The read runs to
/// completion on a detached worker thread regardless of whether the caller
/// gives up waiting — this bounds *our* wait, not the endpoint's work.
///
/// A record is a consumed message: once read off the broker it must not be
/// discarded just because it finished arriving after the deadline. So a
/// timed-out call does not abandon its worker thread — it stashes the
/// receiver and hands the record back on a later call, once it arrives,
/// instead of silently dropping it.
#[derive(Default)]
pub struct DeadlineReader {
    pending: Option<mpsc::Receiver<io::Result<Option<Vec<u8>>>>>,
}

impl DeadlineReader {
    pub fn new() -> Self {
        DeadlineReader { pending: None }
    }

    /// Block for up to `deadline` waiting for `read_once` to finish. If a
    /// prior call timed out with a read still in flight, this waits on that
    /// same in-flight read instead of starting a new one — `read_once` is
    /// only invoked when there is no pending read to collect.
    pub fn read<F>(&mut self, read_once: F, deadline: Duration) -> ReadOutcome
    where
        F: FnOnce() -> io::Result<Option<Vec<u8>>> + Send + 'static,
    {
        let rx = self.pending.take().unwrap_or_else(|| {
            let (tx, rx) = mpsc::channel();
            std::thread::spawn(move || {
                let _ = tx.send(read_once());
            });
            rx
        });

        match rx.recv_timeout(deadline) {
            Ok(Ok(Some(record))) => ReadOutcome::Record(record),
            Ok(Ok(None)) => ReadOutcome::Drained,
            Ok(Err(e)) => ReadOutcome::Fatal(e),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                self.pending = Some(rx);
                ReadOutcome::Drained
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => ReadOutcome::Drained,
        }
    }
}

/// An in-memory stand-in for the input endpoint: replays a fixed queue of
/// records, then reports drained forever. Used by tests and by callers
/// prototyping against the engine before a real broker client exists.
#[derive(Debug, Default)]
pub struct InMemoryInput {
    records: VecDeque<Vec<u8>>,
}

impl InMemoryInput {
    pub fn new(records: impl IntoIterator<Item = Vec<u8>>) -> Self {
        InMemoryInput {
            records: records.into_iter().collect(),
        }
    }
}

impl InputEndpoint for InMemoryInput {
    fn read(&mut self, _deadline: Duration) -> ReadOutcome {
        match self.records.pop_front() {
            Some(record) => ReadOutcome::Record(record),
            None => ReadOutcome::Drained,
        }
    }
}

/// An in-memory stand-in for the output endpoint: accumulates every
/// published record in arrival order.
#[derive(Debug, Default)]
pub struct InMemoryOutput {
    pub emitted: Vec<Vec<u8>>,
}

impl InMemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputEndpoint for InMemoryOutput {
    fn publish(&mut self, batch: &[Vec<u8>]) -> io::Result<()> {
        self.emitted.extend_from_slice(batch);
        Ok(())
    }
}
