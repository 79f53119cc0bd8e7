//! Log handlers.

use std::cell::RefCell;
use std::collections::VecDeque;

use super::level::Level;
use super::record::LogRecord;

/// Receives records published on a logger or any of its descendants.
pub trait LogHandler {
    /// Handle one record.
    fn publish(&self, record: &LogRecord);
}

impl<F> LogHandler for F
where
    F: Fn(&LogRecord),
{
    fn publish(&self, record: &LogRecord) {
        self(record);
    }
}

/// Keeps the most recent records in memory.
#[derive(Debug)]
pub struct MemoryHandler {
    records: RefCell<VecDeque<LogRecord>>,
    capacity: usize,
}

impl MemoryHandler {
    /// Default number of records kept.
    pub const DEFAULT_CAPACITY: usize = 500;

    /// Create a handler keeping [`Self::DEFAULT_CAPACITY`] records.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a handler keeping at most `capacity` records (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: RefCell::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Snapshot of the buffered records, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.borrow().iter().cloned().collect()
    }

    /// Messages of the buffered records, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .map(|record| record.message.clone())
            .collect()
    }

    /// Number of buffered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    /// Whether no records are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Drop all buffered records.
    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}

impl Default for MemoryHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl LogHandler for MemoryHandler {
    fn publish(&self, record: &LogRecord) {
        let mut records = self.records.borrow_mut();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record.clone());
    }
}

/// Forwards records to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHandler;

impl LogHandler for TracingHandler {
    fn publish(&self, record: &LogRecord) {
        let logger = record.logger_name.as_str();
        let sequence = record.sequence;
        let message = record.message.as_str();
        let error = record.exception_text();
        let level = record.level;
        if level >= Level::SEVERE {
            tracing::error!(logger, sequence, ?error, "{message}");
        } else if level >= Level::WARNING {
            tracing::warn!(logger, sequence, ?error, "{message}");
        } else if level >= Level::INFO {
            tracing::info!(logger, sequence, ?error, "{message}");
        } else if level >= Level::FINE {
            tracing::debug!(logger, sequence, ?error, "{message}");
        } else {
            tracing::trace!(logger, sequence, ?error, "{message}");
        }
    }
}
