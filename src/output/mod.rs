//! Output handlers for walked records.

mod console;

pub use console::{ConsoleOutput, Format, MemoryBuffer};

use anyhow::Result;
use crate::walker::Record;

/// Sink for walked records, written in increasing seed order.
pub trait Output: Send + Sync {
    /// Write one record.
    fn record(&self, record: &Record<'_>) -> Result<()>;

    /// Write a run of consecutive records.
    fn records(&self, records: &[Record<'_>]) -> Result<()> {
        for record in records {
            self.record(record)?;
        }
        Ok(())
    }

    /// Flush any buffered output.
    fn flush(&self) -> Result<()>;
}
