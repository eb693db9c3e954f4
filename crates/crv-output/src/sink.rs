//! The `PersistenceSink` trait implemented by all backends.

use crv_sim::CommitBatch;

use crate::OutputResult;

/// Trait implemented by the CSV, SQLite and Parquet sinks.
pub trait PersistenceSink {
    /// Persist every row of one COMMIT.  Called exactly once per committed
    /// tick, in tick order.
    fn write_batch(&mut self, batch: &CommitBatch) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent.  Writing after `finish` fails with
    /// [`OutputError::Finished`][crate::OutputError::Finished].
    fn finish(&mut self) -> OutputResult<()>;
}
