//! CSV backend.
//!
//! One file per table in the output directory, each with a header row.
//! Rows are serialized with serde; `None` becomes an empty field.

use std::fs::File;
use std::path::Path;

use csv::{Writer, WriterBuilder};
use serde::Serialize;

use crv_sim::CommitBatch;

use crate::sink::PersistenceSink;
use crate::{OutputError, OutputResult, columns};

/// Writes commit batches to one CSV file per table.
pub struct CsvSink {
    events:         Writer<File>,
    identity_edges: Writer<File>,
    decisions:      Writer<File>,
    scenarios:      Writer<File>,
    provider_calls: Writer<File>,
    rejections:     Writer<File>,
    finished:       bool,
}

fn open(dir: &Path, table: &str, header: &[&str]) -> OutputResult<Writer<File>> {
    let mut w = WriterBuilder::new()
        .has_headers(false)
        .from_path(dir.join(format!("{table}.csv")))?;
    w.write_record(header)?;
    Ok(w)
}

fn write_all<T: Serialize>(w: &mut Writer<File>, rows: &[T]) -> OutputResult<()> {
    for row in rows {
        w.serialize(row)?;
    }
    Ok(())
}

impl CsvSink {
    /// Create (truncating) the CSV files in `dir` and write headers.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        Ok(Self {
            events:         open(dir, "events", &columns::EVENTS)?,
            identity_edges: open(dir, "identity_edges", &columns::IDENTITY_EDGES)?,
            decisions:      open(dir, "decisions", &columns::DECISIONS)?,
            scenarios:      open(dir, "scenarios", &columns::SCENARIOS)?,
            provider_calls: open(dir, "provider_calls", &columns::PROVIDER_CALLS)?,
            rejections:     open(dir, "edit_rejections", &columns::EDIT_REJECTIONS)?,
            finished:       false,
        })
    }
}

impl PersistenceSink for CsvSink {
    fn write_batch(&mut self, batch: &CommitBatch) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        write_all(&mut self.events, &batch.events)?;
        write_all(&mut self.identity_edges, &batch.identity_edges)?;
        write_all(&mut self.decisions, &batch.decisions)?;
        write_all(&mut self.scenarios, &batch.scenarios)?;
        write_all(&mut self.provider_calls, &batch.provider_calls)?;
        write_all(&mut self.rejections, &batch.rejections)?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.events.flush()?;
        self.identity_edges.flush()?;
        self.decisions.flush()?;
        self.scenarios.flush()?;
        self.provider_calls.flush()?;
        self.rejections.flush()?;
        Ok(())
    }
}
