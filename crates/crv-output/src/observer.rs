//! `SinkObserver<S>` — bridges `SimObserver` to a `PersistenceSink`.

use tracing::debug;

use crv_core::Tick;
use crv_sim::{CommitBatch, SimError, SimObserver, SimResult};

use crate::sink::PersistenceSink;

/// A [`SimObserver`] that hands every commit batch to a [`PersistenceSink`].
///
/// Write errors surface as [`SimError::Sink`] and abort the run, so no
/// committed tick is ever silently missing from storage.
pub struct SinkObserver<S: PersistenceSink> {
    sink:    S,
    batches: u64,
    rows:    u64,
}

impl<S: PersistenceSink> SinkObserver<S> {
    pub fn new(sink: S) -> Self {
        Self { sink, batches: 0, rows: 0 }
    }

    /// Batches written so far.
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Rows written so far, across all tables.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Unwrap the inner sink (e.g. to inspect it after the run).
    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: PersistenceSink> SimObserver for SinkObserver<S> {
    fn on_commit(&mut self, batch: &CommitBatch) -> SimResult<()> {
        self.sink
            .write_batch(batch)
            .map_err(|e| SimError::Sink(format!("tick {}: {e}", batch.tick.0)))?;
        self.batches += 1;
        self.rows += (batch.events.len()
            + batch.identity_edges.len()
            + batch.decisions.len()
            + batch.scenarios.len()
            + batch.provider_calls.len()
            + batch.rejections.len()) as u64;
        Ok(())
    }

    fn on_sim_end(&mut self, final_tick: Tick) -> SimResult<()> {
        self.sink.finish().map_err(|e| SimError::Sink(e.to_string()))?;
        debug!(
            target: "crv_output",
            final_tick = final_tick.0,
            batches = self.batches,
            rows = self.rows,
            "sink finished"
        );
        Ok(())
    }
}
