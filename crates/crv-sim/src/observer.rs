//! Simulation observer trait for progress reporting and persistence.

use crv_core::Tick;

use crate::{CommitBatch, SimResult, TickPhase};

/// Callbacks invoked by [`Sim`][crate::Sim] at key points of the tick loop.
///
/// All methods have default no-op implementations.  `on_commit` is the only
/// place rows leave the engine; returning an error there aborts the run with
/// [`SimError::Sink`][crate::SimError::Sink].
pub trait SimObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called on entering each phase.
    fn on_phase(&mut self, _tick: Tick, _phase: TickPhase) {}

    /// Called exactly once per committed tick, before any state is applied.
    /// An error leaves the tick uncommitted and retryable.
    fn on_commit(&mut self, _batch: &CommitBatch) -> SimResult<()> {
        Ok(())
    }

    /// Called when a tick is abandoned.
    fn on_cancelled(&mut self, _tick: Tick, _phase: TickPhase) {}

    /// Called once after the final tick.
    fn on_sim_end(&mut self, _final_tick: Tick) -> SimResult<()> {
        Ok(())
    }
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Keeps every commit batch in memory.  Handy in tests and small demos.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    pub batches:   Vec<CommitBatch>,
    pub cancelled: Vec<(Tick, TickPhase)>,
}

impl SimObserver for CollectingObserver {
    fn on_commit(&mut self, batch: &CommitBatch) -> SimResult<()> {
        self.batches.push(batch.clone());
        Ok(())
    }

    fn on_cancelled(&mut self, tick: Tick, phase: TickPhase) {
        self.cancelled.push((tick, phase));
    }
}
