//! Tick phases, cancellation and per-tick outcomes.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crv_core::Tick;

/// The phases of one tick, in execution order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TickPhase {
    TickStart,
    Route,
    Interpret,
    PatchApply,
    Value,
    Decide,
    Act,
    Commit,
}

impl TickPhase {
    pub const ALL: [TickPhase; 8] = [
        TickPhase::TickStart,
        TickPhase::Route,
        TickPhase::Interpret,
        TickPhase::PatchApply,
        TickPhase::Value,
        TickPhase::Decide,
        TickPhase::Act,
        TickPhase::Commit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TickPhase::TickStart => "tick_start",
            TickPhase::Route => "route",
            TickPhase::Interpret => "interpret",
            TickPhase::PatchApply => "patch_apply",
            TickPhase::Value => "value",
            TickPhase::Decide => "decide",
            TickPhase::Act => "act",
            TickPhase::Commit => "commit",
        }
    }
}

impl fmt::Display for TickPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── CancelFlag ────────────────────────────────────────────────────────────────

/// Shared cancellation switch.  Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Counters for one committed tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick:              Tick,
    pub delivered:         usize,
    pub actions_executed:  usize,
    pub actions_rejected:  usize,
    pub edits_applied:     usize,
    pub edits_rejected:    usize,
    pub provider_failures: usize,
    pub abstentions:       usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Committed(TickReport),
    /// The tick was abandoned at `phase`; nothing it computed was kept.
    Cancelled { tick: Tick, phase: TickPhase },
}

impl TickOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TickOutcome::Cancelled { .. })
    }
}

/// Result of [`Sim::run`][crate::Sim::run] and
/// [`Sim::run_ticks`][crate::Sim::run_ticks].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks_committed: u64,
    /// The tick the engine will execute next.
    pub final_tick:      Tick,
    /// Set when the run stopped on a raised [`CancelFlag`].
    pub cancelled:       Option<TickPhase>,
}
