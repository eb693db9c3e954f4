//! `crv-sim` — the barrier scheduler.
//!
//! # Tick loop
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ① Route       — observations due at `tick`, bucketed per recipient.
//!   ② Interpret   — provider.interpret per observation, ascending AgentId;
//!                   failures fall back and are logged as provider_failure.
//!   ③ PatchApply  — patches applied to staged graph clones
//!                   (parallel with the `parallel` feature).
//!   ④ Value       — readouts over the committed graphs (parallel).
//!   ⑤ Decide      — scenario context, provider.evaluate, candidates,
//!                   score/abstain/choose; ascending AgentId.
//!   ⑥ Act         — chosen candidates routed (pure planning).
//!   ⑦ Commit      — staged graphs, affect, holdings, inbox and RNG state
//!                   swapped in at once; rows handed to the observer; tick+1.
//! ```
//!
//! A raised [`CancelFlag`] is honoured at every phase boundary up to and
//! including the one before COMMIT.  A cancelled tick keeps nothing.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | PatchApply and Value run on Rayon's thread pool.       |
//! | `fx-hash`  | FxHash for graph indices and valuation lookups.        |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! let (store, rngs) = AgentStoreBuilder::new(6, 42).group(..).build()?;
//! let mut sim = SimBuilder::new(RunConfig::new(42, 50), store, rngs, tokens, Provider::mock())
//!     .build()?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod batch;
pub mod builder;
pub mod error;
pub mod identity;
pub mod observer;
pub mod phase;
pub mod sim;

#[cfg(test)]
mod tests;

pub use batch::{
    CommitBatch, DecisionRow, EditRejectionRow, EventRow, IdentityEdgeRow, ProviderCallRow, ScenarioRow,
};
pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use identity::{TwoGroupSeed, seed_two_group_identity};
pub use observer::{CollectingObserver, NoopObserver, SimObserver};
pub use phase::{CancelFlag, RunSummary, TickOutcome, TickPhase, TickReport};
pub use sim::Sim;
