//! `crv-decision` — turn value estimates into at most one action per agent
//! per tick.
//!
//! ```text
//! score_i = value_estimate_i - cost_i
//! max(score) < abstain_threshold   → abstain
//! deterministic                    → argmax, ties to the lowest index
//! stochastic                       → softmax(score / temperature), sampled
//!                                    from the agent's own RNG
//! ```
//!
//! Candidates come from [`generate_candidates`]: one holding move per token
//! (acquire when unheld, relinquish when held) followed by one endorsement.

pub mod candidate;
pub mod error;
pub mod stage;


pub use candidate::{Candidate, TokenEstimate, generate_candidates};
pub use error::{DecisionError, DecisionResult};
pub use stage::{Decision, ScoredCandidate, decide, softmax};
