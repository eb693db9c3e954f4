//! `crv-valuation` — bounded valuation readout.
//!
//! ```text
//! V = v_base + phi * tanh(gamma * U)
//!
//! U = beta_self * s(o) + beta_trace * (r+(o) - r-(o)) + beta_anchor * (s+ - s-) * s(o)
//!   + alpha_triad    * Σ_j (a(j) + u+(j) - u-(j)) * b(j,o)
//!   + alpha_mediated * (Σ_{j,k} a(j) * d(j,k) * b(k,o) + Σ_{j,k} q(j,k,o) * (a(j) + a(k)) / 2)
//!   + alpha_oo       * Σ_{o'} c(o,o') * (s(o') + r+(o') - r-(o'))
//! ```
//!
//! | symbol      | edge kind                                   |
//! |-------------|---------------------------------------------|
//! | `s(o)`      | `self_to_object`                            |
//! | `r±(o)`     | `object_to_{positive,negative}_valence`     |
//! | `s±`        | `self_to_{positive,negative}_valence`       |
//! | `a(j)`      | `self_to_agent`                             |
//! | `u±(j)`     | `agent_to_{positive,negative}_valence`      |
//! | `b(j,o)`    | `agent_to_object`                           |
//! | `d(j,k)`    | `agent_to_agent`                            |
//! | `q(j,k,o)`  | `agent_pair_to_object`                      |
//! | `c(o,o')`   | `object_to_object`, either direction        |
//!
//! Readouts are pure: they take `&RepresentationGraph` and never mutate it,
//! so readouts for different agents may run concurrently.

mod readout;


pub use readout::{GraphView, Readout, Terms, readout, readout_all};
