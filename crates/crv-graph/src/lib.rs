//! `crv-graph` — the per-agent representation graph.
//!
//! Each agent owns one [`RepresentationGraph`]: a flat arena of weighted,
//! typed edges describing how the agent relates itself, other agents and
//! tokens.  Cycles (a→b→a) are ordinary data; there are no pointers between
//! edges, only an index from [`EdgeKey`] to arena slot.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                     |
//! |-----------|--------------------------------------------------------------|
//! | [`kind`]  | `EdgeKind` (12 kinds), `Slot`, required-slot table, ranges   |
//! | [`key`]   | `EdgeKey`, constructors per kind, `EdgeFilter`               |
//! | [`edit`]  | `GraphEdit`, `Selector`, `RepresentationPatch`               |
//! | [`graph`] | `RepresentationGraph`, `Edge`, `PatchReport`                 |
//! | [`error`] | `GraphError`, `GraphResult`                                  |
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                       |
//! |-----------|--------------------------------------------------------------|
//! | `fx-hash` | Use `rustc_hash::FxHashMap` for the key index                |

pub mod edit;
pub mod error;
pub mod graph;
pub mod key;
pub mod kind;


pub use edit::{GraphEdit, RepresentationPatch, Selector};
pub use error::{GraphError, GraphResult};
pub use graph::{Edge, PatchReport, RepresentationGraph};
pub use key::{EdgeFilter, EdgeKey};
pub use kind::{EdgeKind, Slot};
