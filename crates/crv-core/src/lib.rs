//! `crv-core` — foundational types for the crv step engine.
//!
//! This crate is a dependency of every other `crv-*` crate.  It has no `crv-*`
//! dependencies and a small external footprint (`rand`, `thiserror`, `serde`,
//! `serde_json`, `sha2`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`ids`]     | `AgentId`, `TokenId`, `GroupId`, `RoomId`, `EntityId`, `EnvelopeId` |
//! | [`time`]    | `Tick`                                                       |
//! | [`rng`]     | `AgentRng` (per-agent, seeded from the run seed)             |
//! | [`grammar`] | `ActionKind`, `ChannelKind`, `Valence` closed enums          |
//! | [`affect`]  | `Persona`, `Affect`, `Appraisal`                             |
//! | [`config`]  | `RunConfig`, `ValuationParams`, `DecisionParams`, …          |
//! | [`version`] | `SchemaVersion`, `ENGINE_SCHEMA`                             |
//! | [`hashing`] | `ContextHash`, canonical JSON + SHA-256                      |
//! | [`error`]   | `CrvError`, `CrvResult`                                      |

pub mod affect;
pub mod config;
pub mod error;
pub mod grammar;
pub mod hashing;
pub mod ids;
pub mod rng;
pub mod time;
pub mod version;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use affect::{Affect, Appraisal, Persona};
pub use config::{DecisionParams, InterpretFallback, RunConfig, ValuationParams};
pub use error::{CrvError, CrvResult};
pub use grammar::{ActionKind, ChannelKind, Valence};
pub use hashing::{ContextHash, canonical_hash};
pub use ids::{AgentId, EntityId, EnvelopeId, GroupId, RoomId, TokenId};
pub use rng::AgentRng;
pub use time::Tick;
pub use version::{ENGINE_SCHEMA, SchemaVersion};
