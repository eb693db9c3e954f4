//! `crv-agent` — Structure-of-Arrays agent population storage.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`store`]   | `AgentStore` (SoA arrays), `AgentRngs` (per-agent RNG)     |
//! | [`builder`] | `AgentStoreBuilder` (fluent construction)                  |
//! | [`tokens`]  | `TokenCatalog`, `TokenSpec` (the run's object universe)    |
//!
//! Agents are created once at world initialization and never removed, so an
//! `AgentId` is a stable index into every array.

pub mod builder;
pub mod store;
pub mod tokens;

#[cfg(test)]
mod tests;

pub use builder::AgentStoreBuilder;
pub use store::{AgentRngs, AgentStore};
pub use tokens::{TokenCatalog, TokenSpec};
