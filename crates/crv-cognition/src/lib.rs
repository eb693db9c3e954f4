//! `crv-cognition` — the interpretation boundary.
//!
//! The engine never reasons about observations itself.  It hands each
//! observation to a [`CognitionProvider`], which returns an
//! [`Interpretation`] and optionally a [`RepresentationPatch`]; and it asks
//! the provider for a [`ValueEstimate`] of each candidate token.
//!
//! # Crate layout
//!
//! | Module             | Contents                                              |
//! |--------------------|-------------------------------------------------------|
//! | [`provider`]       | `CognitionProvider` trait, `Provider` enum, requests  |
//! | [`interpretation`] | `Interpretation`, `Target`, `InterpretOutcome`        |
//! | [`context`]        | `AgentView`, `ScenarioContext`, ownership/alignment   |
//! | [`mock`]           | `MockProvider`: deterministic rule set                |
//! | [`cached`]         | `CachedOracle`: memoizes an inner provider            |
//! | [`policy`]         | `PolicyTable` (CSV), `PolicyLookup` provider          |
//! | [`error`]          | `ProviderError`, `PolicyError`                        |
//!
//! # Determinism
//!
//! Providers are called sequentially in ascending `AgentId` order, so a
//! cache evolves identically across runs.  When a provider fails, the
//! engine substitutes a fallback that is a pure function of the request
//! ([`fallback_estimate`], [`fallback_interpretation`]).
//!
//! [`RepresentationPatch`]: crv_graph::RepresentationPatch

pub mod cached;
pub mod context;
pub mod error;
pub mod interpretation;
pub mod mock;
pub mod policy;
pub mod provider;

#[cfg(test)]
mod tests;

pub use cached::{CacheStats, CachedOracle};
pub use context::{AgentView, OwnerStatus, PeerAlignment, ScenarioContext};
pub use error::{PolicyError, PolicyResult, ProviderError, ProviderResult};
pub use interpretation::{InterpretOutcome, Interpretation, Target};
pub use mock::MockProvider;
pub use policy::{PolicyEntry, PolicyKey, PolicyLookup, PolicyTable};
pub use provider::{
    CognitionProvider, EstimateSource, EvaluateRequest, Provider, ValueEstimate,
    fallback_estimate, fallback_interpretation,
};
