//! The provider capability set and its closed variant enum.

use std::fmt;

use serde::{Deserialize, Serialize};

use crv_core::{ContextHash, InterpretFallback, Persona, SchemaVersion};
use crv_router::EventEnvelope;

use crate::{
    AgentView, CachedOracle, InterpretOutcome, Interpretation, MockProvider, PolicyLookup,
    ProviderResult, ScenarioContext, mock,
};

// ── Requests / estimates ──────────────────────────────────────────────────────

/// Ask for the value of one token in one scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluateRequest {
    /// Hash of `scenario`; the cache key.
    pub context_hash: ContextHash,
    pub persona:      Persona,
    /// Canonical hash of `persona`.
    pub persona_hash: ContextHash,
    pub model:        String,
    pub scenario:     ScenarioContext,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    Cache,
    Computed,
    Fallback,
}

impl EstimateSource {
    pub fn as_str(self) -> &'static str {
        match self {
            EstimateSource::Cache => "cache",
            EstimateSource::Computed => "computed",
            EstimateSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for EstimateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueEstimate {
    pub value:  f64,
    pub source: EstimateSource,
}

// ── Fallbacks ─────────────────────────────────────────────────────────────────

/// The estimate used when a provider fails: the graph readout itself.
///
/// A pure function of the request, so every replay resolves the same way.
pub fn fallback_estimate(req: &EvaluateRequest) -> ValueEstimate {
    ValueEstimate { value: req.scenario.readout, source: EstimateSource::Fallback }
}

/// The outcome used when interpretation fails.
pub fn fallback_interpretation(
    fallback: InterpretFallback,
    view: &AgentView<'_>,
    observation: &EventEnvelope,
) -> InterpretOutcome {
    match fallback {
        InterpretFallback::NoPatch => InterpretOutcome::without_patch(Interpretation::inert(
            observation.payload().kind().as_str(),
        )),
        InterpretFallback::Rules => mock::interpret_rules(view, observation),
    }
}

// ── Trait ─────────────────────────────────────────────────────────────────────

/// Cognition provider capability set.
///
/// Implementations must be deterministic for identical inputs and must not
/// retain borrowed views.  Calls happen sequentially in ascending agent order,
/// so interior mutability (a cache) evolves identically across runs.
pub trait CognitionProvider: Send + Sync {
    /// Short name used in logs and audit rows.
    fn name(&self) -> &str;

    /// Schema version of the provider's contract; checked before tick 0.
    fn schema_version(&self) -> SchemaVersion;

    /// Interpret one observation delivered to `view.agent`.
    fn interpret(
        &self,
        view: &AgentView<'_>,
        observation: &EventEnvelope,
    ) -> ProviderResult<InterpretOutcome>;

    /// Estimate the value of the token described by `req`.
    fn evaluate(&self, req: &EvaluateRequest) -> ProviderResult<ValueEstimate>;
}

// ── Provider ──────────────────────────────────────────────────────────────────

/// The provider variants selectable at configuration time.
pub enum Provider {
    Mock(MockProvider),
    CachedOracle(CachedOracle),
    PolicyLookup(PolicyLookup),
}

impl Provider {
    pub fn mock() -> Self {
        Provider::Mock(MockProvider::new())
    }

    /// Wrap `self` in a cache.
    pub fn cached(self) -> Self {
        Provider::CachedOracle(CachedOracle::new(self))
    }
}

impl CognitionProvider for Provider {
    fn name(&self) -> &str {
        match self {
            Provider::Mock(p) => p.name(),
            Provider::CachedOracle(p) => p.name(),
            Provider::PolicyLookup(p) => p.name(),
        }
    }

    fn schema_version(&self) -> SchemaVersion {
        match self {
            Provider::Mock(p) => p.schema_version(),
            Provider::CachedOracle(p) => p.schema_version(),
            Provider::PolicyLookup(p) => p.schema_version(),
        }
    }

    fn interpret(
        &self,
        view: &AgentView<'_>,
        observation: &EventEnvelope,
    ) -> ProviderResult<InterpretOutcome> {
        match self {
            Provider::Mock(p) => p.interpret(view, observation),
            Provider::CachedOracle(p) => p.interpret(view, observation),
            Provider::PolicyLookup(p) => p.interpret(view, observation),
        }
    }

    fn evaluate(&self, req: &EvaluateRequest) -> ProviderResult<ValueEstimate> {
        match self {
            Provider::Mock(p) => p.evaluate(req),
            Provider::CachedOracle(p) => p.evaluate(req),
            Provider::PolicyLookup(p) => p.evaluate(req),
        }
    }
}
