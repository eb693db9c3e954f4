//! Immutable run configuration.
//!
//! `RunConfig` is assembled by the application (JSON file, CLI flags) and
//! handed to the scheduler once.  The scheduler holds
//! it for the whole run; every other component receives `&` access only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ActionKind, CrvError, CrvResult, Tick};

/// Default number of ticks per persisted partition bucket.
pub const DEFAULT_TICK_BUCKET_SIZE: u64 = 100;

// ── RunConfig ─────────────────────────────────────────────────────────────────

/// Top-level run configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Total ticks to simulate.
    pub total_ticks: u64,

    /// Rows are partitioned by `tick / tick_bucket_size`.
    #[serde(default = "default_bucket_size")]
    pub tick_bucket_size: u64,

    /// Worker thread count for the `parallel` feature.  `None` uses Rayon's
    /// global pool.
    #[serde(default)]
    pub num_threads: Option<usize>,

    /// How strongly one salient appraisal moves an agent's affect per tick.
    #[serde(default = "default_affect_rate")]
    pub affect_rate: f64,

    /// Model label used in offline policy keys.
    #[serde(default = "default_model_label")]
    pub model_label: String,

    #[serde(default)]
    pub valuation: ValuationParams,

    #[serde(default)]
    pub decision: DecisionParams,

    #[serde(default)]
    pub interpret_fallback: InterpretFallback,
}

fn default_bucket_size() -> u64 {
    DEFAULT_TICK_BUCKET_SIZE
}

fn default_affect_rate() -> f64 {
    0.2
}

fn default_model_label() -> String {
    "mock".to_owned()
}

impl RunConfig {
    /// Configuration with defaults for everything except seed and length.
    pub fn new(seed: u64, total_ticks: u64) -> Self {
        Self {
            seed,
            total_ticks,
            tick_bucket_size:   DEFAULT_TICK_BUCKET_SIZE,
            num_threads:        None,
            affect_rate:        default_affect_rate(),
            model_label:        default_model_label(),
            valuation:          ValuationParams::default(),
            decision:           DecisionParams::default(),
            interpret_fallback: InterpretFallback::default(),
        }
    }

    /// The tick at which the run ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    /// Reject configurations the engine cannot run deterministically.
    pub fn validate(&self) -> CrvResult<()> {
        if self.tick_bucket_size == 0 {
            return Err(CrvError::Config("tick_bucket_size must be >= 1".into()));
        }
        if !self.affect_rate.is_finite() || !(0.0..=1.0).contains(&self.affect_rate) {
            return Err(CrvError::Config(format!(
                "affect_rate must be in [0, 1], got {}",
                self.affect_rate
            )));
        }
        if self.num_threads == Some(0) {
            return Err(CrvError::Config("num_threads must be >= 1 when set".into()));
        }
        self.valuation.validate()?;
        self.decision.validate()
    }
}

// ── ValuationParams ───────────────────────────────────────────────────────────

/// Coefficients of the bounded readout `V = v_base + phi * tanh(gamma * U)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationParams {
    pub v_base: f64,
    /// Half-width of the valuation band; must be positive.
    pub phi:    f64,
    pub gamma:  f64,

    /// Weight on the self→object attachment.
    pub beta_self:   f64,
    /// Weight on positive minus negative object traces.
    pub beta_trace:  f64,
    /// Weight on self anchors modulating the attachment.
    pub beta_anchor: f64,

    /// Weight on direct self/agent→object triads.
    pub alpha_triad:    f64,
    /// Weight on mediated other→other paths and pair-on-object edges.
    pub alpha_mediated: f64,
    /// Weight on object→object semantic spillover.
    pub alpha_oo:       f64,
}

impl Default for ValuationParams {
    fn default() -> Self {
        Self {
            v_base:         0.0,
            phi:            1.0,
            gamma:          1.0,
            beta_self:      1.0,
            beta_trace:     0.5,
            beta_anchor:    0.25,
            alpha_triad:    0.5,
            alpha_mediated: 0.25,
            alpha_oo:       0.2,
        }
    }
}

impl ValuationParams {
    pub fn validate(&self) -> CrvResult<()> {
        if !(self.phi.is_finite() && self.phi > 0.0) {
            return Err(CrvError::Config(format!("phi must be finite and > 0, got {}", self.phi)));
        }
        let coefficients = [
            ("v_base", self.v_base),
            ("gamma", self.gamma),
            ("beta_self", self.beta_self),
            ("beta_trace", self.beta_trace),
            ("beta_anchor", self.beta_anchor),
            ("alpha_triad", self.alpha_triad),
            ("alpha_mediated", self.alpha_mediated),
            ("alpha_oo", self.alpha_oo),
        ];
        for (name, v) in coefficients {
            if !v.is_finite() {
                return Err(CrvError::Config(format!("{name} must be finite, got {v}")));
            }
        }
        Ok(())
    }
}

// ── DecisionParams ────────────────────────────────────────────────────────────

/// Parameters of the decision stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionParams {
    /// Abstain when the best score falls below this value.
    pub abstain_threshold: f64,
    /// Softmax temperature for stochastic choice; must be > 0 when
    /// `stochastic` is set.
    pub temperature: f64,
    /// Sample from a softmax instead of taking the arg-max.
    pub stochastic: bool,
    /// Friction per action kind.  Missing kinds cost nothing.
    pub costs: BTreeMap<ActionKind, f64>,
}

impl Default for DecisionParams {
    fn default() -> Self {
        let costs = BTreeMap::from([
            (ActionKind::AcquireToken, 0.10),
            (ActionKind::RelinquishToken, 0.10),
            (ActionKind::EndorseToken, 0.05),
        ]);
        Self {
            abstain_threshold: 0.0,
            temperature:       1.0,
            stochastic:        false,
            costs,
        }
    }
}

impl DecisionParams {
    /// Cost of taking an action of `kind`.
    #[inline]
    pub fn cost(&self, kind: ActionKind) -> f64 {
        self.costs.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn validate(&self) -> CrvResult<()> {
        if !self.abstain_threshold.is_finite() {
            return Err(CrvError::Config("abstain_threshold must be finite".into()));
        }
        if self.stochastic && !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(CrvError::Config(format!(
                "stochastic choice needs temperature > 0, got {}",
                self.temperature
            )));
        }
        if let Some((kind, c)) = self.costs.iter().find(|(_, c)| !c.is_finite()) {
            return Err(CrvError::Config(format!("cost for {kind} must be finite, got {c}")));
        }
        Ok(())
    }
}

// ── InterpretFallback ─────────────────────────────────────────────────────────

/// What the engine does with an observation when the interpretation provider
/// fails.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpretFallback {
    /// Record a zero-salience interpretation with no patch.
    #[default]
    NoPatch,
    /// Interpret with the deterministic rule set of the mock provider.
    Rules,
}
