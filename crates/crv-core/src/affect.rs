//! Persona descriptors and bounded affect state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CrvError, CrvResult};

/// Persona descriptor used to parameterize agent behavior and provider keys.
///
/// `traits` is a `BTreeMap` so the persona hashes identically regardless of
/// insertion order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub persona_id: String,
    pub label:      String,
    #[serde(default)]
    pub traits:     BTreeMap<String, f64>,
}

impl Persona {
    pub fn new(persona_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            persona_id: persona_id.into(),
            label:      label.into(),
            traits:     BTreeMap::new(),
        }
    }

    /// Builder-style trait insertion.
    pub fn with_trait(mut self, name: impl Into<String>, value: f64) -> Self {
        self.traits.insert(name.into(), value);
        self
    }
}

impl Default for Persona {
    fn default() -> Self {
        Persona::new("default", "default")
    }
}

// ── Affect ────────────────────────────────────────────────────────────────────

/// Coarse affect state; every component lies in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Affect {
    pub valence: f64,
    pub arousal: f64,
    pub stress:  f64,
}

impl Default for Affect {
    fn default() -> Self {
        Self { valence: 0.5, arousal: 0.5, stress: 0.0 }
    }
}

impl Affect {
    /// Construct, rejecting components outside `[0, 1]` or non-finite.
    pub fn new(valence: f64, arousal: f64, stress: f64) -> CrvResult<Self> {
        for (name, v) in [("valence", valence), ("arousal", arousal), ("stress", stress)] {
            if !unit_interval(v) {
                return Err(CrvError::Config(format!("affect {name} must be in [0, 1], got {v}")));
            }
        }
        Ok(Self { valence, arousal, stress })
    }

    /// Scalar summary used in scenario contexts: high valence, low stress.
    #[inline]
    pub fn index(&self) -> f64 {
        self.valence * (1.0 - self.stress)
    }

    /// Move toward `appraisal` by `rate * salience`, clamping to `[0, 1]`.
    ///
    /// Stress tracks goal incongruence: an appraisal with
    /// `goal_congruence = 0` pulls stress toward 1.
    pub fn absorb(&self, appraisal: &Appraisal, salience: f64, rate: f64) -> Affect {
        let w = (rate * salience).clamp(0.0, 1.0);
        let step = |cur: f64, target: f64| (cur + w * (target - cur)).clamp(0.0, 1.0);
        Affect {
            valence: step(self.valence, appraisal.valence),
            arousal: step(self.arousal, appraisal.arousal),
            stress:  step(self.stress, 1.0 - appraisal.goal_congruence),
        }
    }
}

// ── Appraisal ─────────────────────────────────────────────────────────────────

/// Appraisal channels a provider may attach to an interpretation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Appraisal {
    pub valence:         f64,
    pub arousal:         f64,
    pub certainty:       f64,
    pub novelty:         f64,
    pub goal_congruence: f64,
}

impl Appraisal {
    /// `true` when every channel lies in `[0, 1]`.
    pub fn is_valid(&self) -> bool {
        [self.valence, self.arousal, self.certainty, self.novelty, self.goal_congruence]
            .into_iter()
            .all(unit_interval)
    }
}

#[inline]
fn unit_interval(v: f64) -> bool {
    v.is_finite() && (0.0..=1.0).contains(&v)
}
