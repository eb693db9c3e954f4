//! Provider output for one observation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crv_core::{Appraisal, AgentId, TokenId};
use crv_graph::RepresentationPatch;

/// Something an interpretation is about.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Target {
    Agent(AgentId),
    Token(TokenId),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    /// Lower-snake action kind or a provider-specific label.
    pub event_type: String,
    pub targets:    Vec<Target>,
    /// Free-form inferences; ordered for stable serialization.
    #[serde(default)]
    pub inferred:   BTreeMap<String, String>,
    /// How much the observation matters to the observer, in `[0, 1]`.
    pub salience:   f64,
    #[serde(default)]
    pub appraisal:  Option<Appraisal>,
}

impl Interpretation {
    /// An interpretation that changes nothing.
    pub fn inert(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            targets:    Vec::new(),
            inferred:   BTreeMap::new(),
            salience:   0.0,
            appraisal:  None,
        }
    }

    /// `true` when salience is finite and in `[0, 1]` and any appraisal is
    /// valid.
    pub fn is_valid(&self) -> bool {
        self.salience.is_finite()
            && (0.0..=1.0).contains(&self.salience)
            && self.appraisal.as_ref().is_none_or(Appraisal::is_valid)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterpretOutcome {
    pub interpretation: Interpretation,
    #[serde(default)]
    pub patch:          Option<RepresentationPatch>,
}

impl InterpretOutcome {
    pub fn without_patch(interpretation: Interpretation) -> Self {
        Self { interpretation, patch: None }
    }
}
