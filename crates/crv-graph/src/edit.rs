//! Graph edit instructions and patches.
//!
//! Edits serialize with an `operation` tag so a provider can emit them as
//! JSON:
//!
//! ```json
//! {"operation": "adjust_identity_edge_weight",
//!  "key": {"kind": "object_to_positive_valence", "token": 3},
//!  "delta": 0.1}
//! ```

use serde::{Deserialize, Serialize};

use crate::{EdgeKey, EdgeKind, GraphError, GraphResult};

/// Which edges a decay touches.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// One exact edge.
    Exact(EdgeKey),
    /// Every edge of a kind.  Only decays take a slot-free selector.
    AllOfKind(EdgeKind),
}

impl Selector {
    pub fn validate(&self) -> GraphResult<()> {
        match self {
            Selector::Exact(key) => key.validate(),
            Selector::AllOfKind(_) => Ok(()),
        }
    }
}

/// One mutation of a representation graph.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum GraphEdit {
    /// Overwrite the weight.  Must be finite and inside the kind's range.
    #[serde(rename = "set_identity_edge_weight")]
    Set { key: EdgeKey, weight: f64 },

    /// Add `delta` and clamp to the kind's range.  A missing edge is created
    /// at `clamp(delta)`.
    #[serde(rename = "adjust_identity_edge_weight")]
    Adjust { key: EdgeKey, delta: f64 },

    /// Multiply matching weights by `exp(-lambda)`.  Missing edges are
    /// skipped.
    #[serde(rename = "decay_identity_edges")]
    Decay { selector: Selector, lambda: f64 },

    /// Delete the edge if present.
    #[serde(rename = "remove_identity_edge")]
    Remove { key: EdgeKey },
}

impl GraphEdit {
    /// Canonical operation name.
    pub fn operation(&self) -> &'static str {
        match self {
            GraphEdit::Set { .. } => "set_identity_edge_weight",
            GraphEdit::Adjust { .. } => "adjust_identity_edge_weight",
            GraphEdit::Decay { .. } => "decay_identity_edges",
            GraphEdit::Remove { .. } => "remove_identity_edge",
        }
    }

    /// Full validation against the slot table and value rules.  Runs before
    /// any application; an `Err` means the graph is left untouched.
    pub fn validate(&self) -> GraphResult<()> {
        match self {
            GraphEdit::Set { key, weight } => {
                key.validate()?;
                if !weight.is_finite() {
                    return Err(GraphError::NonFinite { kind: key.kind, value: *weight });
                }
                let (min, max) = key.kind.range();
                if *weight < min || *weight > max {
                    return Err(GraphError::OutOfRange { kind: key.kind, value: *weight, min, max });
                }
                Ok(())
            }
            GraphEdit::Adjust { key, delta } => {
                key.validate()?;
                if !delta.is_finite() {
                    return Err(GraphError::NonFinite { kind: key.kind, value: *delta });
                }
                Ok(())
            }
            GraphEdit::Decay { selector, lambda } => {
                selector.validate()?;
                if !lambda.is_finite() || *lambda < 0.0 {
                    return Err(GraphError::InvalidLambda(*lambda));
                }
                Ok(())
            }
            GraphEdit::Remove { key } => key.validate(),
        }
    }
}

/// An ordered list of edits produced by one interpretation.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct RepresentationPatch {
    #[serde(default)]
    pub edits:        Vec<GraphEdit>,
    /// Diagnostic only; never applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_delta: Option<f64>,
}

impl RepresentationPatch {
    pub fn new(edits: Vec<GraphEdit>) -> Self {
        Self { edits, energy_delta: None }
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}
