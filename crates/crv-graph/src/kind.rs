//! Edge kinds and their slot signatures.
//!
//! | kind                         | required slots                | range     |
//! |------------------------------|-------------------------------|-----------|
//! | `self_to_positive_valence`   | none                          | `[0, 1]`  |
//! | `self_to_negative_valence`   | none                          | `[0, 1]`  |
//! | `self_to_object`             | subject, token                | `[-1, 1]` |
//! | `self_to_agent`              | subject, object               | `[-1, 1]` |
//! | `agent_to_positive_valence`  | subject                       | `[0, 1]`  |
//! | `agent_to_negative_valence`  | subject                       | `[0, 1]`  |
//! | `agent_to_object`            | subject, token                | `[-1, 1]` |
//! | `agent_to_agent`             | subject, object               | `[-1, 1]` |
//! | `agent_pair_to_object`       | subject, related_agent, token | `[-1, 1]` |
//! | `object_to_positive_valence` | token                         | `[0, 1]`  |
//! | `object_to_negative_valence` | token                         | `[0, 1]`  |
//! | `object_to_object`           | subject, object               | `[-1, 1]` |
//!
//! Slots outside a kind's signature must be empty.  That keeps exactly one
//! key per logical edge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::GraphError;

/// One of the four optional key slots.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Slot {
    Subject,
    Object,
    RelatedAgent,
    Token,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Subject, Slot::Object, Slot::RelatedAgent, Slot::Token];

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Subject => "subject_id",
            Slot::Object => "object_id",
            Slot::RelatedAgent => "related_agent_id",
            Slot::Token => "token_id",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Family of a representation edge.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    SelfToPositiveValence,
    SelfToNegativeValence,
    SelfToObject,
    SelfToAgent,
    AgentToPositiveValence,
    AgentToNegativeValence,
    AgentToObject,
    AgentToAgent,
    AgentPairToObject,
    ObjectToPositiveValence,
    ObjectToNegativeValence,
    ObjectToObject,
}

use Slot::{Object, RelatedAgent, Subject, Token};

impl EdgeKind {
    pub const ALL: [EdgeKind; 12] = [
        EdgeKind::SelfToPositiveValence,
        EdgeKind::SelfToNegativeValence,
        EdgeKind::SelfToObject,
        EdgeKind::SelfToAgent,
        EdgeKind::AgentToPositiveValence,
        EdgeKind::AgentToNegativeValence,
        EdgeKind::AgentToObject,
        EdgeKind::AgentToAgent,
        EdgeKind::AgentPairToObject,
        EdgeKind::ObjectToPositiveValence,
        EdgeKind::ObjectToNegativeValence,
        EdgeKind::ObjectToObject,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::SelfToPositiveValence => "self_to_positive_valence",
            EdgeKind::SelfToNegativeValence => "self_to_negative_valence",
            EdgeKind::SelfToObject => "self_to_object",
            EdgeKind::SelfToAgent => "self_to_agent",
            EdgeKind::AgentToPositiveValence => "agent_to_positive_valence",
            EdgeKind::AgentToNegativeValence => "agent_to_negative_valence",
            EdgeKind::AgentToObject => "agent_to_object",
            EdgeKind::AgentToAgent => "agent_to_agent",
            EdgeKind::AgentPairToObject => "agent_pair_to_object",
            EdgeKind::ObjectToPositiveValence => "object_to_positive_valence",
            EdgeKind::ObjectToNegativeValence => "object_to_negative_valence",
            EdgeKind::ObjectToObject => "object_to_object",
        }
    }

    /// Slots an edge of this kind must carry.  All others must be empty.
    pub fn required_slots(self) -> &'static [Slot] {
        match self {
            EdgeKind::SelfToPositiveValence | EdgeKind::SelfToNegativeValence => &[],
            EdgeKind::SelfToObject | EdgeKind::AgentToObject => &[Subject, Token],
            EdgeKind::SelfToAgent | EdgeKind::AgentToAgent | EdgeKind::ObjectToObject => {
                &[Subject, Object]
            }
            EdgeKind::AgentToPositiveValence | EdgeKind::AgentToNegativeValence => &[Subject],
            EdgeKind::AgentPairToObject => &[Subject, RelatedAgent, Token],
            EdgeKind::ObjectToPositiveValence | EdgeKind::ObjectToNegativeValence => &[Token],
        }
    }

    #[inline]
    pub fn requires(self, slot: Slot) -> bool {
        self.required_slots().contains(&slot)
    }

    /// Valence traces and anchors are magnitudes; everything else is signed.
    pub fn is_signed(self) -> bool {
        !matches!(
            self,
            EdgeKind::SelfToPositiveValence
                | EdgeKind::SelfToNegativeValence
                | EdgeKind::AgentToPositiveValence
                | EdgeKind::AgentToNegativeValence
                | EdgeKind::ObjectToPositiveValence
                | EdgeKind::ObjectToNegativeValence
        )
    }

    /// Inclusive `(min, max)` weight range.
    #[inline]
    pub fn range(self) -> (f64, f64) {
        if self.is_signed() { (-1.0, 1.0) } else { (0.0, 1.0) }
    }

    #[inline]
    pub fn clamp(self, w: f64) -> f64 {
        let (lo, hi) = self.range();
        w.clamp(lo, hi)
    }

    /// `-1`/`0`/`1` for signed kinds, `None` for magnitude kinds.
    pub fn sign_of(self, w: f64) -> Option<i8> {
        if !self.is_signed() {
            return None;
        }
        Some(if w > 0.0 { 1 } else if w < 0.0 { -1 } else { 0 })
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| GraphError::UnknownKind(s.to_owned()))
    }
}
