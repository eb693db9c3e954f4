//! Edge keys and filters.

use serde::{Deserialize, Serialize};

use crv_core::{AgentId, EntityId, TokenId};

use crate::{EdgeKind, GraphError, GraphResult, Slot};

/// Identity of one logical edge inside an agent's graph.
///
/// Which slots are populated is dictated by `kind`; see
/// [`EdgeKind::required_slots`].  Use the per-kind constructors rather than
/// filling slots by hand.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct EdgeKey {
    pub kind:          EdgeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject:       Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object:        Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_agent: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token:         Option<TokenId>,
}

impl EdgeKey {
    /// A key with every slot empty.
    pub const fn bare(kind: EdgeKind) -> Self {
        Self { kind, subject: None, object: None, related_agent: None, token: None }
    }

    // ── Per-kind constructors ─────────────────────────────────────────────

    pub const fn self_positive() -> Self {
        Self::bare(EdgeKind::SelfToPositiveValence)
    }

    pub const fn self_negative() -> Self {
        Self::bare(EdgeKind::SelfToNegativeValence)
    }

    /// The owner's attachment to `token`.
    pub fn self_to_object(owner: AgentId, token: TokenId) -> Self {
        Self { subject: Some(owner.into()), token: Some(token), ..Self::bare(EdgeKind::SelfToObject) }
    }

    /// The owner's stance toward `other`.
    pub fn self_to_agent(owner: AgentId, other: AgentId) -> Self {
        Self {
            subject: Some(owner.into()),
            object: Some(other.into()),
            ..Self::bare(EdgeKind::SelfToAgent)
        }
    }

    pub fn agent_positive(agent: AgentId) -> Self {
        Self { subject: Some(agent.into()), ..Self::bare(EdgeKind::AgentToPositiveValence) }
    }

    pub fn agent_negative(agent: AgentId) -> Self {
        Self { subject: Some(agent.into()), ..Self::bare(EdgeKind::AgentToNegativeValence) }
    }

    pub fn agent_to_object(agent: AgentId, token: TokenId) -> Self {
        Self { subject: Some(agent.into()), token: Some(token), ..Self::bare(EdgeKind::AgentToObject) }
    }

    pub fn agent_to_agent(from: AgentId, to: AgentId) -> Self {
        Self {
            subject: Some(from.into()),
            object: Some(to.into()),
            ..Self::bare(EdgeKind::AgentToAgent)
        }
    }

    /// How the pair `(a, b)` jointly relates to `token`.
    pub fn agent_pair_to_object(a: AgentId, b: AgentId, token: TokenId) -> Self {
        Self {
            subject: Some(a.into()),
            related_agent: Some(b),
            token: Some(token),
            ..Self::bare(EdgeKind::AgentPairToObject)
        }
    }

    pub fn object_positive(token: TokenId) -> Self {
        Self { token: Some(token), ..Self::bare(EdgeKind::ObjectToPositiveValence) }
    }

    pub fn object_negative(token: TokenId) -> Self {
        Self { token: Some(token), ..Self::bare(EdgeKind::ObjectToNegativeValence) }
    }

    /// Semantic association between two tokens.
    pub fn object_to_object(a: TokenId, b: TokenId) -> Self {
        Self {
            subject: Some(a.into()),
            object: Some(b.into()),
            ..Self::bare(EdgeKind::ObjectToObject)
        }
    }

    // ── Validation ────────────────────────────────────────────────────────

    #[inline]
    pub fn has(&self, slot: Slot) -> bool {
        match slot {
            Slot::Subject => self.subject.is_some(),
            Slot::Object => self.object.is_some(),
            Slot::RelatedAgent => self.related_agent.is_some(),
            Slot::Token => self.token.is_some(),
        }
    }

    /// Check the populated slots against the kind's signature.
    pub fn validate(&self) -> GraphResult<()> {
        for slot in Slot::ALL {
            match (self.kind.requires(slot), self.has(slot)) {
                (true, false) => return Err(GraphError::MissingSlot { kind: self.kind, slot }),
                (false, true) => return Err(GraphError::ExtraneousSlot { kind: self.kind, slot }),
                _ => {}
            }
        }
        Ok(())
    }
}

// ── EdgeFilter ────────────────────────────────────────────────────────────────

/// Partial match over edge keys.  `None` fields match anything.
#[derive(Copy, Clone, Default, Debug, PartialEq)]
pub struct EdgeFilter {
    pub kind:          Option<EdgeKind>,
    pub subject:       Option<EntityId>,
    pub object:        Option<EntityId>,
    pub related_agent: Option<AgentId>,
    pub token:         Option<TokenId>,
}

impl EdgeFilter {
    pub fn kind(kind: EdgeKind) -> Self {
        Self { kind: Some(kind), ..Self::default() }
    }

    pub fn with_subject(mut self, subject: impl Into<EntityId>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_object(mut self, object: impl Into<EntityId>) -> Self {
        self.object = Some(object.into());
        self
    }

    pub fn with_related_agent(mut self, agent: AgentId) -> Self {
        self.related_agent = Some(agent);
        self
    }

    pub fn with_token(mut self, token: TokenId) -> Self {
        self.token = Some(token);
        self
    }

    pub fn matches(&self, key: &EdgeKey) -> bool {
        fn slot<T: PartialEq>(want: Option<T>, have: Option<T>) -> bool {
            want.is_none() || want == have
        }
        self.kind.is_none_or(|k| k == key.kind)
            && slot(self.subject, key.subject)
            && slot(self.object, key.object)
            && slot(self.related_agent, key.related_agent)
            && slot(self.token, key.token)
    }
}
