//! Event envelopes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crv_core::{AgentId, ChannelKind, EnvelopeId, GroupId, RoomId, Tick};

use crate::{Payload, RouteError, RouteResult};

// ── Scope ─────────────────────────────────────────────────────────────────────

/// Who may see an envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Public,
    Group(GroupId),
    Room(RoomId),
    Direct(Vec<AgentId>),
}

impl Scope {
    /// Lower-snake family name.
    pub fn family(&self) -> &'static str {
        match self {
            Scope::Public => "public",
            Scope::Group(_) => "group",
            Scope::Room(_) => "room",
            Scope::Direct(_) => "direct",
        }
    }

    /// The only channel family allowed to carry this scope.
    pub fn channel(&self) -> ChannelKind {
        match self {
            Scope::Public => ChannelKind::Public,
            Scope::Group(_) => ChannelKind::Group,
            Scope::Room(_) => ChannelKind::Room,
            Scope::Direct(_) => ChannelKind::Dm,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Public => f.write_str("public"),
            Scope::Group(g) => write!(f, "group:{}", g.0),
            Scope::Room(r) => write!(f, "room:{}", r.0),
            Scope::Direct(ids) => {
                f.write_str("direct:")?;
                for (i, a) in ids.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", a.0)?;
                }
                Ok(())
            }
        }
    }
}

// ── Kind / status ─────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    Action,
    Observation,
}

impl EnvelopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvelopeKind::Action => "action",
            EnvelopeKind::Observation => "observation",
        }
    }
}

/// `pending → executed | rejected`.  Both outcomes are terminal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
    Pending,
    Executed,
    Rejected,
}

impl EnvelopeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvelopeStatus::Pending => "pending",
            EnvelopeStatus::Executed => "executed",
            EnvelopeStatus::Rejected => "rejected",
        }
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        self != EnvelopeStatus::Pending
    }
}

impl fmt::Display for EnvelopeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── EventEnvelope ─────────────────────────────────────────────────────────────

/// Where an envelope came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub actor:   AgentId,
    /// Tick at which the action was emitted.
    pub created: Tick,
    /// The action an observation was fanned out from.
    pub parent:  Option<EnvelopeId>,
}

/// An action or observation travelling through the router.
///
/// Fields are read-only outside this crate except through
/// [`transition`](Self::transition), which refuses to leave a terminal state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    id:         EnvelopeId,
    kind:       EnvelopeKind,
    channel:    ChannelKind,
    scope:      Scope,
    delay:      u64,
    payload:    Payload,
    origin:     Origin,
    status:     EnvelopeStatus,
    /// Observations only.
    recipient:  Option<AgentId>,
    /// Observations only: first tick at which the recipient sees it.
    deliver_at: Option<Tick>,
    /// Set when the status is `Rejected`.
    #[serde(skip)]
    rejection:  Option<RouteError>,
}

impl EventEnvelope {
    pub(crate) fn action(
        id: EnvelopeId,
        channel: ChannelKind,
        scope: Scope,
        delay: u64,
        payload: Payload,
        origin: Origin,
    ) -> Self {
        Self {
            id,
            kind: EnvelopeKind::Action,
            channel,
            scope,
            delay,
            payload,
            origin,
            status: EnvelopeStatus::Pending,
            recipient: None,
            deliver_at: None,
            rejection: None,
        }
    }

    /// Fan-out copy of `action` addressed to `recipient`.
    pub(crate) fn observation_of(
        action: &EventEnvelope,
        id: EnvelopeId,
        recipient: AgentId,
        deliver_at: Tick,
    ) -> Self {
        Self {
            id,
            kind: EnvelopeKind::Observation,
            channel: action.channel,
            scope: action.scope.clone(),
            delay: action.delay,
            payload: action.payload.clone(),
            origin: Origin { parent: Some(action.id), ..action.origin },
            status: EnvelopeStatus::Pending,
            recipient: Some(recipient),
            deliver_at: Some(deliver_at),
            rejection: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn id(&self) -> EnvelopeId { self.id }
    pub fn kind(&self) -> EnvelopeKind { self.kind }
    pub fn channel(&self) -> ChannelKind { self.channel }
    pub fn scope(&self) -> &Scope { &self.scope }
    pub fn delay(&self) -> u64 { self.delay }
    pub fn payload(&self) -> &Payload { &self.payload }
    pub fn origin(&self) -> &Origin { &self.origin }
    pub fn status(&self) -> EnvelopeStatus { self.status }
    pub fn recipient(&self) -> Option<AgentId> { self.recipient }
    pub fn deliver_at(&self) -> Option<Tick> { self.deliver_at }
    pub fn rejection(&self) -> Option<&RouteError> { self.rejection.as_ref() }

    // ── Status ────────────────────────────────────────────────────────────

    /// Move to `next`.  Terminal states are final and `Pending` is never a
    /// valid target.
    pub fn transition(&mut self, next: EnvelopeStatus) -> RouteResult<()> {
        if self.status.is_terminal() || next == EnvelopeStatus::Pending {
            return Err(RouteError::IllegalTransition { from: self.status, to: next });
        }
        self.status = next;
        Ok(())
    }

    /// Mark rejected and keep the reason.
    pub fn reject(&mut self, reason: RouteError) -> RouteResult<()> {
        self.transition(EnvelopeStatus::Rejected)?;
        self.rejection = Some(reason);
        Ok(())
    }
}
