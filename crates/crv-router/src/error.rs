use thiserror::Error;

use crv_core::{AgentId, ChannelKind, GroupId, RoomId, Tick};

use crate::EnvelopeStatus;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("channel {channel} cannot carry a {scope} scope")]
    ChannelScopeMismatch { channel: ChannelKind, scope: &'static str },

    #[error("direct scope lists no recipients")]
    EmptyDirect,

    #[error("unknown group {0}")]
    UnknownGroup(GroupId),

    #[error("unknown room {0}")]
    UnknownRoom(RoomId),

    #[error("unknown actor {0}")]
    UnknownActor(AgentId),

    #[error("scope resolves to no recipients")]
    NoRecipients,

    #[error("delay {delay} from tick {now} overflows the tick counter")]
    DelayOverflow { now: Tick, delay: u64 },

    #[error("illegal status transition {from} -> {to}")]
    IllegalTransition { from: EnvelopeStatus, to: EnvelopeStatus },
}

impl RouteError {
    /// Short machine-readable reason, used in logs and persisted rows.
    pub fn reason(&self) -> &'static str {
        match self {
            RouteError::ChannelScopeMismatch { .. } => "channel_scope_mismatch",
            RouteError::EmptyDirect => "empty_direct",
            RouteError::UnknownGroup(_) => "unknown_group",
            RouteError::UnknownRoom(_) => "unknown_room",
            RouteError::UnknownActor(_) => "unknown_actor",
            RouteError::NoRecipients => "no_recipients",
            RouteError::DelayOverflow { .. } => "delay_overflow",
            RouteError::IllegalTransition { .. } => "illegal_transition",
        }
    }
}

pub type RouteResult<T> = Result<T, RouteError>;
