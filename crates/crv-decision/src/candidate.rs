//! Candidate actions.

use serde::{Deserialize, Serialize};

use crv_core::{ActionKind, AgentId, DecisionParams, TokenId, Valence};
use crv_router::{ActionIntent, Payload, Scope};

/// The provider's estimate for one token, as used by a decision.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenEstimate {
    pub token: TokenId,
    pub value: f64,
}

/// One action an agent could take this tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub action:         ActionKind,
    pub token:          TokenId,
    pub scope:          Scope,
    pub value_estimate: f64,
    pub cost:           f64,
}

impl Candidate {
    pub fn score(&self) -> f64 {
        self.value_estimate - self.cost
    }

    /// The payload this candidate emits.  Only token-only actions can be
    /// built from a candidate; the rest need a counterpart or text.
    pub fn payload(&self) -> Option<Payload> {
        let token = self.token;
        match self.action {
            ActionKind::AcquireToken => Some(Payload::AcquireToken { token }),
            ActionKind::RelinquishToken => Some(Payload::RelinquishToken { token }),
            ActionKind::EndorseToken => {
                Some(Payload::EndorseToken { token, valence: Valence::Positive })
            }
            ActionKind::RelateAgent
            | ActionKind::ExposeSignalAboutToken
            | ActionKind::DeclareCooccurrence
            | ActionKind::SendChatMessage
            | ActionKind::PublishAnnouncement => None,
        }
    }

    pub fn to_intent(&self, actor: AgentId) -> Option<ActionIntent> {
        self.payload().map(|p| ActionIntent::new(actor, self.scope.clone(), p))
    }
}

/// Candidates for one agent, in estimate order.
///
/// Per token: `acquire_token` if unheld or `relinquish_token` if held, then
/// `endorse_token`.  All are addressed to `scope` (the agent's group, or
/// public when ungrouped).  Value is `direction * (estimate - v_base)`.
pub fn generate_candidates(
    estimates: &[TokenEstimate],
    holds: impl Fn(TokenId) -> bool,
    scope: &Scope,
    v_base: f64,
    params: &DecisionParams,
) -> Vec<Candidate> {
    let mut out = Vec::with_capacity(estimates.len() * 2);
    for est in estimates {
        let centered = est.value - v_base;
        let (action, direction) = if holds(est.token) {
            (ActionKind::RelinquishToken, -1.0)
        } else {
            (ActionKind::AcquireToken, 1.0)
        };
        for (action, direction) in [(action, direction), (ActionKind::EndorseToken, 1.0)] {
            out.push(Candidate {
                action,
                token: est.token,
                scope: scope.clone(),
                value_estimate: direction * centered,
                cost: params.cost(action),
            });
        }
    }
    out
}
