//! Typed action payloads.

use serde::{Deserialize, Serialize};

use crv_core::{ActionKind, AgentId, TokenId, Valence};

/// What an action says or does.  One variant per [`ActionKind`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Payload {
    AcquireToken { token: TokenId },
    RelinquishToken { token: TokenId },
    RelateAgent { agent: AgentId, valence: Valence },
    EndorseToken { token: TokenId, valence: Valence },
    ExposeSignalAboutToken { token: TokenId, valence: Valence },
    #[serde(rename = "declare_cooccurrence_between_tokens")]
    DeclareCooccurrence { a: TokenId, b: TokenId },
    SendChatMessage { text: String },
    PublishAnnouncement { text: String },
}

impl Payload {
    pub fn kind(&self) -> ActionKind {
        match self {
            Payload::AcquireToken { .. } => ActionKind::AcquireToken,
            Payload::RelinquishToken { .. } => ActionKind::RelinquishToken,
            Payload::RelateAgent { .. } => ActionKind::RelateAgent,
            Payload::EndorseToken { .. } => ActionKind::EndorseToken,
            Payload::ExposeSignalAboutToken { .. } => ActionKind::ExposeSignalAboutToken,
            Payload::DeclareCooccurrence { .. } => ActionKind::DeclareCooccurrence,
            Payload::SendChatMessage { .. } => ActionKind::SendChatMessage,
            Payload::PublishAnnouncement { .. } => ActionKind::PublishAnnouncement,
        }
    }

    /// The token this payload is about, if any.
    pub fn token(&self) -> Option<TokenId> {
        match self {
            Payload::AcquireToken { token }
            | Payload::RelinquishToken { token }
            | Payload::EndorseToken { token, .. }
            | Payload::ExposeSignalAboutToken { token, .. } => Some(*token),
            _ => None,
        }
    }

    /// Human-readable label `action:k=v|k=v` with keys sorted.
    ///
    /// For logs and dashboards only; never parse it back.
    pub fn canonical_key(&self) -> String {
        let kind = self.kind();
        let mut params: Vec<(&str, String)> = match self {
            Payload::AcquireToken { token } | Payload::RelinquishToken { token } => {
                vec![("token_id", token.0.to_string())]
            }
            Payload::RelateAgent { agent, valence } => {
                vec![("agent_id", agent.0.to_string()), ("valence", valence.to_string())]
            }
            Payload::EndorseToken { token, valence }
            | Payload::ExposeSignalAboutToken { token, valence } => {
                vec![("token_id", token.0.to_string()), ("valence", valence.to_string())]
            }
            Payload::DeclareCooccurrence { a, b } => {
                vec![("token_a", a.0.to_string()), ("token_b", b.0.to_string())]
            }
            Payload::SendChatMessage { .. } | Payload::PublishAnnouncement { .. } => Vec::new(),
        };
        if params.is_empty() {
            return kind.as_str().to_owned();
        }
        params.sort_by(|x, y| x.0.cmp(y.0));
        let joined: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{}:{}", kind, joined.join("|"))
    }
}
