//! What a provider gets to see.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crv_core::{Affect, AgentId, ContextHash, CrvResult, GroupId, Persona, Tick, TokenId, canonical_hash};
use crv_graph::RepresentationGraph;

use crate::ProviderError;

/// Read-only view of one agent, borrowed from committed state.
///
/// Modeled on a per-call context struct: the provider may read anything
/// here but never holds on to it.
pub struct AgentView<'a> {
    pub agent:   AgentId,
    pub tick:    Tick,
    pub persona: &'a Persona,
    pub affect:  Affect,
    pub group:   Option<GroupId>,
    /// The committed graph as of the end of the previous tick.
    pub graph:   &'a RepresentationGraph,
}

// ── Owner status / peer alignment ─────────────────────────────────────────────

macro_rules! context_label {
    ($(#[$m:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$m])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $s),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ProviderError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok($name::$variant),)+
                    other => Err(ProviderError::InvalidOutput(
                        format!("unknown {} `{other}`", stringify!($name)),
                    )),
                }
            }
        }
    };
}

context_label! {
    /// Whether the observer currently holds the token.
    OwnerStatus {
        Owned    => "owned",
        NotOwned => "not_owned",
    }
}

context_label! {
    /// How the observer's group peers lean on the token, as the observer
    /// represents them.
    PeerAlignment {
        Aligned    => "aligned",
        Neutral    => "neutral",
        Misaligned => "misaligned",
    }
}

impl OwnerStatus {
    pub fn from_held(held: bool) -> Self {
        if held { OwnerStatus::Owned } else { OwnerStatus::NotOwned }
    }
}

impl PeerAlignment {
    /// Mean peer stance beyond `±threshold` is aligned/misaligned.
    pub fn from_mean(mean: Option<f64>, threshold: f64) -> Self {
        match mean {
            Some(m) if m > threshold => PeerAlignment::Aligned,
            Some(m) if m < -threshold => PeerAlignment::Misaligned,
            _ => PeerAlignment::Neutral,
        }
    }
}

// ── ScenarioContext ───────────────────────────────────────────────────────────

/// Observer-centric inputs of one valuation.
///
/// Field order is part of the canonical JSON and therefore of the hash.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioContext {
    pub tick:           Tick,
    pub agent:          AgentId,
    pub token:          TokenId,
    pub token_kind:     String,
    pub owner_status:   OwnerStatus,
    pub peer_alignment: PeerAlignment,
    pub group:          Option<GroupId>,
    /// Scope family of the most recent observation, if any.
    pub last_scope:     Option<String>,
    pub affect_index:   f64,
    /// Actor of the most recent observation from someone else.
    pub salient_other:  Option<AgentId>,
    /// Graph readout for the token.
    pub readout:        f64,
}

impl ScenarioContext {
    /// SHA-256 over the canonical JSON of this context.
    ///
    /// The tick is excluded so identical situations at different ticks share
    /// a cache entry.
    pub fn hash(&self) -> CrvResult<ContextHash> {
        #[derive(Serialize)]
        struct Keyed<'a> {
            agent:          AgentId,
            token:          TokenId,
            token_kind:     &'a str,
            owner_status:   OwnerStatus,
            peer_alignment: PeerAlignment,
            group:          Option<GroupId>,
            last_scope:     Option<&'a str>,
            affect_index:   f64,
            salient_other:  Option<AgentId>,
            readout:        f64,
        }
        canonical_hash(&Keyed {
            agent:          self.agent,
            token:          self.token,
            token_kind:     &self.token_kind,
            owner_status:   self.owner_status,
            peer_alignment: self.peer_alignment,
            group:          self.group,
            last_scope:     self.last_scope.as_deref(),
            affect_index:   self.affect_index,
            salient_other:  self.salient_other,
            readout:        self.readout,
        })
    }
}
