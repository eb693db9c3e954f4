//! Closed vocabulary enums shared across the engine.
//!
//! Every enum serializes as lower_snake (`acquire_token`, `dm`, …).  Parsing is
//! strict: the exact lower_snake spelling is accepted, anything else is a
//! [`CrvError::Parse`].  There is no case folding or alias table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CrvError;

/// Generate `ALL`, `as_str`, `Display` and `FromStr` for a fieldless enum.
macro_rules! lower_snake_enum {
    ($name:ident, $what:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The canonical lower_snake spelling.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CrvError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(CrvError::Parse(format!(
                        concat!("unknown ", $what, " {:?}"),
                        other
                    ))),
                }
            }
        }
    };
}

// ── ActionKind ────────────────────────────────────────────────────────────────

/// Action verbs an agent may emit.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    AcquireToken,
    RelinquishToken,
    RelateAgent,
    EndorseToken,
    ExposeSignalAboutToken,
    #[serde(rename = "declare_cooccurrence_between_tokens")]
    DeclareCooccurrence,
    SendChatMessage,
    PublishAnnouncement,
}

lower_snake_enum!(ActionKind, "action kind" {
    AcquireToken           => "acquire_token",
    RelinquishToken        => "relinquish_token",
    RelateAgent            => "relate_agent",
    EndorseToken           => "endorse_token",
    ExposeSignalAboutToken => "expose_signal_about_token",
    DeclareCooccurrence    => "declare_cooccurrence_between_tokens",
    SendChatMessage        => "send_chat_message",
    PublishAnnouncement    => "publish_announcement",
});

// ── ChannelKind ───────────────────────────────────────────────────────────────

/// Logical channel family an envelope travels on.
///
/// The family must agree with the envelope's visibility scope; the router
/// rejects a `group` channel carrying a `direct` scope and so on.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Public,
    Group,
    Room,
    Dm,
}

lower_snake_enum!(ChannelKind, "channel kind" {
    Public => "public",
    Group  => "group",
    Room   => "room",
    Dm     => "dm",
});

// ── Valence ───────────────────────────────────────────────────────────────────

/// Binary valence carried by endorsements, exposures and relations.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Valence {
    Positive,
    Negative,
}

lower_snake_enum!(Valence, "valence" {
    Positive => "positive",
    Negative => "negative",
});

impl Valence {
    /// `+1.0` or `-1.0`.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Valence::Positive => 1.0,
            Valence::Negative => -1.0,
        }
    }
}
