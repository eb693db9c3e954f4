//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  The inner integer is `pub` to allow
//! direct indexing into per-agent `Vec`s, but callers should prefer the
//! `.index()` helpers for clarity.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[derive(serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of an agent in the population.  Agents are never removed, so the
    /// id doubles as the index into every per-agent `Vec`.
    pub struct AgentId(u32);
}

typed_id! {
    /// Index of a token (object) in the run's token catalogue.
    pub struct TokenId(u32);
}

typed_id! {
    /// Group membership label used by `group` visibility scopes.
    pub struct GroupId(u32);
}

typed_id! {
    /// Room membership label used by `room` visibility scopes.
    pub struct RoomId(u32);
}

typed_id! {
    /// Subject/object slot of a representation edge.  Whether it names an
    /// agent or a token depends on the edge kind; see
    /// [`EntityId::agent`] and [`EntityId::token`].
    pub struct EntityId(u32);
}

typed_id! {
    /// Monotonic envelope sequence number, assigned by the router.
    pub struct EnvelopeId(u64);
}

impl EntityId {
    /// Reinterpret as an agent id.
    #[inline]
    pub fn agent(self) -> AgentId {
        AgentId(self.0)
    }

    /// Reinterpret as a token id.
    #[inline]
    pub fn token(self) -> TokenId {
        TokenId(self.0)
    }
}

impl From<AgentId> for EntityId {
    #[inline]
    fn from(a: AgentId) -> Self {
        EntityId(a.0)
    }
}

impl From<TokenId> for EntityId {
    #[inline]
    fn from(t: TokenId) -> Self {
        EntityId(t.0)
    }
}
