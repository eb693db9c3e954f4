//! Fluent builder for constructing `AgentStore` + `AgentRngs` in one step.
//!
//! # Usage
//!
//! ```rust
//! use crv_agent::AgentStoreBuilder;
//! use crv_core::{AgentId, GroupId, Persona, TokenId};
//!
//! let (store, rngs) = AgentStoreBuilder::new(4, /*seed=*/ 42)
//!     .persona_all(Persona::new("p0", "baseline"))
//!     .group(AgentId(0), GroupId(1))
//!     .group(AgentId(1), GroupId(1))
//!     .hold(AgentId(0), TokenId(0))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(store.count, 4);
//! assert_eq!(rngs.len(), 4);
//! assert_eq!(store.group_members(GroupId(1)).count(), 2);
//! ```

use crv_core::{Affect, AgentId, CrvError, CrvResult, GroupId, Persona, RoomId, TokenId};

use crate::{AgentRngs, AgentStore};

/// Fluent builder for [`AgentStore`] + [`AgentRngs`].
///
/// Assignments are recorded and applied in `build`, which rejects any that
/// name an agent outside `0..count`.
pub struct AgentStoreBuilder {
    count:        usize,
    seed:         u64,
    persona_all:  Option<Persona>,
    personas:     Vec<(AgentId, Persona)>,
    affects:      Vec<(AgentId, Affect)>,
    groups:       Vec<(AgentId, GroupId)>,
    rooms:        Vec<(AgentId, RoomId)>,
    holdings:     Vec<(AgentId, TokenId)>,
    extra_groups: Vec<GroupId>,
    extra_rooms:  Vec<RoomId>,
}

impl AgentStoreBuilder {
    /// Create a builder for `count` agents using `seed` as the global RNG seed.
    pub fn new(count: usize, seed: u64) -> Self {
        Self {
            count,
            seed,
            persona_all:  None,
            personas:     Vec::new(),
            affects:      Vec::new(),
            groups:       Vec::new(),
            rooms:        Vec::new(),
            holdings:     Vec::new(),
            extra_groups: Vec::new(),
            extra_rooms:  Vec::new(),
        }
    }

    /// Give every agent `persona` unless overridden by [`persona`](Self::persona).
    pub fn persona_all(mut self, persona: Persona) -> Self {
        self.persona_all = Some(persona);
        self
    }

    pub fn persona(mut self, agent: AgentId, persona: Persona) -> Self {
        self.personas.push((agent, persona));
        self
    }

    pub fn affect(mut self, agent: AgentId, affect: Affect) -> Self {
        self.affects.push((agent, affect));
        self
    }

    /// Put `agent` in `group`.  The group is declared implicitly.
    pub fn group(mut self, agent: AgentId, group: GroupId) -> Self {
        self.groups.push((agent, group));
        self
    }

    /// Put `agent` in `room`.  The room is declared implicitly.
    pub fn room(mut self, agent: AgentId, room: RoomId) -> Self {
        self.rooms.push((agent, room));
        self
    }

    /// Declare a group that may have no members.
    pub fn declare_group(mut self, group: GroupId) -> Self {
        self.extra_groups.push(group);
        self
    }

    /// Declare a room that may have no occupants.
    pub fn declare_room(mut self, room: RoomId) -> Self {
        self.extra_rooms.push(room);
        self
    }

    /// Initial holding.
    pub fn hold(mut self, agent: AgentId, token: TokenId) -> Self {
        self.holdings.push((agent, token));
        self
    }

    /// Construct `AgentStore` and `AgentRngs`.
    ///
    /// Later assignments for the same agent win.
    pub fn build(self) -> CrvResult<(AgentStore, AgentRngs)> {
        let count = self.count;
        let check = |a: AgentId| {
            if a.index() < count { Ok(a.index()) } else { Err(CrvError::AgentNotFound(a)) }
        };

        let mut store = AgentStore::new(count);
        if let Some(p) = self.persona_all {
            store.persona.iter_mut().for_each(|slot| *slot = p.clone());
        }
        for (a, p) in self.personas {
            store.persona[check(a)?] = p;
        }
        for (a, affect) in self.affects {
            store.affect[check(a)?] = affect;
        }
        for (a, g) in self.groups {
            store.group[check(a)?] = Some(g);
            store.declared_groups.insert(g);
        }
        for (a, r) in self.rooms {
            store.room[check(a)?] = Some(r);
            store.declared_rooms.insert(r);
        }
        for (a, t) in self.holdings {
            store.holdings[check(a)?].insert(t);
        }
        store.declared_groups.extend(self.extra_groups);
        store.declared_rooms.extend(self.extra_rooms);

        let rngs = AgentRngs::new(count, self.seed);
        Ok((store, rngs))
    }
}
