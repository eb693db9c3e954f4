//! Core agent storage: `AgentStore` (SoA data) and `AgentRngs` (per-agent RNG).
//!
//! The decision stage needs `&mut AgentRngs` while reading `&AgentStore`, so
//! the RNGs live in their own struct rather than as another SoA column.

use std::collections::BTreeSet;

use crv_core::{Affect, AgentId, AgentRng, GroupId, Persona, RoomId, TokenId};

// ── AgentRngs ─────────────────────────────────────────────────────────────────

/// Per-agent deterministic RNG state, separated from [`AgentStore`] to allow
/// simultaneous `&mut AgentRngs` + `&AgentStore` borrows.
pub struct AgentRngs {
    pub inner: Vec<AgentRng>,
}

impl AgentRngs {
    /// Allocate and seed `count` per-agent RNGs from `global_seed`.
    pub(crate) fn new(count: usize, global_seed: u64) -> Self {
        let inner = (0..count as u32)
            .map(|i| AgentRng::new(global_seed, AgentId(i)))
            .collect();
        Self { inner }
    }

    /// Mutable reference to one agent's RNG.
    #[inline]
    pub fn get_mut(&mut self, agent: AgentId) -> &mut AgentRng {
        &mut self.inner[agent.index()]
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// ── AgentStore ────────────────────────────────────────────────────────────────

/// Structure-of-Arrays storage for all agent state.
///
/// Every `Vec` field has exactly `count` elements; the `AgentId` value is the
/// index into all of them:
///
/// ```ignore
/// let mood = store.affect[agent.index()];
/// ```
///
/// During a tick the store is read-only.  The scheduler writes `affect` and
/// `holdings` only while committing.
#[derive(Clone, Debug)]
pub struct AgentStore {
    /// Number of agents.  Equals the length of every SoA `Vec`.
    pub count: usize,

    // ── Identity ──────────────────────────────────────────────────────────
    pub persona: Vec<Persona>,

    // ── Mutable state ─────────────────────────────────────────────────────
    pub affect:   Vec<Affect>,
    /// Tokens the agent currently holds.  Ordered so iteration is stable.
    pub holdings: Vec<BTreeSet<TokenId>>,

    // ── Membership ────────────────────────────────────────────────────────
    pub group: Vec<Option<GroupId>>,
    pub room:  Vec<Option<RoomId>>,

    /// Groups that exist in this world, whether or not anyone is a member.
    pub declared_groups: BTreeSet<GroupId>,
    /// Rooms that exist in this world, whether or not anyone is in them.
    pub declared_rooms:  BTreeSet<RoomId>,
}

impl AgentStore {
    /// `true` if there are no agents.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Iterator over all `AgentId`s in ascending index order.
    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        (0..self.count as u32).map(AgentId)
    }

    /// `true` if `agent` names an existing agent.
    #[inline]
    pub fn contains(&self, agent: AgentId) -> bool {
        agent.index() < self.count
    }

    // ── Membership queries ────────────────────────────────────────────────

    pub fn is_known_group(&self, group: GroupId) -> bool {
        self.declared_groups.contains(&group)
    }

    pub fn is_known_room(&self, room: RoomId) -> bool {
        self.declared_rooms.contains(&room)
    }

    /// Members of `group` in ascending id order.
    pub fn group_members(&self, group: GroupId) -> impl Iterator<Item = AgentId> + '_ {
        self.agent_ids().filter(move |a| self.group[a.index()] == Some(group))
    }

    /// Occupants of `room` in ascending id order.
    pub fn room_members(&self, room: RoomId) -> impl Iterator<Item = AgentId> + '_ {
        self.agent_ids().filter(move |a| self.room[a.index()] == Some(room))
    }

    /// `true` when both agents belong to the same (non-empty) group.
    pub fn same_group(&self, a: AgentId, b: AgentId) -> bool {
        matches!(
            (self.group[a.index()], self.group[b.index()]),
            (Some(x), Some(y)) if x == y
        )
    }

    // ── Holdings ──────────────────────────────────────────────────────────

    #[inline]
    pub fn holds(&self, agent: AgentId, token: TokenId) -> bool {
        self.holdings[agent.index()].contains(&token)
    }

    /// Agents currently holding `token`, ascending.
    pub fn holders_of(&self, token: TokenId) -> impl Iterator<Item = AgentId> + '_ {
        self.agent_ids().filter(move |&a| self.holds(a, token))
    }

    // ── Package-private constructor used by AgentStoreBuilder ─────────────

    pub(crate) fn new(count: usize) -> Self {
        Self {
            count,
            persona:         vec![Persona::default(); count],
            affect:          vec![Affect::default(); count],
            holdings:        vec![BTreeSet::new(); count],
            group:           vec![None; count],
            room:            vec![None; count],
            declared_groups: BTreeSet::new(),
            declared_rooms:  BTreeSet::new(),
        }
    }
}
