//! Scope resolution and the delivery inbox.
//!
//! The inbox is a `BTreeMap<Tick, Vec<EventEnvelope>>`: observations keyed by
//! the tick at which they become visible.  Within one tick, observations keep
//! the order they were routed in, which is actor order followed by ascending
//! recipient order.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crv_agent::AgentStore;
use crv_core::{AgentId, ChannelKind, EnvelopeId, Tick};

use crate::{EnvelopeStatus, EventEnvelope, Origin, Payload, RouteError, RouteResult, Scope};

/// First tick at which an envelope sent at `now` with `delay` is visible.
#[inline]
pub fn delivery_tick(now: Tick, delay: u64) -> RouteResult<Tick> {
    now.0
        .checked_add(delay.max(1))
        .map(Tick)
        .ok_or(RouteError::DelayOverflow { now, delay })
}

// ── ActionIntent ──────────────────────────────────────────────────────────────

/// An action an agent wants to emit this tick.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionIntent {
    pub actor:   AgentId,
    pub channel: ChannelKind,
    pub scope:   Scope,
    pub delay:   u64,
    pub payload: Payload,
}

impl ActionIntent {
    /// Intent on the channel matching `scope`, with no extra delay.
    pub fn new(actor: AgentId, scope: Scope, payload: Payload) -> Self {
        Self { actor, channel: scope.channel(), scope, delay: 0, payload }
    }

    pub fn with_delay(mut self, delay: u64) -> Self {
        self.delay = delay;
        self
    }

    /// Override the channel.  A channel that does not match the scope family
    /// gets the action rejected at routing.
    pub fn on_channel(mut self, channel: ChannelKind) -> Self {
        self.channel = channel;
        self
    }
}

// ── RoutedBatch ───────────────────────────────────────────────────────────────

/// Output of [`EventRouter::plan`]: terminal action envelopes and the pending
/// observations they fan out to.
#[derive(Clone, Debug, Default)]
pub struct RoutedBatch {
    pub actions:      Vec<EventEnvelope>,
    pub observations: Vec<EventEnvelope>,
    next_id:          u64,
}

impl RoutedBatch {
    pub fn executed(&self) -> impl Iterator<Item = &EventEnvelope> {
        self.actions.iter().filter(|e| e.status() == EnvelopeStatus::Executed)
    }

    pub fn rejected(&self) -> impl Iterator<Item = &EventEnvelope> {
        self.actions.iter().filter(|e| e.status() == EnvelopeStatus::Rejected)
    }
}

// ── EventRouter ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct EventRouter {
    next_id: u64,
    inbox:   BTreeMap<Tick, Vec<EventEnvelope>>,
    pending: usize,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `scope` to recipients, ascending and deduplicated.
    ///
    /// The actor is included when it matches the scope.  Direct targets that
    /// do not exist are dropped; an empty result is an error.
    pub fn recipients(
        channel: ChannelKind,
        scope: &Scope,
        agents: &AgentStore,
    ) -> RouteResult<Vec<AgentId>> {
        if channel != scope.channel() {
            return Err(RouteError::ChannelScopeMismatch { channel, scope: scope.family() });
        }
        let out: Vec<AgentId> = match scope {
            Scope::Public => agents.agent_ids().collect(),
            Scope::Group(g) => {
                if !agents.is_known_group(*g) {
                    return Err(RouteError::UnknownGroup(*g));
                }
                agents.group_members(*g).collect()
            }
            Scope::Room(r) => {
                if !agents.is_known_room(*r) {
                    return Err(RouteError::UnknownRoom(*r));
                }
                agents.room_members(*r).collect()
            }
            Scope::Direct(ids) => {
                if ids.is_empty() {
                    return Err(RouteError::EmptyDirect);
                }
                let mut ids: Vec<AgentId> =
                    ids.iter().copied().filter(|a| agents.contains(*a)).collect();
                ids.sort_unstable();
                ids.dedup();
                ids
            }
        };
        if out.is_empty() {
            return Err(RouteError::NoRecipients);
        }
        Ok(out)
    }

    /// Route `intents` emitted at `now` without touching the inbox.
    ///
    /// Every intent yields exactly one action envelope, `Executed` or
    /// `Rejected`.  Ids are assigned in intent order.
    pub fn plan(&self, intents: &[ActionIntent], now: Tick, agents: &AgentStore) -> RoutedBatch {
        let mut next_id = self.next_id;
        let mut alloc = || {
            let id = EnvelopeId(next_id);
            next_id += 1;
            id
        };

        let mut actions = Vec::with_capacity(intents.len());
        let mut observations = Vec::new();

        for intent in intents {
            let origin = Origin { actor: intent.actor, created: now, parent: None };
            let mut action = EventEnvelope::action(
                alloc(),
                intent.channel,
                intent.scope.clone(),
                intent.delay,
                intent.payload.clone(),
                origin,
            );

            let resolved = if agents.contains(intent.actor) {
                Self::recipients(intent.channel, &intent.scope, agents)
                    .and_then(|r| Ok((r, delivery_tick(now, intent.delay)?)))
            } else {
                Err(RouteError::UnknownActor(intent.actor))
            };

            // A fresh envelope is pending, so neither transition can fail.
            match resolved {
                Ok((recipients, at)) => {
                    let moved = action.transition(EnvelopeStatus::Executed);
                    debug_assert!(moved.is_ok(), "{moved:?}");
                    for r in recipients {
                        observations.push(EventEnvelope::observation_of(&action, alloc(), r, at));
                    }
                }
                Err(reason) => {
                    warn!(
                        target: "crv_router",
                        tick = now.0,
                        agent = intent.actor.0,
                        action = %intent.payload.kind(),
                        scope = %intent.scope,
                        reason = reason.reason(),
                        "action rejected"
                    );
                    let moved = action.reject(reason);
                    debug_assert!(moved.is_ok(), "{moved:?}");
                }
            }
            actions.push(action);
        }

        RoutedBatch { actions, observations, next_id }
    }

    /// Observations visible at `tick`, in routing order.
    pub fn due(&self, tick: Tick) -> &[EventEnvelope] {
        self.inbox.get(&tick).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Observations visible to `agent` at `tick`.
    pub fn due_for(&self, tick: Tick, agent: AgentId) -> impl Iterator<Item = &EventEnvelope> {
        self.due(tick).iter().filter(move |e| e.recipient() == Some(agent))
    }

    /// The observations [`commit`](Self::commit) would drain at `now`, as
    /// they read once executed.  The inbox is left untouched.
    pub fn delivering(&self, now: Tick) -> Vec<EventEnvelope> {
        let mut out = self.due(now).to_vec();
        out.iter_mut().for_each(Self::execute);
        out
    }

    /// Commit tick `now`: drain and execute its deliveries, then enqueue the
    /// observations of `batch`.  Returns the drained observations.
    pub fn commit(&mut self, now: Tick, batch: RoutedBatch) -> Vec<EventEnvelope> {
        let mut delivered = self.inbox.remove(&now).unwrap_or_default();
        self.pending -= delivered.len();
        delivered.iter_mut().for_each(Self::execute);

        self.next_id = self.next_id.max(batch.next_id);
        for obs in batch.observations {
            // `deliver_at` is always set on observations and is > now.
            let at = obs.deliver_at().unwrap_or(now.next());
            self.inbox.entry(at).or_default().push(obs);
            self.pending += 1;
        }
        debug!(
            target: "crv_router",
            tick = now.0,
            delivered = delivered.len(),
            pending = self.pending,
            "inbox committed"
        );
        delivered
    }

    /// Inbox entries are pending until drained.
    fn execute(env: &mut EventEnvelope) {
        let moved = env.transition(EnvelopeStatus::Executed);
        debug_assert!(moved.is_ok(), "{moved:?}");
    }

    /// Observations waiting for future ticks.
    pub fn pending_len(&self) -> usize {
        self.pending
    }

    /// The earliest tick with a queued observation.
    pub fn next_delivery_tick(&self) -> Option<Tick> {
        self.inbox.keys().next().copied()
    }
}
