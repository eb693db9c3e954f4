//! Rows produced by one COMMIT.
//!
//! One [`CommitBatch`] per committed tick, handed to the observer exactly
//! once.  Row types are plain data so any backend can write them without
//! knowing engine types.
//!
//! | Table            | One row per                                            |
//! |------------------|--------------------------------------------------------|
//! | `events`         | action routed this tick, observation delivered         |
//! | `identity_edges` | edge of every graph that changed (all at baseline)     |
//! | `decisions`      | agent decision, abstentions included                   |
//! | `scenarios`      | (agent, token) valuation context                       |
//! | `provider_calls` | interpret/evaluate call, with source and error         |
//! | `edit_rejections`| graph edit rejected during PATCH_APPLY                 |

use serde::{Deserialize, Serialize};

use crv_cognition::{EstimateSource, ScenarioContext};
use crv_core::{AgentId, ContextHash, Tick};
use crv_decision::Decision;
use crv_graph::Edge;
use crv_router::EventEnvelope;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    pub bucket:       u64,
    pub tick:         u64,
    pub envelope_id:  u64,
    pub kind:         String,
    pub status:       String,
    pub channel:      String,
    pub scope:        String,
    pub actor_id:     u32,
    pub recipient_id: Option<u32>,
    pub created_tick: u64,
    pub parent_id:    Option<u64>,
    pub deliver_at:   Option<u64>,
    pub action:       String,
    pub payload_key:  String,
    pub payload_json: String,
    pub reason:       Option<String>,
}

impl EventRow {
    pub fn from_envelope(env: &EventEnvelope, tick: Tick, bucket: u64) -> Self {
        Self {
            bucket,
            tick:         tick.0,
            envelope_id:  env.id().0,
            kind:         env.kind().as_str().to_owned(),
            status:       env.status().as_str().to_owned(),
            channel:      env.channel().as_str().to_owned(),
            scope:        env.scope().to_string(),
            actor_id:     env.origin().actor.0,
            recipient_id: env.recipient().map(|a| a.0),
            created_tick: env.origin().created.0,
            parent_id:    env.origin().parent.map(|p| p.0),
            deliver_at:   env.deliver_at().map(|t| t.0),
            action:       env.payload().kind().as_str().to_owned(),
            payload_key:  env.payload().canonical_key(),
            payload_json: serde_json::to_string(env.payload()).unwrap_or_default(),
            reason:       env.rejection().map(|r| r.reason().to_owned()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdentityEdgeRow {
    pub bucket:           u64,
    pub tick:             u64,
    pub observer_id:      u32,
    pub edge_kind:        String,
    pub subject_id:       Option<u32>,
    pub object_id:        Option<u32>,
    pub related_agent_id: Option<u32>,
    pub token_id:         Option<u32>,
    pub weight:           f64,
    pub edge_sign:        Option<i8>,
}

impl IdentityEdgeRow {
    pub fn from_edge(observer: AgentId, edge: &Edge, tick: Tick, bucket: u64) -> Self {
        Self {
            bucket,
            tick:             tick.0,
            observer_id:      observer.0,
            edge_kind:        edge.key.kind.as_str().to_owned(),
            subject_id:       edge.key.subject.map(|e| e.0),
            object_id:        edge.key.object.map(|e| e.0),
            related_agent_id: edge.key.related_agent.map(|a| a.0),
            token_id:         edge.key.token.map(|t| t.0),
            weight:           edge.weight,
            edge_sign:        edge.sign(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionRow {
    pub bucket:          u64,
    pub tick:            u64,
    pub agent_id:        u32,
    pub abstained:       bool,
    pub chosen_index:    Option<u32>,
    pub chosen_action:   Option<String>,
    pub chosen_token:    Option<u32>,
    pub chosen_score:    Option<f64>,
    pub temperature:     f64,
    pub stochastic:      bool,
    /// Every candidate with its estimate, cost and score, as JSON.
    pub candidates_json: String,
    /// Token estimates used, as JSON.
    pub estimates_json:  String,
}

impl DecisionRow {
    pub fn from_decision(d: &Decision, bucket: u64) -> Self {
        let chosen = d.chosen.map(|i| &d.candidates[i]);
        Self {
            bucket,
            tick:            d.tick.0,
            agent_id:        d.agent.0,
            abstained:       d.abstained(),
            chosen_index:    d.chosen.map(|i| i as u32),
            chosen_action:   chosen.map(|c| c.candidate.action.as_str().to_owned()),
            chosen_token:    chosen.map(|c| c.candidate.token.0),
            chosen_score:    chosen.map(|c| c.score),
            temperature:     d.temperature,
            stochastic:      d.stochastic,
            candidates_json: serde_json::to_string(&d.candidates).unwrap_or_default(),
            estimates_json:  serde_json::to_string(&d.estimates).unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRow {
    pub bucket:         u64,
    pub tick:           u64,
    pub agent_id:       u32,
    pub token_id:       u32,
    pub token_kind:     String,
    pub owner_status:   String,
    pub peer_alignment: String,
    pub group_id:       Option<u32>,
    pub last_scope:     Option<String>,
    pub affect_index:   f64,
    pub salient_other:  Option<u32>,
    pub readout:        f64,
    pub context_hash:   String,
    pub estimate:       f64,
    pub source:         String,
}

impl ScenarioRow {
    pub fn new(
        ctx: &ScenarioContext,
        hash: &ContextHash,
        estimate: f64,
        source: EstimateSource,
        bucket: u64,
    ) -> Self {
        Self {
            bucket,
            tick:           ctx.tick.0,
            agent_id:       ctx.agent.0,
            token_id:       ctx.token.0,
            token_kind:     ctx.token_kind.clone(),
            owner_status:   ctx.owner_status.as_str().to_owned(),
            peer_alignment: ctx.peer_alignment.as_str().to_owned(),
            group_id:       ctx.group.map(|g| g.0),
            last_scope:     ctx.last_scope.clone(),
            affect_index:   ctx.affect_index,
            salient_other:  ctx.salient_other.map(|a| a.0),
            readout:        ctx.readout,
            context_hash:   hash.to_string(),
            estimate,
            source:         source.as_str().to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProviderCallRow {
    pub bucket:       u64,
    pub tick:         u64,
    pub agent_id:     u32,
    pub provider:     String,
    /// `interpret` or `evaluate`.
    pub phase:        String,
    pub persona_hash: String,
    pub context_hash: Option<String>,
    pub envelope_id:  Option<u64>,
    pub source:       String,
    pub error:        Option<String>,
}

/// A graph edit that failed validation.  The rest of its patch still
/// applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EditRejectionRow {
    pub bucket:      u64,
    pub tick:        u64,
    pub agent_id:    u32,
    /// Position of the patch among the agent's patches this tick.
    pub patch_index: u32,
    /// Position of the edit within its patch.
    pub edit_index:  u32,
    pub operation:   String,
    pub reason:      String,
    pub detail:      String,
}

/// Everything one COMMIT wrote.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommitBatch {
    pub tick:           Tick,
    pub bucket:         u64,
    pub events:         Vec<EventRow>,
    pub identity_edges: Vec<IdentityEdgeRow>,
    pub decisions:      Vec<DecisionRow>,
    pub scenarios:      Vec<ScenarioRow>,
    pub provider_calls: Vec<ProviderCallRow>,
    pub rejections:     Vec<EditRejectionRow>,
}

impl CommitBatch {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
            && self.identity_edges.is_empty()
            && self.decisions.is_empty()
            && self.scenarios.is_empty()
            && self.provider_calls.is_empty()
            && self.rejections.is_empty()
    }
}
