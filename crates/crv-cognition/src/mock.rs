//! Deterministic rule-based provider.
//!
//! | Observation                       | Patch                                      |
//! |-----------------------------------|--------------------------------------------|
//! | own `acquire_token(o)`            | `self_to_object(o) += STEP`                |
//! | own `relinquish_token(o)`         | `self_to_object(o) -= STEP`                |
//! | other `acquire/relinquish(o)`     | `agent_to_object(actor, o) ±= STEP`        |
//! | `relate_agent(k, ±)` by self      | `self_to_agent(k) ±= STEP`                 |
//! | `relate_agent(self, ±)` by other  | `self_to_agent(actor) ±= STEP`             |
//! | `relate_agent(k, ±)` otherwise    | `agent_to_agent(actor, k) ±= STEP`         |
//! | `endorse_token(o, ±)` by self     | `self_to_object(o) ±= TRACE`               |
//! | `endorse_token(o, ±)` by other    | `agent_to_object(actor, o) ±= STEP`        |
//! | `expose_signal_about_token(o, ±)` | `object_to_{pos,neg}_valence(o) += TRACE`  |
//! | `declare_cooccurrence(a, b)`      | `object_to_object(a, b) += TRACE`          |
//! | chat / announcement               | none                                       |
//!
//! Salience depends only on scope: direct 1.0, group/room 0.7, public 0.4.

use std::collections::BTreeMap;

use crv_core::{Appraisal, ENGINE_SCHEMA, SchemaVersion, Valence};
use crv_graph::{EdgeKey, GraphEdit, RepresentationPatch};
use crv_router::{EventEnvelope, Payload, Scope};

use crate::{
    AgentView, CognitionProvider, EstimateSource, EvaluateRequest, InterpretOutcome,
    Interpretation, ProviderResult, Target, ValueEstimate,
};

const STEP: f64 = 0.2;
const TRACE: f64 = 0.1;

/// Scope-dependent salience.
pub fn salience_of(scope: &Scope) -> f64 {
    match scope {
        Scope::Direct(_) => 1.0,
        Scope::Group(_) | Scope::Room(_) => 0.7,
        Scope::Public => 0.4,
    }
}

#[derive(Debug, Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        MockProvider
    }
}

impl CognitionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn schema_version(&self) -> SchemaVersion {
        ENGINE_SCHEMA
    }

    fn interpret(
        &self,
        view: &AgentView<'_>,
        observation: &EventEnvelope,
    ) -> ProviderResult<InterpretOutcome> {
        Ok(interpret_rules(view, observation))
    }

    /// The graph readout, unchanged.
    fn evaluate(&self, req: &EvaluateRequest) -> ProviderResult<ValueEstimate> {
        Ok(ValueEstimate { value: req.scenario.readout, source: EstimateSource::Computed })
    }
}

/// Apply the rule table to one observation.
pub fn interpret_rules(view: &AgentView<'_>, observation: &EventEnvelope) -> InterpretOutcome {
    let me = view.agent;
    let actor = observation.origin().actor;
    let own = actor == me;
    let payload = observation.payload();

    let mut targets = vec![Target::Agent(actor)];
    let mut inferred = BTreeMap::new();
    let mut edits = Vec::new();
    let mut valence: Option<Valence> = None;

    match payload {
        Payload::AcquireToken { token } | Payload::RelinquishToken { token } => {
            let sign = if matches!(payload, Payload::AcquireToken { .. }) { 1.0 } else { -1.0 };
            targets.push(Target::Token(*token));
            let key = if own {
                EdgeKey::self_to_object(me, *token)
            } else {
                EdgeKey::agent_to_object(actor, *token)
            };
            edits.push(adjust(key, sign * STEP));
            valence = Some(if sign > 0.0 { Valence::Positive } else { Valence::Negative });
        }
        Payload::RelateAgent { agent, valence: v } => {
            targets.push(Target::Agent(*agent));
            let key = if own {
                EdgeKey::self_to_agent(me, *agent)
            } else if *agent == me {
                inferred.insert("reciprocity".to_owned(), v.to_string());
                EdgeKey::self_to_agent(me, actor)
            } else {
                EdgeKey::agent_to_agent(actor, *agent)
            };
            edits.push(adjust(key, v.sign() * STEP));
            valence = Some(*v);
        }
        Payload::EndorseToken { token, valence: v } => {
            targets.push(Target::Token(*token));
            let (key, step) = if own {
                (EdgeKey::self_to_object(me, *token), TRACE)
            } else {
                (EdgeKey::agent_to_object(actor, *token), STEP)
            };
            edits.push(adjust(key, v.sign() * step));
            valence = Some(*v);
        }
        Payload::ExposeSignalAboutToken { token, valence: v } => {
            targets.push(Target::Token(*token));
            let key = match v {
                Valence::Positive => EdgeKey::object_positive(*token),
                Valence::Negative => EdgeKey::object_negative(*token),
            };
            edits.push(adjust(key, TRACE));
            valence = Some(*v);
        }
        Payload::DeclareCooccurrence { a, b } => {
            targets.extend([Target::Token(*a), Target::Token(*b)]);
            edits.push(adjust(EdgeKey::object_to_object(*a, *b), TRACE));
        }
        Payload::SendChatMessage { .. } | Payload::PublishAnnouncement { .. } => {}
    }

    let salience = if edits.is_empty() { 0.0 } else { salience_of(observation.scope()) };
    let interpretation = Interpretation {
        event_type: payload.kind().as_str().to_owned(),
        targets,
        inferred,
        salience,
        appraisal: valence.map(|v| appraise(v, own)),
    };
    let patch = (!edits.is_empty()).then(|| RepresentationPatch::new(edits));
    InterpretOutcome { interpretation, patch }
}

fn adjust(key: EdgeKey, delta: f64) -> GraphEdit {
    GraphEdit::Adjust { key, delta }
}

fn appraise(valence: Valence, own: bool) -> Appraisal {
    let positive = valence == Valence::Positive;
    Appraisal {
        valence:         if positive { 0.8 } else { 0.2 },
        arousal:         if own { 0.4 } else { 0.6 },
        certainty:       if own { 1.0 } else { 0.7 },
        novelty:         if own { 0.1 } else { 0.5 },
        goal_congruence: if positive { 0.7 } else { 0.3 },
    }
}

