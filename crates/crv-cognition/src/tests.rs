//! Unit tests for crv-cognition.

#[cfg(test)]
mod helpers {
    use crv_agent::{AgentStore, AgentStoreBuilder};
    use crv_core::{AgentId, GroupId, Persona, Tick, TokenId};
    use crv_graph::RepresentationGraph;
    use crv_router::{ActionIntent, EventEnvelope, EventRouter, Payload, Scope};

    use crate::{AgentView, OwnerStatus, PeerAlignment, ScenarioContext};

    /// Four agents: 0–1 in g1, 2–3 in g2.
    pub fn world() -> AgentStore {
        let (store, _) = AgentStoreBuilder::new(4, 7)
            .group(AgentId(0), GroupId(1))
            .group(AgentId(1), GroupId(1))
            .group(AgentId(2), GroupId(2))
            .group(AgentId(3), GroupId(2))
            .build()
            .unwrap();
        store
    }

    /// The observation of `payload` sent by `actor` on `scope`, as delivered
    /// to `to`.
    pub fn observe(actor: u32, scope: Scope, payload: Payload, to: u32) -> EventEnvelope {
        let batch = EventRouter::new().plan(
            &[ActionIntent::new(AgentId(actor), scope, payload)],
            Tick(0),
            &world(),
        );
        batch
            .observations
            .into_iter()
            .find(|o| o.recipient() == Some(AgentId(to)))
            .unwrap()
    }

    pub fn view<'a>(agent: u32, persona: &'a Persona, graph: &'a RepresentationGraph) -> AgentView<'a> {
        AgentView {
            agent: AgentId(agent),
            tick: Tick(1),
            persona,
            affect: Default::default(),
            group: None,
            graph,
        }
    }

    pub fn scenario(token: u32, readout: f64) -> ScenarioContext {
        ScenarioContext {
            tick:           Tick(3),
            agent:          AgentId(0),
            token:          TokenId(token),
            token_kind:     "Alpha".into(),
            owner_status:   OwnerStatus::Owned,
            peer_alignment: PeerAlignment::Aligned,
            group:          Some(GroupId(1)),
            last_scope:     Some("group".into()),
            affect_index:   0.5,
            salient_other:  Some(AgentId(1)),
            readout,
        }
    }
}

// ── Mock rules ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod mock_rules {
    use crv_core::{AgentId, GroupId, InterpretFallback, Persona, TokenId, Valence};
    use crv_graph::{EdgeKey, GraphEdit, RepresentationGraph};
    use crv_router::{Payload, Scope};

    use super::helpers::*;
    use crate::{CognitionProvider, MockProvider, Target, fallback_interpretation};

    fn only_adjust(outcome: &crate::InterpretOutcome) -> (EdgeKey, f64) {
        let patch = outcome.patch.as_ref().unwrap();
        assert_eq!(patch.edits.len(), 1);
        match patch.edits[0] {
            GraphEdit::Adjust { key, delta } => (key, delta),
            ref other => panic!("unexpected edit {other:?}"),
        }
    }

    #[test]
    fn own_acquire_strengthens_self_to_object() {
        let p = Persona::default();
        let g = RepresentationGraph::new(AgentId(0));
        let obs = observe(0, Scope::Public, Payload::AcquireToken { token: TokenId(2) }, 0);
        let out = MockProvider::new().interpret(&view(0, &p, &g), &obs).unwrap();
        assert_eq!(only_adjust(&out), (EdgeKey::self_to_object(AgentId(0), TokenId(2)), 0.2));
        assert_eq!(out.interpretation.event_type, "acquire_token");
        assert_eq!(out.interpretation.salience, 0.4);
        assert!(out.interpretation.is_valid());
    }

    #[test]
    fn others_endorsement_becomes_agent_to_object() {
        let p = Persona::default();
        let g = RepresentationGraph::new(AgentId(1));
        let obs = observe(
            0,
            Scope::Group(GroupId(1)),
            Payload::EndorseToken { token: TokenId(1), valence: Valence::Negative },
            1,
        );
        let out = MockProvider::new().interpret(&view(1, &p, &g), &obs).unwrap();
        assert_eq!(only_adjust(&out), (EdgeKey::agent_to_object(AgentId(0), TokenId(1)), -0.2));
        assert_eq!(out.interpretation.salience, 0.7);
        assert_eq!(
            out.interpretation.targets,
            vec![Target::Agent(AgentId(0)), Target::Token(TokenId(1))]
        );
    }

    #[test]
    fn relation_toward_observer_is_reciprocated() {
        let p = Persona::default();
        let g = RepresentationGraph::new(AgentId(3));
        let obs = observe(
            2,
            Scope::Direct(vec![AgentId(3)]),
            Payload::RelateAgent { agent: AgentId(3), valence: Valence::Positive },
            3,
        );
        let out = MockProvider::new().interpret(&view(3, &p, &g), &obs).unwrap();
        assert_eq!(only_adjust(&out), (EdgeKey::self_to_agent(AgentId(3), AgentId(2)), 0.2));
        assert_eq!(out.interpretation.salience, 1.0);
        assert_eq!(out.interpretation.inferred["reciprocity"], "positive");
    }

    #[test]
    fn chat_is_inert() {
        let p = Persona::default();
        let g = RepresentationGraph::new(AgentId(1));
        let obs = observe(0, Scope::Public, Payload::SendChatMessage { text: "hi".into() }, 1);
        let out = MockProvider::new().interpret(&view(1, &p, &g), &obs).unwrap();
        assert!(out.patch.is_none());
        assert_eq!(out.interpretation.salience, 0.0);
        assert!(out.interpretation.appraisal.is_none());
    }

    #[test]
    fn every_mock_patch_validates() {
        let p = Persona::default();
        let g = RepresentationGraph::new(AgentId(1));
        let payloads = [
            Payload::AcquireToken { token: TokenId(0) },
            Payload::RelinquishToken { token: TokenId(0) },
            Payload::RelateAgent { agent: AgentId(2), valence: Valence::Negative },
            Payload::EndorseToken { token: TokenId(0), valence: Valence::Positive },
            Payload::ExposeSignalAboutToken { token: TokenId(0), valence: Valence::Negative },
            Payload::DeclareCooccurrence { a: TokenId(0), b: TokenId(1) },
        ];
        for payload in payloads {
            let obs = observe(0, Scope::Public, payload, 1);
            let out = MockProvider::new().interpret(&view(1, &p, &g), &obs).unwrap();
            for e in &out.patch.unwrap().edits {
                e.validate().unwrap();
            }
            assert!(out.interpretation.is_valid());
        }
    }

    #[test]
    fn fallbacks() {
        let p = Persona::default();
        let g = RepresentationGraph::new(AgentId(1));
        let obs = observe(0, Scope::Public, Payload::AcquireToken { token: TokenId(0) }, 1);
        let none = fallback_interpretation(InterpretFallback::NoPatch, &view(1, &p, &g), &obs);
        assert!(none.patch.is_none());
        assert_eq!(none.interpretation.salience, 0.0);
        let rules = fallback_interpretation(InterpretFallback::Rules, &view(1, &p, &g), &obs);
        assert!(rules.patch.is_some());
    }
}

// ── Scenario context ──────────────────────────────────────────────────────────

#[cfg(test)]
mod context {
    use crv_core::Tick;

    use super::helpers::*;
    use crate::{OwnerStatus, PeerAlignment};

    #[test]
    fn hash_ignores_tick_but_not_content() {
        let a = scenario(0, 0.1);
        let mut b = a.clone();
        b.tick = Tick(99);
        assert_eq!(a.hash().unwrap(), b.hash().unwrap());
        b.owner_status = OwnerStatus::NotOwned;
        assert_ne!(a.hash().unwrap(), b.hash().unwrap());
    }

    #[test]
    fn labels_parse_strictly() {
        assert_eq!("not_owned".parse::<OwnerStatus>().unwrap(), OwnerStatus::NotOwned);
        assert_eq!("misaligned".parse::<PeerAlignment>().unwrap(), PeerAlignment::Misaligned);
        assert!("Owned".parse::<OwnerStatus>().is_err());
        for a in PeerAlignment::ALL {
            assert_eq!(a.as_str().parse::<PeerAlignment>().unwrap(), *a);
        }
    }

    #[test]
    fn alignment_thresholds() {
        assert_eq!(PeerAlignment::from_mean(None, 0.1), PeerAlignment::Neutral);
        assert_eq!(PeerAlignment::from_mean(Some(0.1), 0.1), PeerAlignment::Neutral);
        assert_eq!(PeerAlignment::from_mean(Some(0.3), 0.1), PeerAlignment::Aligned);
        assert_eq!(PeerAlignment::from_mean(Some(-0.3), 0.1), PeerAlignment::Misaligned);
    }
}

// ── Cached oracle ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod cached {
    use crv_core::{Persona, ValuationParams, canonical_hash};

    use super::helpers::*;
    use crate::{
        CognitionProvider, EstimateSource, EvaluateRequest, PolicyLookup, PolicyTable, Provider,
        ProviderError,
    };

    fn request(readout: f64) -> EvaluateRequest {
        let scenario = scenario(0, readout);
        EvaluateRequest {
            context_hash: scenario.hash().unwrap(),
            persona: Persona::default(),
            persona_hash: canonical_hash(&Persona::default()).unwrap(),
            model: "mock".into(),
            scenario,
        }
    }

    #[test]
    fn second_identical_request_hits() {
        let oracle = Provider::mock().cached();
        let req = request(0.25);
        let first = oracle.evaluate(&req).unwrap();
        let second = oracle.evaluate(&req).unwrap();
        assert_eq!(first.source, EstimateSource::Computed);
        assert_eq!(second.source, EstimateSource::Cache);
        assert_eq!(first.value, second.value);
        let Provider::CachedOracle(c) = &oracle else { unreachable!() };
        assert_eq!(c.stats().hits, 1);
        assert_eq!(c.stats().misses, 1);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn failure_is_recorded_as_fallback() {
        let lookup = PolicyLookup::new(PolicyTable::new(), &ValuationParams::default());
        let oracle = Provider::PolicyLookup(lookup).cached();
        let req = request(-0.4);

        let err = oracle.evaluate(&req).unwrap_err();
        assert!(matches!(err, ProviderError::MissingPolicy(_)));

        let again = oracle.evaluate(&req).unwrap();
        assert_eq!(again.source, EstimateSource::Fallback);
        assert_eq!(again.value, -0.4);
        let Provider::CachedOracle(c) = &oracle else { unreachable!() };
        assert!(c.is_fallback(&req.context_hash));
        assert_eq!(c.stats().fallbacks, 1);
        assert_eq!(c.stats().hits, 1);
    }

    #[test]
    fn name_and_version_pass_through() {
        let oracle = Provider::mock().cached();
        assert_eq!(oracle.name(), "cached_oracle");
        assert!(oracle.schema_version().is_compatible());
    }
}

// ── Policy table ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod policy {
    use std::io::{Cursor, Write};

    use crv_core::{Persona, SchemaVersion, ValuationParams, canonical_hash};

    use super::helpers::*;
    use crate::{
        CognitionProvider, EstimateSource, EvaluateRequest, OwnerStatus, PeerAlignment, PolicyError,
        PolicyKey, PolicyLookup, PolicyTable,
    };

    const CSV: &str = "\
schema_version,token_kind,owner_status,peer_alignment,persona,model,value_mean,value_sd,sample_count
0.1,Alpha,owned,aligned,default,mock,7,0.5,10
0.1,Alpha,not_owned,misaligned,default,mock,2.5,1.0,10
";

    #[test]
    fn loads_and_looks_up() {
        let table = PolicyTable::load_reader(Cursor::new(CSV)).unwrap();
        assert_eq!(table.len(), 2);
        let key = PolicyKey {
            token_kind:     "Alpha".into(),
            owner_status:   OwnerStatus::NotOwned,
            peer_alignment: PeerAlignment::Misaligned,
            persona:        "default".into(),
            model:          "mock".into(),
        };
        assert_eq!(table.get(&key).unwrap().value_mean, 2.5);
        assert_eq!(table.get(&key).unwrap().sample_count, 10);
    }

    #[test]
    fn version_mismatch_is_rejected_at_load() {
        let csv = CSV.replacen("0.1,Alpha,owned", "0.2,Alpha,owned", 1);
        let err = PolicyTable::load_reader(Cursor::new(csv)).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::VersionMismatch { found: SchemaVersion { major: 0, minor: 2 }, .. }
        ));
    }

    #[test]
    fn bad_labels_and_duplicates() {
        let csv = CSV.replace("misaligned", "hostile");
        assert!(matches!(PolicyTable::load_reader(Cursor::new(csv)), Err(PolicyError::Parse(_))));
        let dup = format!("{CSV}0.1,Alpha,owned,aligned,default,mock,3,0.5,4\n");
        assert!(matches!(PolicyTable::load_reader(Cursor::new(dup)), Err(PolicyError::Duplicate(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let table = PolicyTable::load_csv(file.path()).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn lookup_scales_likert_onto_band() {
        let table = PolicyTable::load_reader(Cursor::new(CSV)).unwrap();
        let params = ValuationParams { v_base: 0.5, phi: 2.0, ..ValuationParams::default() };
        let lookup = PolicyLookup::new(table, &params);
        let scenario = scenario(0, 0.0);
        let req = EvaluateRequest {
            context_hash: scenario.hash().unwrap(),
            persona: Persona::default(),
            persona_hash: canonical_hash(&Persona::default()).unwrap(),
            model: "mock".into(),
            scenario,
        };
        let est = lookup.evaluate(&req).unwrap();
        assert_eq!(est.source, EstimateSource::Computed);
        assert!((est.value - 2.5).abs() < 1e-12);

        let mut other = req.clone();
        other.model = "gpt".into();
        assert!(lookup.evaluate(&other).is_err());
    }
}
