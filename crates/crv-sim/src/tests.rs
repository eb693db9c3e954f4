//! Scenario tests for the barrier scheduler.

#[cfg(test)]
mod helpers {
    use std::sync::Mutex;

    use crv_agent::{AgentStoreBuilder, TokenCatalog};
    use crv_cognition::{
        AgentView, CognitionProvider, EstimateSource, EvaluateRequest, InterpretOutcome,
        ProviderError, ProviderResult, ValueEstimate, mock,
    };
    use crv_core::{ActionKind, AgentId, ENGINE_SCHEMA, EnvelopeId, GroupId, RunConfig, SchemaVersion, Tick, TokenId};
    use crv_graph::{EdgeKey, GraphEdit, RepresentationGraph};
    use crv_router::EventEnvelope;

    use crate::{Sim, SimBuilder, TwoGroupSeed, seed_two_group_identity};

    /// `agent_to_object` with its token slot missing.
    pub fn slotless_edit() -> GraphEdit {
        let key = EdgeKey { token: None, ..EdgeKey::agent_to_object(AgentId(0), ALPHA) };
        GraphEdit::Set { key, weight: 0.5 }
    }

    pub const ALPHA: TokenId = TokenId(0);
    pub const BETA: TokenId = TokenId(1);

    /// Rule-based provider with switchable failures and a call log.
    pub struct Scripted {
        pub version:          SchemaVersion,
        pub fail_interpret:   bool,
        pub fail_evaluate:    bool,
        pub salience:         Option<f64>,
        /// Append [`slotless_edit`] to every patch.
        pub bad_edit:         bool,
        pub interpret_calls:  Mutex<Vec<(Tick, AgentId, EnvelopeId)>>,
    }

    impl Default for Scripted {
        fn default() -> Self {
            Self {
                version:         ENGINE_SCHEMA,
                fail_interpret:  false,
                fail_evaluate:   false,
                salience:        None,
                bad_edit:        false,
                interpret_calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl Scripted {
        pub fn calls(&self) -> Vec<(Tick, AgentId, EnvelopeId)> {
            self.interpret_calls.lock().unwrap().clone()
        }
    }

    impl CognitionProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn schema_version(&self) -> SchemaVersion {
            self.version
        }

        fn interpret(
            &self,
            view: &AgentView<'_>,
            observation: &EventEnvelope,
        ) -> ProviderResult<InterpretOutcome> {
            self.interpret_calls.lock().unwrap().push((view.tick, view.agent, observation.id()));
            if self.fail_interpret {
                return Err(ProviderError::Timeout { millis: 50 });
            }
            let mut out = mock::interpret_rules(view, observation);
            if let Some(s) = self.salience {
                out.interpretation.salience = s;
            }
            if self.bad_edit {
                out.patch.get_or_insert_with(Default::default).edits.push(slotless_edit());
            }
            Ok(out)
        }

        fn evaluate(&self, req: &EvaluateRequest) -> ProviderResult<ValueEstimate> {
            if self.fail_evaluate {
                return Err(ProviderError::Unavailable("offline".into()));
            }
            Ok(ValueEstimate { value: req.scenario.readout, source: EstimateSource::Computed })
        }
    }

    /// Agents 0–2 in g1 (emblem Alpha), 3–5 in g2 (emblem Beta).
    /// Endorsement is priced out so agents acquire their own emblem first.
    pub fn config(ticks: u64) -> RunConfig {
        let mut c = RunConfig::new(11, ticks);
        c.decision.costs.insert(ActionKind::EndorseToken, 1.0);
        c
    }

    pub fn build<P: CognitionProvider>(config: RunConfig, provider: P) -> Sim<P> {
        let mut b = AgentStoreBuilder::new(6, config.seed);
        for i in 0..6u32 {
            b = b.group(AgentId(i), GroupId(if i < 3 { 1 } else { 2 }));
        }
        let (store, rngs) = b.build().unwrap();
        let tokens = TokenCatalog::new().with("Alpha", "g1 emblem").with("Beta", "g2 emblem");
        let mut graphs: Vec<RepresentationGraph> =
            (0..6).map(|i| RepresentationGraph::new(AgentId(i))).collect();
        seed_two_group_identity(
            &mut graphs,
            &store,
            &[(GroupId(1), ALPHA), (GroupId(2), BETA)],
            &TwoGroupSeed::default(),
        )
        .unwrap();
        SimBuilder::new(config, store, rngs, tokens, provider).graphs(graphs).build().unwrap()
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use crv_agent::{AgentStoreBuilder, TokenCatalog};
    use crv_cognition::Provider;
    use crv_core::{AgentId, RunConfig, SchemaVersion, TokenId};
    use crv_graph::RepresentationGraph;

    use super::helpers::*;
    use crate::{SimBuilder, SimError};

    #[test]
    fn incompatible_provider_is_fatal_before_tick_zero() {
        let (store, rngs) = AgentStoreBuilder::new(2, 0).build().unwrap();
        let provider = Scripted { version: SchemaVersion::new(0, 2), ..Scripted::default() };
        let err = SimBuilder::new(RunConfig::new(0, 5), store, rngs, TokenCatalog::new(), provider)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, SimError::VersionMismatch { found: SchemaVersion { major: 0, minor: 2 }, .. }));
    }

    #[test]
    fn graph_count_and_owner_checked() {
        let (store, rngs) = AgentStoreBuilder::new(3, 0).build().unwrap();
        let err = SimBuilder::new(RunConfig::new(0, 5), store.clone(), rngs, TokenCatalog::new(), Provider::mock())
            .graphs(vec![RepresentationGraph::new(AgentId(0))])
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, SimError::AgentCountMismatch { expected: 3, got: 1, what: "graphs" }));

        let (_, rngs) = AgentStoreBuilder::new(3, 0).build().unwrap();
        let swapped = vec![
            RepresentationGraph::new(AgentId(0)),
            RepresentationGraph::new(AgentId(2)),
            RepresentationGraph::new(AgentId(1)),
        ];
        let err = SimBuilder::new(RunConfig::new(0, 5), store, rngs, TokenCatalog::new(), Provider::mock())
            .graphs(swapped)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn invalid_config_and_unknown_holdings() {
        let (store, rngs) = AgentStoreBuilder::new(1, 0).build().unwrap();
        let mut config = RunConfig::new(0, 5);
        config.tick_bucket_size = 0;
        assert!(matches!(
            SimBuilder::new(config, store, rngs, TokenCatalog::new(), Provider::mock()).build(),
            Err(SimError::Config(_))
        ));

        let (store, rngs) = AgentStoreBuilder::new(1, 0).hold(AgentId(0), TokenId(9)).build().unwrap();
        assert!(matches!(
            SimBuilder::new(RunConfig::new(0, 5), store, rngs, TokenCatalog::new(), Provider::mock()).build(),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn seeded_graphs_keep_their_owner() {
        let sim = build(config(1), Provider::mock());
        assert_eq!(sim.graphs().len(), 6);
        assert_eq!(sim.tick().0, 0);
        assert_eq!(sim.graph(AgentId(4)).owner(), AgentId(4));
    }
}

// ── Barrier scenarios ─────────────────────────────────────────────────────────

#[cfg(test)]
mod scenarios {
    use std::collections::BTreeSet;

    use crv_cognition::Provider;
    use crv_core::{AgentId, GroupId, Tick};
    use crv_graph::{EdgeKey, RepresentationGraph};
    use crv_valuation::readout_all;

    use super::helpers::*;
    use crate::{CollectingObserver, NoopObserver, TickOutcome};

    fn snapshot(graphs: &[RepresentationGraph]) -> Vec<Vec<(EdgeKey, f64)>> {
        graphs.iter().map(|g| g.iter().map(|e| (e.key, e.weight)).collect()).collect()
    }

    #[test]
    fn identical_runs_are_identical() {
        let run = || {
            let mut sim = build(config(8), Provider::mock().cached());
            let mut obs = CollectingObserver::default();
            sim.run(&mut obs).unwrap();
            (obs.batches, snapshot(sim.graphs()))
        };
        let (a_batches, a_graphs) = run();
        let (b_batches, b_graphs) = run();
        assert_eq!(a_batches.len(), 8);
        assert_eq!(a_batches, b_batches);
        assert_eq!(a_graphs, b_graphs);
    }

    #[test]
    fn stochastic_runs_replay() {
        let run = || {
            let mut c = config(6);
            c.decision.stochastic = true;
            c.decision.temperature = 0.3;
            c.decision.abstain_threshold = -10.0;
            let mut sim = build(c, Provider::mock());
            let mut obs = CollectingObserver::default();
            sim.run(&mut obs).unwrap();
            obs.batches.into_iter().flat_map(|b| b.decisions).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn values_read_only_the_previous_commit() {
        let mut sim = build(config(6), Provider::mock());
        let mut obs = CollectingObserver::default();
        for _ in 0..6 {
            let tokens: Vec<_> = sim.tokens().ids().collect();
            let expected: Vec<Vec<f64>> = sim
                .graphs()
                .iter()
                .map(|g| {
                    readout_all(g, tokens.iter().copied(), &sim.config().valuation)
                        .into_iter()
                        .map(|r| r.value)
                        .collect()
                })
                .collect();
            sim.step(&mut obs).unwrap();
            let batch = obs.batches.last().unwrap();
            for row in &batch.scenarios {
                assert_eq!(row.readout, expected[row.agent_id as usize][row.token_id as usize]);
            }
        }
    }

    #[test]
    fn observations_change_graphs_one_tick_later() {
        let mut sim = build(config(3), Provider::mock());
        let mut obs = CollectingObserver::default();
        let key = EdgeKey::self_to_object(AgentId(0), ALPHA);
        let before = sim.graph(AgentId(0)).weight(&key);

        // Tick 0: agent 0 acquires its emblem.  Nothing is interpreted yet.
        sim.step(&mut obs).unwrap();
        assert_eq!(sim.graph(AgentId(0)).weight(&key), before);
        assert!(sim.agents().holds(AgentId(0), ALPHA));

        // Tick 1: the observation is interpreted and committed.
        sim.step(&mut obs).unwrap();
        assert!(sim.graph(AgentId(0)).weight(&key).unwrap() > before.unwrap());
    }

    #[test]
    fn group_actions_reach_only_group_members() {
        let provider = Scripted::default();
        let mut sim = build(config(2), provider);
        let mut obs = CollectingObserver::default();
        sim.run(&mut obs).unwrap();

        let actions: Vec<_> = obs.batches[0].events.iter().filter(|e| e.kind == "action").collect();
        assert!(!actions.is_empty());
        for a in &actions {
            assert_eq!(a.status, "executed");
            let group = if a.actor_id < 3 { 1 } else { 2 };
            assert_eq!(a.scope, format!("group:{group}"));
        }

        let calls = sim.provider().calls();
        assert!(calls.iter().all(|(t, _, _)| *t == Tick(1)));
        let delivered: Vec<_> = obs.batches[1].events.iter().filter(|e| e.kind == "observation").collect();
        assert_eq!(delivered.len(), calls.len());
        for d in delivered {
            let same_group = (d.actor_id < 3) == (d.recipient_id.unwrap() < 3);
            assert!(same_group, "{d:?}");
            assert_eq!(d.deliver_at, Some(1));
            assert_eq!(d.created_tick, 0);
        }
    }

    #[test]
    fn high_threshold_abstains_everyone() {
        let mut c = config(3);
        c.decision.abstain_threshold = 5.0;
        let mut sim = build(c, Provider::mock());
        let mut obs = CollectingObserver::default();
        sim.run(&mut obs).unwrap();
        for b in &obs.batches {
            assert_eq!(b.decisions.len(), 6);
            assert!(b.decisions.iter().all(|d| d.abstained && d.chosen_index.is_none()));
            assert!(b.events.is_empty());
            assert!(b.decisions.iter().all(|d| d.candidates_json.contains("acquire_token")));
        }
    }

    #[test]
    fn baseline_then_only_changed_graphs() {
        let mut sim = build(config(3), Provider::mock());
        let mut obs = CollectingObserver::default();

        sim.step(&mut obs).unwrap();
        let total: usize = sim.graphs().iter().map(RepresentationGraph::len).sum();
        assert_eq!(obs.batches[0].identity_edges.len(), total);
        let observers: BTreeSet<u32> =
            obs.batches[0].identity_edges.iter().map(|r| r.observer_id).collect();
        assert_eq!(observers.len(), 6);

        let before: Vec<u64> = sim.graphs().iter().map(RepresentationGraph::revision).collect();
        sim.step(&mut obs).unwrap();
        let changed: BTreeSet<u32> = sim
            .graphs()
            .iter()
            .zip(&before)
            .filter(|(g, r)| g.revision() != **r)
            .map(|(g, _)| g.owner().0)
            .collect();
        assert!(!changed.is_empty());
        let written: BTreeSet<u32> =
            obs.batches[1].identity_edges.iter().map(|r| r.observer_id).collect();
        assert_eq!(written, changed);
        let expected: usize = changed.iter().map(|&a| sim.graph(AgentId(a)).len()).sum();
        assert_eq!(obs.batches[1].identity_edges.len(), expected);

        // Nothing is delivered at tick 2 after a tick of abstentions.
        sim.step(&mut obs).unwrap();
        assert!(obs.batches[2].identity_edges.is_empty());
    }

    #[test]
    fn holdings_and_context_follow_commits() {
        let mut sim = build(config(3), Provider::mock());
        let mut obs = CollectingObserver::default();
        sim.run(&mut obs).unwrap();

        let t0 = &obs.batches[0].scenarios;
        let t2 = &obs.batches[2].scenarios;
        let own = |rows: &[crate::ScenarioRow], agent: u32| {
            rows.iter().find(|r| r.agent_id == agent && r.token_id == 0).cloned().unwrap()
        };
        assert_eq!(own(t0, 0).owner_status, "not_owned");
        assert_eq!(own(t0, 0).last_scope, None);
        assert_eq!(own(t0, 0).peer_alignment, "aligned");
        assert_eq!(own(t2, 0).owner_status, "owned");
        assert_eq!(own(t2, 0).last_scope.as_deref(), Some("group"));
        assert!(own(t2, 0).salient_other.is_some_and(|o| o < 3 && o != 0));
        assert_eq!(own(t2, 0).group_id, Some(1));
        assert_eq!(sim.agents().group[0], Some(GroupId(1)));
    }

    #[test]
    fn affect_moves_after_observations() {
        let mut sim = build(config(2), Provider::mock());
        let before = sim.agents().affect[0];
        sim.run(&mut NoopObserver).unwrap();
        assert_ne!(sim.agents().affect[0], before);
        let a = sim.agents().affect[0];
        for v in [a.valence, a.arousal, a.stress] {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn run_returns_summary() {
        let mut sim = build(config(4), Provider::mock());
        let summary = sim.run(&mut NoopObserver).unwrap();
        assert_eq!(summary.ticks_committed, 4);
        assert_eq!(summary.final_tick, Tick(4));
        assert!(summary.cancelled.is_none());
        assert!(matches!(sim.step(&mut NoopObserver).unwrap(), TickOutcome::Committed(_)));
    }

    #[test]
    fn rows_carry_bucket() {
        let mut c = config(5);
        c.tick_bucket_size = 2;
        let mut sim = build(c, Provider::mock());
        let mut obs = CollectingObserver::default();
        sim.run(&mut obs).unwrap();
        for b in &obs.batches {
            assert_eq!(b.bucket, b.tick.0 / 2);
            assert!(b.decisions.iter().all(|d| d.bucket == b.bucket));
            assert!(b.scenarios.iter().all(|s| s.bucket == b.bucket));
        }
    }
}

// ── Failures ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod failures {
    use crv_cognition::{PolicyLookup, PolicyTable, Provider};
    use crv_core::{InterpretFallback, Persona, Tick, ValuationParams, canonical_hash};

    use super::helpers::*;
    use crate::{
        CollectingObserver, CommitBatch, NoopObserver, SimError, SimObserver, SimResult, TickOutcome,
    };

    #[test]
    fn evaluate_failure_falls_back_to_readout() {
        let provider = Scripted { fail_evaluate: true, ..Scripted::default() };
        let mut sim = build(config(2), provider);
        let mut obs = CollectingObserver::default();
        let summary = sim.run(&mut obs).unwrap();
        assert_eq!(summary.ticks_committed, 2);
        for b in &obs.batches {
            assert!(b.scenarios.iter().all(|s| s.source == "fallback" && s.estimate == s.readout));
            let evals: Vec<_> = b.provider_calls.iter().filter(|c| c.phase == "evaluate").collect();
            assert_eq!(evals.len(), 12);
            assert!(evals.iter().all(|c| c.error.as_deref().is_some_and(|e| e.contains("offline"))));
        }
    }

    #[test]
    fn interpret_failure_uses_configured_fallback() {
        let provider = Scripted { fail_interpret: true, ..Scripted::default() };
        let mut sim = build(config(2), provider);
        let before = sim.graphs().to_vec();
        let mut obs = CollectingObserver::default();
        sim.run(&mut obs).unwrap();
        let failed: Vec<_> = obs.batches[1]
            .provider_calls
            .iter()
            .filter(|c| c.phase == "interpret")
            .collect();
        assert!(!failed.is_empty());
        assert!(failed.iter().all(|c| c.source == "fallback" && c.error.is_some()));
        // NoPatch: no graph changed.
        for (a, b) in before.iter().zip(sim.graphs()) {
            assert_eq!(a.revision(), b.revision());
        }

        let mut c = config(2);
        c.interpret_fallback = InterpretFallback::Rules;
        let provider = Scripted { fail_interpret: true, ..Scripted::default() };
        let mut sim = build(c, provider);
        let before: Vec<u64> = sim.graphs().iter().map(|g| g.revision()).collect();
        sim.run(&mut NoopObserver).unwrap();
        assert!(sim.graphs().iter().zip(before).any(|(g, r)| g.revision() != r));
    }

    #[test]
    fn out_of_range_salience_is_a_provider_failure() {
        let provider = Scripted { salience: Some(1.5), ..Scripted::default() };
        let mut sim = build(config(2), provider);
        let mut obs = CollectingObserver::default();
        sim.run(&mut obs).unwrap();
        let calls = &obs.batches[1].provider_calls;
        assert!(calls.iter().filter(|c| c.phase == "interpret").all(|c| c.source == "fallback"));
    }

    #[test]
    fn cached_fallbacks_resolve_identically() {
        let lookup = PolicyLookup::new(PolicyTable::new(), &ValuationParams::default());
        let mut sim = build(config(1), Provider::PolicyLookup(lookup).cached());
        let mut obs = CollectingObserver::default();
        sim.run(&mut obs).unwrap();
        let rows = &obs.batches[0].scenarios;
        assert!(rows.iter().all(|r| r.source == "fallback" && r.estimate == r.readout));
        let Provider::CachedOracle(cache) = sim.provider() else { unreachable!() };
        assert_eq!(cache.stats().fallbacks, 12);
        assert_eq!(cache.len(), 12);
    }

    #[test]
    fn cached_fallbacks_stay_fallbacks_on_later_ticks() {
        let lookup = PolicyLookup::new(PolicyTable::new(), &ValuationParams::default());
        let mut sim = build(config(3), Provider::PolicyLookup(lookup).cached());
        let mut obs = CollectingObserver::default();
        sim.run(&mut obs).unwrap();

        let Provider::CachedOracle(cache) = sim.provider() else { unreachable!() };
        assert!(cache.stats().hits > 0);
        for b in &obs.batches {
            assert!(b.scenarios.iter().all(|r| r.source == "fallback" && r.estimate == r.readout));
            let evals = b.provider_calls.iter().filter(|c| c.phase == "evaluate");
            assert!(evals.clone().all(|c| c.source == "fallback"));
            // Only misses reach the inner provider and fail.
            let failed = evals.filter(|c| c.error.is_some()).count() as u64;
            assert!(failed <= 12);
        }
        let failed: u64 = obs
            .batches
            .iter()
            .flat_map(|b| &b.provider_calls)
            .filter(|c| c.phase == "evaluate" && c.error.is_some())
            .count() as u64;
        assert_eq!(failed, cache.stats().misses);
    }

    #[test]
    fn rejected_edits_are_persisted_and_the_rest_of_the_patch_lands() {
        let mut clean = build(config(2), Scripted::default());
        clean.run(&mut NoopObserver).unwrap();

        let mut sim = build(config(2), Scripted { bad_edit: true, ..Scripted::default() });
        let mut obs = CollectingObserver::default();
        assert!(matches!(sim.step(&mut obs).unwrap(), TickOutcome::Committed(r) if r.edits_rejected == 0));
        let TickOutcome::Committed(report) = sim.step(&mut obs).unwrap() else { unreachable!() };

        let interpreted = sim.provider().calls().iter().filter(|(t, ..)| *t == Tick(1)).count();
        assert!(interpreted > 0);
        assert_eq!(report.edits_rejected, interpreted);

        assert!(obs.batches[0].rejections.is_empty());
        let rows = &obs.batches[1].rejections;
        assert_eq!(rows.len(), interpreted);
        assert!(rows.iter().all(|r| {
            r.tick == 1
                && r.operation == "set_identity_edge_weight"
                && r.reason == "missing_slot"
                && !r.detail.is_empty()
        }));

        for (a, b) in clean.graphs().iter().zip(sim.graphs()) {
            assert_eq!(a.iter().collect::<Vec<_>>(), b.iter().collect::<Vec<_>>());
        }
    }

    struct FailingSink;

    impl SimObserver for FailingSink {
        fn on_commit(&mut self, _batch: &CommitBatch) -> SimResult<()> {
            Err(SimError::Sink("disk full".into()))
        }
    }

    /// Rejects the first commit, then collects.
    #[derive(Default)]
    struct FailOnce {
        failed: bool,
        inner:  CollectingObserver,
    }

    impl SimObserver for FailOnce {
        fn on_commit(&mut self, batch: &CommitBatch) -> SimResult<()> {
            if !self.failed {
                self.failed = true;
                return Err(SimError::Sink("disk full".into()));
            }
            self.inner.on_commit(batch)
        }
    }

    #[test]
    fn sink_failure_aborts_the_run() {
        let mut sim = build(config(3), Provider::mock());
        let err = sim.run(&mut FailingSink).unwrap_err();
        assert!(matches!(err, SimError::Sink(ref m) if m == "disk full"));
        assert_eq!(sim.tick(), Tick(0));
    }

    #[test]
    fn rejected_commit_applies_nothing() {
        let mut sim = build(config(3), Provider::mock());
        sim.step(&mut NoopObserver).unwrap();

        let holdings = sim.agents().holdings.clone();
        let affect = sim.agents().affect.clone();
        let revisions: Vec<u64> = sim.graphs().iter().map(|g| g.revision()).collect();
        let pending = sim.router().pending_len();
        assert!(pending > 0);

        let mut obs = FailOnce::default();
        assert!(matches!(sim.step(&mut obs), Err(SimError::Sink(_))));
        assert_eq!(sim.tick(), Tick(1));
        assert_eq!(sim.agents().holdings, holdings);
        assert_eq!(sim.agents().affect, affect);
        assert_eq!(sim.graphs().iter().map(|g| g.revision()).collect::<Vec<_>>(), revisions);
        assert_eq!(sim.router().pending_len(), pending);

        // The retry commits tick 1 once, exactly as an undisturbed run does.
        sim.step(&mut obs).unwrap();
        let mut reference = build(config(3), Provider::mock());
        let mut expected = CollectingObserver::default();
        reference.step(&mut NoopObserver).unwrap();
        reference.step(&mut expected).unwrap();
        assert_eq!(obs.inner.batches, expected.batches);
        assert_eq!(sim.tick(), Tick(2));
    }

    #[test]
    fn provider_calls_carry_the_persona_hash() {
        let mut sim = build(config(2), Provider::mock());
        let mut obs = CollectingObserver::default();
        sim.run(&mut obs).unwrap();
        let expected = canonical_hash(&Persona::default()).unwrap().to_string();
        let calls: Vec<_> = obs.batches.iter().flat_map(|b| &b.provider_calls).collect();
        assert!(calls.iter().any(|c| c.phase == "interpret"));
        assert!(calls.iter().all(|c| c.persona_hash == expected));
    }
}

// ── Cancellation ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod cancellation {
    use crv_agent::{AgentStoreBuilder, TokenCatalog};
    use crv_cognition::Provider;
    use crv_core::{RunConfig, Tick};

    use super::helpers::*;
    use crate::{CancelFlag, CollectingObserver, SimBuilder, SimObserver, TickOutcome, TickPhase};

    /// Raises the flag on entering `at` during tick `tick`.
    struct CancelAt {
        flag:  CancelFlag,
        tick:  Tick,
        at:    TickPhase,
        inner: CollectingObserver,
    }

    impl SimObserver for CancelAt {
        fn on_phase(&mut self, tick: Tick, phase: TickPhase) {
            if tick == self.tick && phase == self.at {
                self.flag.cancel();
            }
        }

        fn on_commit(&mut self, batch: &crate::CommitBatch) -> crate::SimResult<()> {
            self.inner.on_commit(batch)
        }

        fn on_cancelled(&mut self, tick: Tick, phase: TickPhase) {
            self.inner.on_cancelled(tick, phase);
        }
    }

    #[test]
    fn cancelled_tick_leaves_no_trace() {
        for at in [TickPhase::Interpret, TickPhase::Decide, TickPhase::Act] {
            let mut reference = build(config(4), Provider::mock());
            let mut ref_obs = CollectingObserver::default();
            reference.run(&mut ref_obs).unwrap();

            let mut sim = build(config(4), Provider::mock());
            let mut obs = CancelAt {
                flag:  sim.cancel_flag(),
                tick:  Tick(1),
                at,
                inner: CollectingObserver::default(),
            };
            let summary = sim.run(&mut obs).unwrap();
            assert_eq!(summary.cancelled, Some(next_phase(at)));
            assert_eq!(summary.final_tick, Tick(1));
            assert_eq!(obs.inner.cancelled, vec![(Tick(1), next_phase(at))]);

            sim.cancel_flag().reset();
            obs.tick = Tick(99);
            sim.run(&mut obs).unwrap();
            assert_eq!(obs.inner.batches, ref_obs.batches, "cancel at {at}");
        }
    }

    #[test]
    fn raised_flag_stops_before_any_work() {
        let mut sim = build(config(3), Provider::mock());
        sim.cancel_flag().cancel();
        let mut obs = CollectingObserver::default();
        let out = sim.step(&mut obs).unwrap();
        assert_eq!(out, TickOutcome::Cancelled { tick: Tick(0), phase: TickPhase::TickStart });
        assert!(out.is_cancelled());
        assert!(obs.batches.is_empty());
        assert_eq!(sim.tick(), Tick(0));
    }

    #[test]
    fn builder_flag_is_shared() {
        let (store, rngs) = AgentStoreBuilder::new(2, 0).build().unwrap();
        let flag = CancelFlag::new();
        let mut sim = SimBuilder::new(RunConfig::new(0, 5), store, rngs, TokenCatalog::new(), Provider::mock())
            .cancel_flag(flag.clone())
            .build()
            .unwrap();
        flag.cancel();
        let summary = sim.run(&mut CollectingObserver::default()).unwrap();
        assert_eq!(summary.ticks_committed, 0);
        assert_eq!(summary.cancelled, Some(TickPhase::TickStart));
    }

    /// The flag raised while entering `p` is seen at the next boundary.
    fn next_phase(p: TickPhase) -> TickPhase {
        let i = TickPhase::ALL.iter().position(|x| *x == p).unwrap();
        TickPhase::ALL[i + 1]
    }
}
