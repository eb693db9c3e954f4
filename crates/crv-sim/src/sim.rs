//! The `Sim` struct and its barrier tick loop.

use tracing::{debug, info, warn};

use crv_agent::{AgentRngs, AgentStore, TokenCatalog};
use crv_cognition::{
    AgentView, CognitionProvider, EstimateSource, EvaluateRequest, OwnerStatus, PeerAlignment,
    ProviderError, ScenarioContext, fallback_estimate, fallback_interpretation,
};
use crv_core::{Affect, AgentId, AgentRng, ContextHash, RunConfig, Tick, TokenId};
use crv_decision::{Decision, TokenEstimate, decide, generate_candidates};
use crv_graph::{EdgeKey, RepresentationGraph, RepresentationPatch};
use crv_router::{EventEnvelope, EventRouter, Payload, RoutedBatch, Scope};
use crv_valuation::{Readout, readout_all};

use crate::{
    CancelFlag, CommitBatch, DecisionRow, EditRejectionRow, EventRow, IdentityEdgeRow,
    ProviderCallRow, RunSummary, ScenarioRow, SimObserver, SimResult, TickOutcome, TickPhase,
    TickReport,
};

/// Mean peer stance beyond this is aligned/misaligned.
const PEER_ALIGNMENT_THRESHOLD: f64 = 0.1;

/// What an agent last saw, as of the end of the previous tick.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct LastSeen {
    scope: Option<&'static str>,
    other: Option<AgentId>,
}

// ── Tick buffer ───────────────────────────────────────────────────────────────

/// Everything a tick computes before COMMIT.  Dropped unapplied on cancel.
struct TickBuffer {
    bucket:         u64,
    patches:        Vec<Vec<RepresentationPatch>>,
    affect:         Vec<Option<Affect>>,
    staged:         Vec<(AgentId, RepresentationGraph)>,
    decisions:      Vec<Decision>,
    rngs:           Vec<(AgentId, AgentRng)>,
    scenarios:      Vec<ScenarioRow>,
    provider_calls: Vec<ProviderCallRow>,
    rejections:     Vec<EditRejectionRow>,
    routed:         RoutedBatch,
    report:         TickReport,
}

impl TickBuffer {
    fn new(tick: Tick, bucket: u64, agent_count: usize) -> Self {
        Self {
            bucket,
            patches:        vec![Vec::new(); agent_count],
            affect:         vec![None; agent_count],
            staged:         Vec::new(),
            decisions:      Vec::with_capacity(agent_count),
            rngs:           Vec::with_capacity(agent_count),
            scenarios:      Vec::new(),
            provider_calls: Vec::new(),
            rejections:     Vec::new(),
            routed:         RoutedBatch::default(),
            report:         TickReport { tick, ..TickReport::default() },
        }
    }
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The barrier scheduler.
///
/// One call to [`step`](Self::step) runs
///
/// ```text
/// TickStart → Route → Interpret → PatchApply → Value → Decide → Act → Commit
/// ```
///
/// for every agent.  VALUE and DECIDE read only the graphs, affect and
/// holdings committed at the end of the previous tick; PATCH_APPLY writes
/// into staged clones.  Everything lands at once in COMMIT, after which the
/// tick advances.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<P: CognitionProvider> {
    pub(crate) config:           RunConfig,
    pub(crate) tick:             Tick,
    pub(crate) agents:           AgentStore,
    pub(crate) rngs:             AgentRngs,
    pub(crate) tokens:           TokenCatalog,
    pub(crate) graphs:           Vec<RepresentationGraph>,
    pub(crate) router:           EventRouter,
    pub(crate) provider:         P,
    pub(crate) cancel:           CancelFlag,
    pub(crate) seen:             Vec<LastSeen>,
    /// Canonical hash of each agent's persona.
    pub(crate) persona_hashes:   Vec<ContextHash>,
    /// Every graph is written out at the first commit.
    pub(crate) baseline_pending: bool,
    #[cfg(feature = "parallel")]
    pub(crate) pool:             Option<rayon::ThreadPool>,
}

impl<P: CognitionProvider> Sim<P> {
    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn agents(&self) -> &AgentStore {
        &self.agents
    }

    pub fn tokens(&self) -> &TokenCatalog {
        &self.tokens
    }

    /// The committed graph of `agent`.
    pub fn graph(&self, agent: AgentId) -> &RepresentationGraph {
        &self.graphs[agent.index()]
    }

    pub fn graphs(&self) -> &[RepresentationGraph] {
        &self.graphs
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    // ── Running ───────────────────────────────────────────────────────────

    /// Run from the current tick to `config.end_tick()`, stopping early on
    /// cancellation.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<RunSummary> {
        info!(
            target: "crv_sim",
            seed = self.config.seed,
            agents = self.agents.count,
            tokens = self.tokens.len(),
            provider = self.provider.name(),
            total_ticks = self.config.total_ticks,
            "run started"
        );
        let end = self.config.end_tick();
        let mut summary = RunSummary::default();
        while self.tick < end {
            match self.step(observer)? {
                TickOutcome::Committed(_) => summary.ticks_committed += 1,
                TickOutcome::Cancelled { phase, .. } => {
                    summary.cancelled = Some(phase);
                    break;
                }
            }
        }
        summary.final_tick = self.tick;
        observer.on_sim_end(self.tick)?;
        info!(
            target: "crv_sim",
            final_tick = self.tick.0,
            committed = summary.ticks_committed,
            cancelled = summary.cancelled.is_some(),
            "run finished"
        );
        Ok(summary)
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`).
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<RunSummary> {
        let mut summary = RunSummary::default();
        for _ in 0..n {
            match self.step(observer)? {
                TickOutcome::Committed(_) => summary.ticks_committed += 1,
                TickOutcome::Cancelled { phase, .. } => {
                    summary.cancelled = Some(phase);
                    break;
                }
            }
        }
        summary.final_tick = self.tick;
        Ok(summary)
    }

    /// Execute one full tick.
    pub fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<TickOutcome> {
        let now = self.tick;
        observer.on_tick_start(now);

        macro_rules! boundary {
            ($phase:expr) => {{
                let phase = $phase;
                if self.cancel.is_cancelled() {
                    debug!(target: "crv_sim", tick = now.0, phase = %phase, "tick cancelled");
                    observer.on_cancelled(now, phase);
                    return Ok(TickOutcome::Cancelled { tick: now, phase });
                }
                observer.on_phase(now, phase);
                debug!(target: "crv_sim", tick = now.0, phase = %phase, "phase");
            }};
        }

        boundary!(TickPhase::TickStart);
        let bucket = now.bucket(self.config.tick_bucket_size);
        let mut buf = TickBuffer::new(now, bucket, self.agents.count);

        boundary!(TickPhase::Route);
        let inbox = self.route(now);
        buf.report.delivered = inbox.iter().map(Vec::len).sum();

        boundary!(TickPhase::Interpret);
        self.interpret(now, &inbox, &mut buf);
        drop(inbox);

        boundary!(TickPhase::PatchApply);
        self.patch_apply(now, &mut buf);

        boundary!(TickPhase::Value);
        let readouts = self.value();

        boundary!(TickPhase::Decide);
        self.decide(now, &readouts, &mut buf)?;

        boundary!(TickPhase::Act);
        self.act(now, &mut buf);

        boundary!(TickPhase::Commit);
        let report = self.commit(now, buf, observer)?;
        Ok(TickOutcome::Committed(report))
    }

    // ── Phases ────────────────────────────────────────────────────────────

    /// Observations due now, bucketed by recipient in routing order.
    fn route(&self, now: Tick) -> Vec<Vec<&EventEnvelope>> {
        let mut inbox = vec![Vec::new(); self.agents.count];
        for env in self.router.due(now) {
            if let Some(r) = env.recipient().filter(|r| self.agents.contains(*r)) {
                inbox[r.index()].push(env);
            }
        }
        inbox
    }

    /// Sequential provider calls in ascending agent order.
    fn interpret(&self, now: Tick, inbox: &[Vec<&EventEnvelope>], buf: &mut TickBuffer) {
        for agent in self.agents.agent_ids() {
            let i = agent.index();
            let observations = &inbox[i];
            if observations.is_empty() {
                continue;
            }
            let view = AgentView {
                agent,
                tick: now,
                persona: &self.agents.persona[i],
                affect: self.agents.affect[i],
                group: self.agents.group[i],
                graph: &self.graphs[i],
            };

            let mut affect = view.affect;
            for env in observations {
                let (outcome, error) = match self.provider.interpret(&view, env) {
                    Ok(out) if out.interpretation.is_valid() => (out, None),
                    Ok(out) => (
                        fallback_interpretation(self.config.interpret_fallback, &view, env),
                        Some(ProviderError::InvalidOutput(format!(
                            "salience {} or appraisal out of range",
                            out.interpretation.salience
                        ))),
                    ),
                    Err(e) => {
                        (fallback_interpretation(self.config.interpret_fallback, &view, env), Some(e))
                    }
                };
                let source = if error.is_some() {
                    self.provider_failure(now, agent, "interpret", error.as_ref(), buf);
                    EstimateSource::Fallback
                } else {
                    EstimateSource::Computed
                };
                buf.provider_calls.push(ProviderCallRow {
                    bucket:       buf.bucket,
                    tick:         now.0,
                    agent_id:     agent.0,
                    provider:     self.provider.name().to_owned(),
                    phase:        "interpret".to_owned(),
                    persona_hash: self.persona_hashes[i].to_string(),
                    context_hash: None,
                    envelope_id:  Some(env.id().0),
                    source:       source.as_str().to_owned(),
                    error:        error.map(|e| e.to_string()),
                });

                let interp = &outcome.interpretation;
                if let Some(appraisal) = &interp.appraisal {
                    affect = affect.absorb(appraisal, interp.salience, self.config.affect_rate);
                }
                if let Some(patch) = outcome.patch.filter(|p| !p.is_empty()) {
                    if let Some(energy) = patch.energy_delta {
                        debug!(target: "crv_sim", tick = now.0, agent = agent.0, energy, "patch energy");
                    }
                    buf.patches[i].push(patch);
                }
            }
            if affect != view.affect {
                buf.affect[i] = Some(affect);
            }
        }
    }

    /// Apply patches to staged clones of the committed graphs.
    fn patch_apply(&self, now: Tick, buf: &mut TickBuffer) {
        let work: Vec<(AgentId, RepresentationGraph, Vec<RepresentationPatch>)> = buf
            .patches
            .iter_mut()
            .enumerate()
            .filter(|(_, p)| !p.is_empty())
            .map(|(i, p)| (AgentId(i as u32), self.graphs[i].clone(), std::mem::take(p)))
            .collect();
        if work.is_empty() {
            return;
        }

        let apply = |(agent, mut graph, patches): (AgentId, RepresentationGraph, Vec<RepresentationPatch>)| {
            let mut applied = 0;
            let mut rejected = Vec::new();
            for (p, patch) in patches.iter().enumerate() {
                let report = graph.apply_patch(patch);
                applied += report.applied;
                rejected.extend(
                    report.rejected.into_iter().map(|(e, err)| (p, e, patch.edits[e].operation(), err)),
                );
            }
            (agent, graph, applied, rejected)
        };

        #[cfg(not(feature = "parallel"))]
        let results: Vec<_> = work.into_iter().map(apply).collect();

        #[cfg(feature = "parallel")]
        let results: Vec<_> = self.install(|| {
            use rayon::prelude::*;
            work.into_par_iter().map(apply).collect()
        });

        for (agent, graph, applied, rejected) in results {
            buf.report.edits_applied += applied;
            buf.report.edits_rejected += rejected.len();
            for (patch, index, operation, err) in rejected {
                warn!(
                    target: "crv_sim",
                    tick = now.0,
                    agent = agent.0,
                    patch,
                    edit = index,
                    operation,
                    reason = err.reason(),
                    detail = %err,
                    "edit rejected"
                );
                buf.rejections.push(EditRejectionRow {
                    bucket:      buf.bucket,
                    tick:        now.0,
                    agent_id:    agent.0,
                    patch_index: patch as u32,
                    edit_index:  index as u32,
                    operation:   operation.to_owned(),
                    reason:      err.reason().to_owned(),
                    detail:      err.to_string(),
                });
            }
            buf.staged.push((agent, graph));
        }
    }

    /// Readouts of every token for every agent over the committed graphs.
    fn value(&self) -> Vec<Vec<Readout>> {
        let tokens: Vec<TokenId> = self.tokens.ids().collect();
        let params = &self.config.valuation;
        let graphs = &self.graphs;
        let read = |g: &RepresentationGraph| readout_all(g, tokens.iter().copied(), params);

        #[cfg(not(feature = "parallel"))]
        {
            graphs.iter().map(read).collect()
        }

        #[cfg(feature = "parallel")]
        {
            self.install(|| {
                use rayon::prelude::*;
                graphs.par_iter().map(read).collect()
            })
        }
    }

    /// Evaluate, score and choose, sequentially in ascending agent order.
    fn decide(&self, now: Tick, readouts: &[Vec<Readout>], buf: &mut TickBuffer) -> SimResult<()> {
        for agent in self.agents.agent_ids() {
            let i = agent.index();
            let persona = &self.agents.persona[i];
            let mut estimates = Vec::with_capacity(readouts[i].len());

            for r in &readouts[i] {
                let scenario = self.scenario(now, agent, r);
                let context_hash = scenario.hash()?;
                let req = EvaluateRequest {
                    context_hash,
                    persona: persona.clone(),
                    persona_hash: self.persona_hashes[i],
                    model: self.config.model_label.clone(),
                    scenario,
                };
                let (estimate, error) = match self.provider.evaluate(&req) {
                    Ok(est) if est.value.is_finite() => (est, None),
                    Ok(est) => (
                        fallback_estimate(&req),
                        Some(ProviderError::InvalidOutput(format!("non-finite estimate {}", est.value))),
                    ),
                    Err(e) => (fallback_estimate(&req), Some(e)),
                };
                if error.is_some() {
                    self.provider_failure(now, agent, "evaluate", error.as_ref(), buf);
                }
                buf.provider_calls.push(ProviderCallRow {
                    bucket:       buf.bucket,
                    tick:         now.0,
                    agent_id:     agent.0,
                    provider:     self.provider.name().to_owned(),
                    phase:        "evaluate".to_owned(),
                    persona_hash: self.persona_hashes[i].to_string(),
                    context_hash: Some(context_hash.to_string()),
                    envelope_id:  None,
                    source:       estimate.source.as_str().to_owned(),
                    error:        error.map(|e| e.to_string()),
                });
                buf.scenarios.push(ScenarioRow::new(
                    &req.scenario,
                    &context_hash,
                    estimate.value,
                    estimate.source,
                    buf.bucket,
                ));
                estimates.push(TokenEstimate { token: r.token, value: estimate.value });
            }

            let scope = self.agents.group[i].map_or(Scope::Public, Scope::Group);
            let held = &self.agents.holdings[i];
            let candidates = generate_candidates(
                &estimates,
                |t| held.contains(&t),
                &scope,
                self.config.valuation.v_base,
                &self.config.decision,
            );

            let mut rng = self.rngs.inner[i].clone();
            match decide(agent, now, candidates, estimates, &self.config.decision, &mut rng) {
                Ok(decision) => {
                    if decision.abstained() {
                        buf.report.abstentions += 1;
                    }
                    buf.decisions.push(decision);
                    buf.rngs.push((agent, rng));
                }
                Err(e) => warn!(
                    target: "crv_sim",
                    tick = now.0,
                    agent = agent.0,
                    reason = %e,
                    "decision rejected"
                ),
            }
        }
        Ok(())
    }

    /// Route the chosen actions without touching the inbox.
    fn act(&self, now: Tick, buf: &mut TickBuffer) {
        let intents: Vec<_> = buf
            .decisions
            .iter()
            .filter_map(|d| d.chosen_candidate().and_then(|c| c.to_intent(d.agent)))
            .collect();
        buf.routed = self.router.plan(&intents, now, &self.agents);
    }

    /// Build the tick's rows, hand them to the observer, then apply the
    /// buffer and advance the tick.
    ///
    /// Nothing is applied until the observer accepts the batch, so a failing
    /// sink leaves the tick exactly as uncommitted as a cancellation does.
    fn commit<O: SimObserver>(
        &mut self,
        now: Tick,
        buf: TickBuffer,
        observer: &mut O,
    ) -> SimResult<TickReport> {
        let TickBuffer {
            bucket,
            affect,
            staged,
            decisions,
            rngs,
            scenarios,
            provider_calls,
            rejections,
            routed,
            mut report,
            ..
        } = buf;
        let mut batch = CommitBatch { tick: now, bucket, ..CommitBatch::default() };

        // ── Events ────────────────────────────────────────────────────────
        for env in &routed.actions {
            batch.events.push(EventRow::from_envelope(env, now, bucket));
        }
        for env in &self.router.delivering(now) {
            batch.events.push(EventRow::from_envelope(env, now, bucket));
        }
        report.actions_executed = routed.executed().count();
        report.actions_rejected = routed.rejected().count();

        // ── Graphs ────────────────────────────────────────────────────────
        let changed: Vec<(AgentId, RepresentationGraph)> = staged
            .into_iter()
            .filter(|(agent, graph)| graph.revision() != self.graphs[agent.index()].revision())
            .collect();
        let mut post: Vec<&RepresentationGraph> = self.graphs.iter().collect();
        let mut dirty = vec![self.baseline_pending; self.agents.count];
        for (agent, graph) in &changed {
            post[agent.index()] = graph;
            dirty[agent.index()] = true;
        }
        for (i, graph) in post.iter().enumerate().filter(|(i, _)| dirty[*i]) {
            let observer_id = AgentId(i as u32);
            batch
                .identity_edges
                .extend(graph.iter().map(|e| IdentityEdgeRow::from_edge(observer_id, e, now, bucket)));
        }

        // ── Rows ──────────────────────────────────────────────────────────
        batch.decisions = decisions.iter().map(|d| DecisionRow::from_decision(d, bucket)).collect();
        batch.scenarios = scenarios;
        batch.provider_calls = provider_calls;
        batch.rejections = rejections;

        observer.on_commit(&batch)?;

        // ── Holdings ──────────────────────────────────────────────────────
        for env in routed.executed() {
            let holdings = &mut self.agents.holdings[env.origin().actor.index()];
            match env.payload() {
                Payload::AcquireToken { token } => {
                    holdings.insert(*token);
                }
                Payload::RelinquishToken { token } => {
                    holdings.remove(token);
                }
                _ => {}
            }
        }

        // ── Inbox ─────────────────────────────────────────────────────────
        for env in self.router.commit(now, routed) {
            if let Some(r) = env.recipient().filter(|r| self.agents.contains(*r)) {
                let seen = &mut self.seen[r.index()];
                seen.scope = Some(env.scope().family());
                if env.origin().actor != r {
                    seen.other = Some(env.origin().actor);
                }
            }
        }

        // ── Graphs, affect and RNG state ──────────────────────────────────
        for (agent, graph) in changed {
            self.graphs[agent.index()] = graph;
        }
        self.baseline_pending = false;
        for (i, a) in affect.into_iter().enumerate() {
            if let Some(a) = a {
                self.agents.affect[i] = a;
            }
        }
        for (agent, rng) in rngs {
            self.rngs.inner[agent.index()] = rng;
        }

        debug!(
            target: "crv_sim",
            tick = now.0,
            events = batch.events.len(),
            edges = batch.identity_edges.len(),
            decisions = batch.decisions.len(),
            rejections = batch.rejections.len(),
            "committed"
        );
        self.tick = now.next();
        Ok(report)
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    /// The valuation context of `r.token` for `agent`, from committed state.
    fn scenario(&self, now: Tick, agent: AgentId, r: &Readout) -> ScenarioContext {
        let i = agent.index();
        let graph = &self.graphs[i];
        let group = self.agents.group[i];

        let peer_mean = group.and_then(|g| {
            let stances: Vec<f64> = self
                .agents
                .group_members(g)
                .filter(|&p| p != agent)
                .filter_map(|p| graph.weight(&EdgeKey::agent_to_object(p, r.token)))
                .collect();
            (!stances.is_empty()).then(|| stances.iter().sum::<f64>() / stances.len() as f64)
        });

        ScenarioContext {
            tick:           now,
            agent,
            token:          r.token,
            token_kind:     self.tokens.get(r.token).map(|s| s.kind.clone()).unwrap_or_default(),
            owner_status:   OwnerStatus::from_held(self.agents.holds(agent, r.token)),
            peer_alignment: PeerAlignment::from_mean(peer_mean, PEER_ALIGNMENT_THRESHOLD),
            group,
            last_scope:     self.seen[i].scope.map(str::to_owned),
            affect_index:   self.agents.affect[i].index(),
            salient_other:  self.seen[i].other,
            readout:        r.value,
        }
    }

    fn provider_failure(
        &self,
        now: Tick,
        agent: AgentId,
        phase: &'static str,
        error: Option<&ProviderError>,
        buf: &mut TickBuffer,
    ) {
        buf.report.provider_failures += 1;
        warn!(
            target: "crv_sim",
            tick = now.0,
            agent = agent.0,
            provider = self.provider.name(),
            phase,
            reason = error.map_or("unknown", ProviderError::reason),
            detail = %error.map(ToString::to_string).unwrap_or_default(),
            "provider_failure"
        );
    }

    #[cfg(feature = "parallel")]
    fn install<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }
}
