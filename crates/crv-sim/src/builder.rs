//! Fluent builder for constructing a [`Sim`].

use crv_agent::{AgentRngs, AgentStore, TokenCatalog};
use crv_cognition::CognitionProvider;
use crv_core::{AgentId, ENGINE_SCHEMA, RunConfig, Tick, canonical_hash};
use crv_graph::RepresentationGraph;
use crv_router::EventRouter;

use crate::{CancelFlag, Sim, SimError, SimResult};

/// Fluent builder for [`Sim<P>`].
///
/// # Required inputs
///
/// - [`RunConfig`]: seed, total ticks, coefficients, …
/// - [`AgentStore`] + [`AgentRngs`] from [`crv_agent::AgentStoreBuilder`]
/// - [`TokenCatalog`]: the tokens agents value and trade
/// - `P: CognitionProvider`
///
/// # Optional inputs
///
/// | Method               | Default                          |
/// |----------------------|----------------------------------|
/// | `.graphs(v)`         | One empty graph per agent        |
/// | `.cancel_flag(f)`    | A fresh, unraised flag           |
///
/// `build` is where incompatibilities surface: a provider whose schema does
/// not match the engine, mismatched lengths and invalid configuration all
/// fail here, before tick 0.
pub struct SimBuilder<P: CognitionProvider> {
    config:   RunConfig,
    agents:   AgentStore,
    rngs:     AgentRngs,
    tokens:   TokenCatalog,
    provider: P,
    graphs:   Option<Vec<RepresentationGraph>>,
    cancel:   Option<CancelFlag>,
}

impl<P: CognitionProvider> SimBuilder<P> {
    pub fn new(
        config:   RunConfig,
        agents:   AgentStore,
        rngs:     AgentRngs,
        tokens:   TokenCatalog,
        provider: P,
    ) -> Self {
        Self { config, agents, rngs, tokens, provider, graphs: None, cancel: None }
    }

    /// Supply initial graphs; index `i` must be owned by `AgentId(i)`.
    pub fn graphs(mut self, graphs: Vec<RepresentationGraph>) -> Self {
        self.graphs = Some(graphs);
        self
    }

    /// Share a cancellation flag with the caller.
    pub fn cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn build(self) -> SimResult<Sim<P>> {
        let agent_count = self.agents.count;

        self.config.validate().map_err(|e| SimError::Config(e.to_string()))?;

        let found = self.provider.schema_version();
        if !found.is_compatible() {
            return Err(SimError::VersionMismatch {
                provider: self.provider.name().to_owned(),
                expected: ENGINE_SCHEMA,
                found,
            });
        }

        if self.rngs.len() != agent_count {
            return Err(SimError::AgentCountMismatch {
                expected: agent_count,
                got:      self.rngs.len(),
                what:     "agent rngs",
            });
        }

        for (i, held) in self.agents.holdings.iter().enumerate() {
            if let Some(t) = held.iter().find(|t| !self.tokens.contains(**t)) {
                return Err(SimError::Config(format!("agent {i} holds unknown token {t}")));
            }
        }

        let graphs = match self.graphs {
            Some(g) => {
                if g.len() != agent_count {
                    return Err(SimError::AgentCountMismatch {
                        expected: agent_count,
                        got:      g.len(),
                        what:     "graphs",
                    });
                }
                if let Some((i, graph)) =
                    g.iter().enumerate().find(|(i, graph)| graph.owner() != AgentId(*i as u32))
                {
                    return Err(SimError::Config(format!(
                        "graph {i} is owned by {}",
                        graph.owner()
                    )));
                }
                g
            }
            None => (0..agent_count as u32).map(|i| RepresentationGraph::new(AgentId(i))).collect(),
        };

        let persona_hashes =
            self.agents.persona.iter().map(|p| canonical_hash(p)).collect::<Result<Vec<_>, _>>()?;

        #[cfg(feature = "parallel")]
        let pool = match self.config.num_threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| SimError::Config(format!("thread pool: {e}")))?,
            ),
            None => None,
        };

        Ok(Sim {
            tick:             Tick::ZERO,
            config:           self.config,
            agents:           self.agents,
            rngs:             self.rngs,
            tokens:           self.tokens,
            graphs,
            router:           EventRouter::new(),
            provider:         self.provider,
            cancel:           self.cancel.unwrap_or_default(),
            seen:             vec![Default::default(); agent_count],
            persona_hashes,
            baseline_pending: true,
            #[cfg(feature = "parallel")]
            pool,
        })
    }
}
