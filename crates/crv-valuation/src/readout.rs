#[cfg(not(feature = "fx-hash"))]
use std::collections::HashMap;

#[cfg(feature = "fx-hash")]
use rustc_hash::FxHashMap as HashMap;

use serde::{Deserialize, Serialize};

use crv_core::{AgentId, TokenId, ValuationParams};
use crv_graph::{EdgeKey, EdgeKind, RepresentationGraph};

/// Unscaled sums behind one readout.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Terms {
    pub direct:    f64,
    pub triad:     f64,
    pub mediated:  f64,
    pub spillover: f64,
}

/// One valuation of one token by one observer.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Readout {
    pub token:   TokenId,
    /// Bounded value, strictly inside `(v_base - phi, v_base + phi)`.
    pub value:   f64,
    /// Pre-squash utility `U`; zero when the raw sum was not finite.
    pub utility: f64,
    pub terms:   Terms,
}

// ── GraphView ─────────────────────────────────────────────────────────────────

/// Per-agent lookups over a graph, built once and shared by every token
/// readout of that graph.
///
/// Sums iterate the graph's arena; the maps are only used for point lookups,
/// so results never depend on hash order.
pub struct GraphView<'g> {
    graph:       &'g RepresentationGraph,
    /// `a(j)`
    self_agent:  HashMap<AgentId, f64>,
    /// `u+(j) - u-(j)`
    agent_net:   HashMap<AgentId, f64>,
    s_pos:       f64,
    s_neg:       f64,
}

impl<'g> GraphView<'g> {
    pub fn new(graph: &'g RepresentationGraph) -> Self {
        let mut self_agent = HashMap::default();
        let mut agent_net: HashMap<AgentId, f64> = HashMap::default();
        for e in graph.iter() {
            match e.key.kind {
                EdgeKind::SelfToAgent => {
                    if let Some(j) = e.key.object {
                        self_agent.insert(j.agent(), e.weight);
                    }
                }
                EdgeKind::AgentToPositiveValence => {
                    if let Some(j) = e.key.subject {
                        *agent_net.entry(j.agent()).or_insert(0.0) += e.weight;
                    }
                }
                EdgeKind::AgentToNegativeValence => {
                    if let Some(j) = e.key.subject {
                        *agent_net.entry(j.agent()).or_insert(0.0) -= e.weight;
                    }
                }
                _ => {}
            }
        }
        Self {
            graph,
            self_agent,
            agent_net,
            s_pos: graph.weight_or_zero(&EdgeKey::self_positive()),
            s_neg: graph.weight_or_zero(&EdgeKey::self_negative()),
        }
    }

    #[inline]
    fn a(&self, j: AgentId) -> f64 {
        self.self_agent.get(&j).copied().unwrap_or(0.0)
    }

    #[inline]
    fn u_net(&self, j: AgentId) -> f64 {
        self.agent_net.get(&j).copied().unwrap_or(0.0)
    }

    #[inline]
    fn s(&self, o: TokenId) -> f64 {
        self.graph.weight_or_zero(&EdgeKey::self_to_object(self.graph.owner(), o))
    }

    #[inline]
    fn r_net(&self, o: TokenId) -> f64 {
        self.graph.weight_or_zero(&EdgeKey::object_positive(o))
            - self.graph.weight_or_zero(&EdgeKey::object_negative(o))
    }

    #[inline]
    fn b(&self, j: AgentId, o: TokenId) -> f64 {
        self.graph.weight_or_zero(&EdgeKey::agent_to_object(j, o))
    }

    /// Raw (unscaled) term sums for token `o`.
    pub fn terms(&self, o: TokenId, params: &ValuationParams) -> Terms {
        let s_o = self.s(o);
        let direct = params.beta_self * s_o
            + params.beta_trace * self.r_net(o)
            + params.beta_anchor * (self.s_pos - self.s_neg) * s_o;

        let mut triad = 0.0;
        let mut mediated = 0.0;
        let mut spillover = 0.0;

        for e in self.graph.iter() {
            let key = &e.key;
            match key.kind {
                EdgeKind::AgentToObject if key.token == Some(o) => {
                    if let Some(j) = key.subject.map(|s| s.agent()) {
                        triad += (self.a(j) + self.u_net(j)) * e.weight;
                    }
                }
                EdgeKind::AgentToAgent => {
                    if let (Some(j), Some(k)) = (key.subject, key.object) {
                        mediated += self.a(j.agent()) * e.weight * self.b(k.agent(), o);
                    }
                }
                EdgeKind::AgentPairToObject if key.token == Some(o) => {
                    if let (Some(j), Some(k)) = (key.subject, key.related_agent) {
                        mediated += e.weight * (self.a(j.agent()) + self.a(k)) / 2.0;
                    }
                }
                EdgeKind::ObjectToObject => {
                    let (Some(x), Some(y)) = (key.subject, key.object) else { continue };
                    let other = if x.token() == o {
                        y.token()
                    } else if y.token() == o {
                        x.token()
                    } else {
                        continue;
                    };
                    spillover += e.weight * (self.s(other) + self.r_net(other));
                }
                _ => {}
            }
        }

        Terms { direct, triad, mediated, spillover }
    }

    pub fn readout(&self, o: TokenId, params: &ValuationParams) -> Readout {
        let terms = self.terms(o, params);
        let raw = terms.direct
            + params.alpha_triad * terms.triad
            + params.alpha_mediated * terms.mediated
            + params.alpha_oo * terms.spillover;
        let utility = if raw.is_finite() { raw } else { 0.0 };
        Readout { token: o, value: squash(utility, params), utility, terms }
    }
}

/// Valuation of `token` by the owner of `graph`.
pub fn readout(graph: &RepresentationGraph, token: TokenId, params: &ValuationParams) -> Readout {
    GraphView::new(graph).readout(token, params)
}

/// Valuations of every token in `tokens`, in the given order.
pub fn readout_all(
    graph: &RepresentationGraph,
    tokens: impl IntoIterator<Item = TokenId>,
    params: &ValuationParams,
) -> Vec<Readout> {
    let view = GraphView::new(graph);
    tokens.into_iter().map(|t| view.readout(t, params)).collect()
}

// ── Squash ────────────────────────────────────────────────────────────────────

/// `v_base + phi * tanh(gamma * u)`, pulled strictly inside the open band.
///
/// `tanh` saturates to exactly `±1.0` for large arguments, so the endpoints
/// are stepped one ulp inward.
fn squash(u: f64, params: &ValuationParams) -> f64 {
    let mut t = (params.gamma * u).tanh();
    if !t.is_finite() {
        t = 0.0;
    }
    let lo = params.v_base - params.phi;
    let hi = params.v_base + params.phi;
    let v = params.v_base + params.phi * t;
    if v >= hi {
        next_down(hi).max(params.v_base)
    } else if v <= lo {
        next_up(lo).min(params.v_base)
    } else {
        v
    }
}

fn next_down(x: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    if x == 0.0 {
        return -f64::from_bits(1);
    }
    let bits = x.to_bits();
    if x > 0.0 { f64::from_bits(bits - 1) } else { f64::from_bits(bits + 1) }
}

fn next_up(x: f64) -> f64 {
    -next_down(-x)
}
