//! The representation graph: a flat edge arena plus a key index.
//!
//! # Storage
//!
//! ```text
//! edges: Vec<Edge>              arena, iteration order
//! index: HashMap<EdgeKey, u32>  key → arena slot
//! ```
//!
//! New edges are pushed to the end of the arena.  Removal uses `swap_remove`
//! and re-points the index entry of the edge that moved.  Arena order is
//! therefore a pure function of the sequence of applied edits and never
//! depends on hash iteration order.

#[cfg(not(feature = "fx-hash"))]
use std::collections::HashMap;

#[cfg(feature = "fx-hash")]
use rustc_hash::FxHashMap as HashMap;

use serde::{Deserialize, Serialize};

use crv_core::AgentId;

use crate::{EdgeFilter, EdgeKey, EdgeKind, GraphEdit, GraphError, GraphResult, RepresentationPatch, Selector};

/// One weighted edge.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Edge {
    pub key:    EdgeKey,
    pub weight: f64,
}

impl Edge {
    /// `-1`/`0`/`1` for signed kinds, `None` for magnitude kinds.
    #[inline]
    pub fn sign(&self) -> Option<i8> {
        self.key.kind.sign_of(self.weight)
    }
}

/// Result of applying a patch: how many edits applied and which were
/// rejected (by position in the patch).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatchReport {
    pub applied:  usize,
    pub rejected: Vec<(usize, GraphError)>,
}

impl PatchReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

// ── RepresentationGraph ───────────────────────────────────────────────────────

/// An agent's identity/affect representation.
///
/// Cloning is the staging mechanism: the scheduler clones the committed graph,
/// applies a tick's patches to the clone and swaps it in at commit.
#[derive(Clone, Debug)]
pub struct RepresentationGraph {
    owner:    AgentId,
    edges:    Vec<Edge>,
    index:    HashMap<EdgeKey, u32>,
    /// Bumped on every mutation that changes a weight or the edge set.
    revision: u64,
}

impl RepresentationGraph {
    pub fn new(owner: AgentId) -> Self {
        Self {
            owner,
            edges: Vec::new(),
            index: HashMap::default(),
            revision: 0,
        }
    }

    #[inline]
    pub fn owner(&self) -> AgentId {
        self.owner
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Mutation counter.  Two graphs cloned from each other hold the same
    /// edges exactly when their revisions agree.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Weight of `key`, if the edge exists.
    pub fn weight(&self, key: &EdgeKey) -> Option<f64> {
        self.index.get(key).map(|&slot| self.edges[slot as usize].weight)
    }

    /// Weight of `key`, or `0.0` when absent.
    #[inline]
    pub fn weight_or_zero(&self, key: &EdgeKey) -> f64 {
        self.weight(key).unwrap_or(0.0)
    }

    /// All edges in arena order.
    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.key.kind == kind)
    }

    pub fn query<'a>(&'a self, filter: &'a EdgeFilter) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| filter.matches(&e.key))
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Validate and apply one edit.  Returns the number of edges touched.
    ///
    /// On `Err` the graph is unchanged.
    pub fn apply(&mut self, edit: &GraphEdit) -> GraphResult<usize> {
        edit.validate()?;
        Ok(match edit {
            GraphEdit::Set { key, weight } => {
                self.upsert(*key, |_| *weight);
                1
            }
            GraphEdit::Adjust { key, delta } => {
                let kind = key.kind;
                self.upsert(*key, |old| kind.clamp(old.unwrap_or(0.0) + delta));
                1
            }
            GraphEdit::Decay { selector, lambda } => self.decay(selector, *lambda),
            GraphEdit::Remove { key } => usize::from(self.remove(key)),
        })
    }

    /// Apply every edit of `patch` in order.  Invalid edits are skipped and
    /// reported; valid ones still apply.
    pub fn apply_patch(&mut self, patch: &RepresentationPatch) -> PatchReport {
        let mut report = PatchReport::default();
        for (i, edit) in patch.edits.iter().enumerate() {
            match self.apply(edit) {
                Ok(_) => report.applied += 1,
                Err(e) => report.rejected.push((i, e)),
            }
        }
        report
    }

    fn upsert(&mut self, key: EdgeKey, f: impl FnOnce(Option<f64>) -> f64) {
        match self.index.get(&key) {
            Some(&slot) => {
                let edge = &mut self.edges[slot as usize];
                let new = f(Some(edge.weight));
                if new != edge.weight {
                    edge.weight = new;
                    self.revision += 1;
                }
            }
            None => {
                let slot = self.edges.len() as u32;
                self.edges.push(Edge { key, weight: f(None) });
                self.index.insert(key, slot);
                self.revision += 1;
            }
        }
    }

    fn decay(&mut self, selector: &Selector, lambda: f64) -> usize {
        let factor = (-lambda).exp();
        let mut touched = 0;
        let mut changed = false;
        let mut scale = |edge: &mut Edge| {
            let new = edge.weight * factor;
            changed |= new != edge.weight;
            edge.weight = new;
            touched += 1;
        };
        match selector {
            Selector::Exact(key) => {
                if let Some(&slot) = self.index.get(key) {
                    scale(&mut self.edges[slot as usize]);
                }
            }
            Selector::AllOfKind(kind) => {
                self.edges.iter_mut().filter(|e| e.key.kind == *kind).for_each(scale);
            }
        }
        if changed {
            self.revision += 1;
        }
        touched
    }

    fn remove(&mut self, key: &EdgeKey) -> bool {
        let Some(slot) = self.index.remove(key) else {
            return false;
        };
        let slot = slot as usize;
        self.edges.swap_remove(slot);
        if let Some(moved) = self.edges.get(slot) {
            self.index.insert(moved.key, slot as u32);
        }
        self.revision += 1;
        true
    }
}
