//! Offline policy table and the provider that reads it.
//!
//! # CSV format
//!
//! One row per elicited context.  Means are on the 1..7 Likert scale.
//!
//! ```csv
//! schema_version,token_kind,owner_status,peer_alignment,persona,model,value_mean,value_sd,sample_count
//! 0.1,Alpha,owned,aligned,default,mock,5.5,0.8,12
//! 0.1,Alpha,not_owned,misaligned,default,mock,2.25,1.1,12
//! ```
//!
//! Every row's `schema_version` must match the engine schema; the first
//! mismatch aborts the load with [`PolicyError::VersionMismatch`].  Duplicate
//! keys are rejected.
//!
//! # Value mapping
//!
//! A hit maps the Likert mean onto the valuation band:
//! `v_base + phi * (clamp(mean, 1, 7) - 4) / 3`.

use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crv_core::{ENGINE_SCHEMA, SchemaVersion, ValuationParams};
use crv_router::EventEnvelope;

use crate::{
    AgentView, CognitionProvider, EstimateSource, EvaluateRequest, InterpretOutcome, OwnerStatus,
    PeerAlignment, PolicyError, PolicyResult, ProviderError, ProviderResult, ValueEstimate, mock,
};

// ── Key / entry ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PolicyKey {
    pub token_kind:     String,
    pub owner_status:   OwnerStatus,
    pub peer_alignment: PeerAlignment,
    pub persona:        String,
    pub model:          String,
}

impl fmt::Display for PolicyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}|{}",
            self.token_kind, self.owner_status, self.peer_alignment, self.persona, self.model
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PolicyEntry {
    pub value_mean:   f64,
    pub value_sd:     f64,
    pub sample_count: u32,
}

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PolicyRecord {
    schema_version: String,
    token_kind:     String,
    owner_status:   String,
    peer_alignment: String,
    persona:        String,
    model:          String,
    value_mean:     f64,
    value_sd:       f64,
    sample_count:   u32,
}

// ── PolicyTable ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct PolicyTable {
    entries: HashMap<PolicyKey, PolicyEntry>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one entry; a key may appear only once.
    pub fn insert(&mut self, key: PolicyKey, entry: PolicyEntry) -> PolicyResult<()> {
        if self.entries.contains_key(&key) {
            return Err(PolicyError::Duplicate(key.to_string()));
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    pub fn get(&self, key: &PolicyKey) -> Option<&PolicyEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a table from a CSV file.
    pub fn load_csv(path: &Path) -> PolicyResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::load_reader(file)
    }

    /// Like [`load_csv`](Self::load_csv) but accepts any `Read` source.
    pub fn load_reader<R: Read>(reader: R) -> PolicyResult<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut table = PolicyTable::new();
        for (i, result) in csv_reader.deserialize::<PolicyRecord>().enumerate() {
            let row = result.map_err(|e| PolicyError::Parse(e.to_string()))?;
            let found: SchemaVersion = row
                .schema_version
                .trim()
                .parse()
                .map_err(|_| PolicyError::Parse(format!("row {i}: bad schema_version `{}`", row.schema_version)))?;
            if !found.is_compatible() {
                return Err(PolicyError::VersionMismatch { expected: ENGINE_SCHEMA, found });
            }
            let owner_status: OwnerStatus = row
                .owner_status
                .parse()
                .map_err(|e: ProviderError| PolicyError::Parse(format!("row {i}: {e}")))?;
            let peer_alignment: PeerAlignment = row
                .peer_alignment
                .parse()
                .map_err(|e: ProviderError| PolicyError::Parse(format!("row {i}: {e}")))?;
            if !row.value_mean.is_finite() || !row.value_sd.is_finite() {
                return Err(PolicyError::Parse(format!("row {i}: non-finite value")));
            }
            table.insert(
                PolicyKey {
                    token_kind: row.token_kind,
                    owner_status,
                    peer_alignment,
                    persona: row.persona,
                    model: row.model,
                },
                PolicyEntry {
                    value_mean:   row.value_mean,
                    value_sd:     row.value_sd,
                    sample_count: row.sample_count,
                },
            )?;
        }
        Ok(table)
    }
}

// ── PolicyLookup ──────────────────────────────────────────────────────────────

/// Provider backed by a [`PolicyTable`].
///
/// Interpretation uses the mock rule set.  A missing key is a
/// [`ProviderError::MissingPolicy`], which the engine resolves through the
/// readout fallback.
pub struct PolicyLookup {
    table:  PolicyTable,
    v_base: f64,
    phi:    f64,
}

impl PolicyLookup {
    pub fn new(table: PolicyTable, params: &ValuationParams) -> Self {
        Self { table, v_base: params.v_base, phi: params.phi }
    }

    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    pub fn key_for(req: &EvaluateRequest) -> PolicyKey {
        PolicyKey {
            token_kind:     req.scenario.token_kind.clone(),
            owner_status:   req.scenario.owner_status,
            peer_alignment: req.scenario.peer_alignment,
            persona:        req.persona.persona_id.clone(),
            model:          req.model.clone(),
        }
    }

    /// Map a Likert mean onto the valuation band.
    pub fn scale(&self, mean: f64) -> f64 {
        self.v_base + self.phi * (mean.clamp(1.0, 7.0) - 4.0) / 3.0
    }
}

impl CognitionProvider for PolicyLookup {
    fn name(&self) -> &str {
        "policy_lookup"
    }

    fn schema_version(&self) -> SchemaVersion {
        ENGINE_SCHEMA
    }

    fn interpret(
        &self,
        view: &AgentView<'_>,
        observation: &EventEnvelope,
    ) -> ProviderResult<InterpretOutcome> {
        Ok(mock::interpret_rules(view, observation))
    }

    fn evaluate(&self, req: &EvaluateRequest) -> ProviderResult<ValueEstimate> {
        let key = Self::key_for(req);
        match self.table.get(&key) {
            Some(entry) => Ok(ValueEstimate {
                value:  self.scale(entry.value_mean),
                source: EstimateSource::Computed,
            }),
            None => Err(ProviderError::MissingPolicy(key.to_string())),
        }
    }
}
