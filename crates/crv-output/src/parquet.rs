//! Parquet backend (feature `parquet`).
//!
//! One Snappy-compressed file per table in the output directory.  Each
//! commit batch becomes one record batch per non-empty table.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int8Array, StringArray, UInt32Array, UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crv_sim::{
    CommitBatch, DecisionRow, EditRejectionRow, EventRow, IdentityEdgeRow, ProviderCallRow, ScenarioRow,
};

use crate::sink::PersistenceSink;
use crate::{OutputError, OutputResult, columns};

use DataType::{Boolean, Float64, Int8, UInt32, UInt64, Utf8};

// ── Schemas ───────────────────────────────────────────────────────────────────

/// `(type, nullable)` per column, parallel to the names in [`columns`].
const EVENT_TYPES: [(DataType, bool); 16] = [
    (UInt64, false), (UInt64, false), (UInt64, false), (Utf8, false),
    (Utf8, false),   (Utf8, false),   (Utf8, false),   (UInt32, false),
    (UInt32, true),  (UInt64, false), (UInt64, true),  (UInt64, true),
    (Utf8, false),   (Utf8, false),   (Utf8, false),   (Utf8, true),
];

const EDGE_TYPES: [(DataType, bool); 10] = [
    (UInt64, false), (UInt64, false), (UInt32, false), (Utf8, false), (UInt32, true),
    (UInt32, true),  (UInt32, true),  (UInt32, true),  (Float64, false), (Int8, true),
];

const DECISION_TYPES: [(DataType, bool); 12] = [
    (UInt64, false),  (UInt64, false),  (UInt32, false), (Boolean, false),
    (UInt32, true),   (Utf8, true),     (UInt32, true),  (Float64, true),
    (Float64, false), (Boolean, false), (Utf8, false),   (Utf8, false),
];

const SCENARIO_TYPES: [(DataType, bool); 15] = [
    (UInt64, false), (UInt64, false), (UInt32, false), (UInt32, false), (Utf8, false),
    (Utf8, false),   (Utf8, false),   (UInt32, true),  (Utf8, true),    (Float64, false),
    (UInt32, true),  (Float64, false), (Utf8, false),  (Float64, false), (Utf8, false),
];

const PROVIDER_CALL_TYPES: [(DataType, bool); 10] = [
    (UInt64, false), (UInt64, false), (UInt32, false), (Utf8, false), (Utf8, false),
    (Utf8, false),   (Utf8, true),    (UInt64, true),  (Utf8, false), (Utf8, true),
];

const REJECTION_TYPES: [(DataType, bool); 8] = [
    (UInt64, false), (UInt64, false), (UInt32, false), (UInt32, false),
    (UInt32, false), (Utf8, false),   (Utf8, false),   (Utf8, false),
];

fn schema(names: &[&str], types: &[(DataType, bool)]) -> Arc<Schema> {
    Arc::new(Schema::new(
        names
            .iter()
            .zip(types)
            .map(|(name, (ty, nullable))| Field::new(*name, ty.clone(), *nullable))
            .collect::<Vec<_>>(),
    ))
}

fn snappy_props() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

// ── Columns ───────────────────────────────────────────────────────────────────

fn u64s<T>(rows: &[T], f: impl Fn(&T) -> u64) -> ArrayRef {
    Arc::new(UInt64Array::from_iter_values(rows.iter().map(f)))
}

fn opt_u64s<T>(rows: &[T], f: impl Fn(&T) -> Option<u64>) -> ArrayRef {
    Arc::new(rows.iter().map(f).collect::<UInt64Array>())
}

fn u32s<T>(rows: &[T], f: impl Fn(&T) -> u32) -> ArrayRef {
    Arc::new(UInt32Array::from_iter_values(rows.iter().map(f)))
}

fn opt_u32s<T>(rows: &[T], f: impl Fn(&T) -> Option<u32>) -> ArrayRef {
    Arc::new(rows.iter().map(f).collect::<UInt32Array>())
}

fn f64s<T>(rows: &[T], f: impl Fn(&T) -> f64) -> ArrayRef {
    Arc::new(Float64Array::from_iter_values(rows.iter().map(f)))
}

fn opt_f64s<T>(rows: &[T], f: impl Fn(&T) -> Option<f64>) -> ArrayRef {
    Arc::new(rows.iter().map(f).collect::<Float64Array>())
}

fn bools<T>(rows: &[T], f: impl Fn(&T) -> bool) -> ArrayRef {
    Arc::new(rows.iter().map(|r| Some(f(r))).collect::<BooleanArray>())
}

fn strs<T>(rows: &[T], f: impl Fn(&T) -> &str) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(rows.iter().map(f)))
}

fn opt_strs<T>(rows: &[T], f: impl Fn(&T) -> Option<&str>) -> ArrayRef {
    Arc::new(rows.iter().map(f).collect::<StringArray>())
}

fn event_columns(rows: &[EventRow]) -> Vec<ArrayRef> {
    vec![
        u64s(rows, |r| r.bucket),
        u64s(rows, |r| r.tick),
        u64s(rows, |r| r.envelope_id),
        strs(rows, |r| r.kind.as_str()),
        strs(rows, |r| r.status.as_str()),
        strs(rows, |r| r.channel.as_str()),
        strs(rows, |r| r.scope.as_str()),
        u32s(rows, |r| r.actor_id),
        opt_u32s(rows, |r| r.recipient_id),
        u64s(rows, |r| r.created_tick),
        opt_u64s(rows, |r| r.parent_id),
        opt_u64s(rows, |r| r.deliver_at),
        strs(rows, |r| r.action.as_str()),
        strs(rows, |r| r.payload_key.as_str()),
        strs(rows, |r| r.payload_json.as_str()),
        opt_strs(rows, |r| r.reason.as_deref()),
    ]
}

fn edge_columns(rows: &[IdentityEdgeRow]) -> Vec<ArrayRef> {
    vec![
        u64s(rows, |r| r.bucket),
        u64s(rows, |r| r.tick),
        u32s(rows, |r| r.observer_id),
        strs(rows, |r| r.edge_kind.as_str()),
        opt_u32s(rows, |r| r.subject_id),
        opt_u32s(rows, |r| r.object_id),
        opt_u32s(rows, |r| r.related_agent_id),
        opt_u32s(rows, |r| r.token_id),
        f64s(rows, |r| r.weight),
        Arc::new(rows.iter().map(|r| r.edge_sign).collect::<Int8Array>()),
    ]
}

fn decision_columns(rows: &[DecisionRow]) -> Vec<ArrayRef> {
    vec![
        u64s(rows, |r| r.bucket),
        u64s(rows, |r| r.tick),
        u32s(rows, |r| r.agent_id),
        bools(rows, |r| r.abstained),
        opt_u32s(rows, |r| r.chosen_index),
        opt_strs(rows, |r| r.chosen_action.as_deref()),
        opt_u32s(rows, |r| r.chosen_token),
        opt_f64s(rows, |r| r.chosen_score),
        f64s(rows, |r| r.temperature),
        bools(rows, |r| r.stochastic),
        strs(rows, |r| r.candidates_json.as_str()),
        strs(rows, |r| r.estimates_json.as_str()),
    ]
}

fn scenario_columns(rows: &[ScenarioRow]) -> Vec<ArrayRef> {
    vec![
        u64s(rows, |r| r.bucket),
        u64s(rows, |r| r.tick),
        u32s(rows, |r| r.agent_id),
        u32s(rows, |r| r.token_id),
        strs(rows, |r| r.token_kind.as_str()),
        strs(rows, |r| r.owner_status.as_str()),
        strs(rows, |r| r.peer_alignment.as_str()),
        opt_u32s(rows, |r| r.group_id),
        opt_strs(rows, |r| r.last_scope.as_deref()),
        f64s(rows, |r| r.affect_index),
        opt_u32s(rows, |r| r.salient_other),
        f64s(rows, |r| r.readout),
        strs(rows, |r| r.context_hash.as_str()),
        f64s(rows, |r| r.estimate),
        strs(rows, |r| r.source.as_str()),
    ]
}

fn provider_call_columns(rows: &[ProviderCallRow]) -> Vec<ArrayRef> {
    vec![
        u64s(rows, |r| r.bucket),
        u64s(rows, |r| r.tick),
        u32s(rows, |r| r.agent_id),
        strs(rows, |r| r.provider.as_str()),
        strs(rows, |r| r.phase.as_str()),
        strs(rows, |r| r.persona_hash.as_str()),
        opt_strs(rows, |r| r.context_hash.as_deref()),
        opt_u64s(rows, |r| r.envelope_id),
        strs(rows, |r| r.source.as_str()),
        opt_strs(rows, |r| r.error.as_deref()),
    ]
}

fn rejection_columns(rows: &[EditRejectionRow]) -> Vec<ArrayRef> {
    vec![
        u64s(rows, |r| r.bucket),
        u64s(rows, |r| r.tick),
        u32s(rows, |r| r.agent_id),
        u32s(rows, |r| r.patch_index),
        u32s(rows, |r| r.edit_index),
        strs(rows, |r| r.operation.as_str()),
        strs(rows, |r| r.reason.as_str()),
        strs(rows, |r| r.detail.as_str()),
    ]
}

// ── Table ─────────────────────────────────────────────────────────────────────

struct Table {
    schema: Arc<Schema>,
    writer: Option<ArrowWriter<File>>,
}

impl Table {
    fn create(dir: &Path, name: &str, names: &[&str], types: &[(DataType, bool)]) -> OutputResult<Self> {
        let schema = schema(names, types);
        let file = File::create(dir.join(format!("{name}.parquet")))?;
        let writer = ArrowWriter::try_new(file, Arc::clone(&schema), Some(snappy_props()))?;
        Ok(Self { schema, writer: Some(writer) })
    }

    fn write(&mut self, len: usize, columns: impl FnOnce() -> Vec<ArrayRef>) -> OutputResult<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(OutputError::Finished);
        };
        if len == 0 {
            return Ok(());
        }
        let batch = RecordBatch::try_new(Arc::clone(&self.schema), columns())?;
        writer.write(&batch)?;
        Ok(())
    }

    fn close(&mut self) -> OutputResult<()> {
        if let Some(w) = self.writer.take() {
            w.close()?;
        }
        Ok(())
    }
}

/// Writes commit batches to one Parquet file per table.
///
/// `finish()` **must** be called to write the Parquet footers; files written
/// without it cannot be opened by Parquet readers.
pub struct ParquetSink {
    events:         Table,
    identity_edges: Table,
    decisions:      Table,
    scenarios:      Table,
    provider_calls: Table,
    rejections:     Table,
}

impl ParquetSink {
    /// Create the Parquet files in `dir`.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        Ok(Self {
            events:         Table::create(dir, "events", &columns::EVENTS, &EVENT_TYPES)?,
            identity_edges: Table::create(dir, "identity_edges", &columns::IDENTITY_EDGES, &EDGE_TYPES)?,
            decisions:      Table::create(dir, "decisions", &columns::DECISIONS, &DECISION_TYPES)?,
            scenarios:      Table::create(dir, "scenarios", &columns::SCENARIOS, &SCENARIO_TYPES)?,
            provider_calls: Table::create(dir, "provider_calls", &columns::PROVIDER_CALLS, &PROVIDER_CALL_TYPES)?,
            rejections:     Table::create(dir, "edit_rejections", &columns::EDIT_REJECTIONS, &REJECTION_TYPES)?,
        })
    }
}

impl PersistenceSink for ParquetSink {
    fn write_batch(&mut self, batch: &CommitBatch) -> OutputResult<()> {
        self.events.write(batch.events.len(), || event_columns(&batch.events))?;
        self.identity_edges
            .write(batch.identity_edges.len(), || edge_columns(&batch.identity_edges))?;
        self.decisions.write(batch.decisions.len(), || decision_columns(&batch.decisions))?;
        self.scenarios.write(batch.scenarios.len(), || scenario_columns(&batch.scenarios))?;
        self.provider_calls
            .write(batch.provider_calls.len(), || provider_call_columns(&batch.provider_calls))?;
        self.rejections.write(batch.rejections.len(), || rejection_columns(&batch.rejections))?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.events.close()?;
        self.identity_edges.close()?;
        self.decisions.close()?;
        self.scenarios.close()?;
        self.provider_calls.close()?;
        self.rejections.close()?;
        Ok(())
    }
}
