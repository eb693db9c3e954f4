//! SQLite backend (feature `sqlite`).
//!
//! Creates `crv.db` in the output directory with one table per row type.
//! Each commit batch is written in a single transaction, so a crash never
//! leaves a partially persisted tick.

use std::path::Path;

use rusqlite::{Connection, Transaction, params};

use crv_sim::CommitBatch;

use crate::sink::PersistenceSink;
use crate::{OutputError, OutputResult};

const SCHEMA: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous  = NORMAL;
    CREATE TABLE IF NOT EXISTS events (
        bucket       INTEGER NOT NULL,
        tick         INTEGER NOT NULL,
        envelope_id  INTEGER NOT NULL,
        kind         TEXT    NOT NULL,
        status       TEXT    NOT NULL,
        channel      TEXT    NOT NULL,
        scope        TEXT    NOT NULL,
        actor_id     INTEGER NOT NULL,
        recipient_id INTEGER,
        created_tick INTEGER NOT NULL,
        parent_id    INTEGER,
        deliver_at   INTEGER,
        action       TEXT    NOT NULL,
        payload_key  TEXT    NOT NULL,
        payload_json TEXT    NOT NULL,
        reason       TEXT
    );
    CREATE TABLE IF NOT EXISTS identity_edges (
        bucket           INTEGER NOT NULL,
        tick             INTEGER NOT NULL,
        observer_id      INTEGER NOT NULL,
        edge_kind        TEXT    NOT NULL,
        subject_id       INTEGER,
        object_id        INTEGER,
        related_agent_id INTEGER,
        token_id         INTEGER,
        weight           REAL    NOT NULL,
        edge_sign        INTEGER
    );
    CREATE TABLE IF NOT EXISTS decisions (
        bucket          INTEGER NOT NULL,
        tick            INTEGER NOT NULL,
        agent_id        INTEGER NOT NULL,
        abstained       INTEGER NOT NULL,
        chosen_index    INTEGER,
        chosen_action   TEXT,
        chosen_token    INTEGER,
        chosen_score    REAL,
        temperature     REAL    NOT NULL,
        stochastic      INTEGER NOT NULL,
        candidates_json TEXT    NOT NULL,
        estimates_json  TEXT    NOT NULL
    );
    CREATE TABLE IF NOT EXISTS scenarios (
        bucket         INTEGER NOT NULL,
        tick           INTEGER NOT NULL,
        agent_id       INTEGER NOT NULL,
        token_id       INTEGER NOT NULL,
        token_kind     TEXT    NOT NULL,
        owner_status   TEXT    NOT NULL,
        peer_alignment TEXT    NOT NULL,
        group_id       INTEGER,
        last_scope     TEXT,
        affect_index   REAL    NOT NULL,
        salient_other  INTEGER,
        readout        REAL    NOT NULL,
        context_hash   TEXT    NOT NULL,
        estimate       REAL    NOT NULL,
        source         TEXT    NOT NULL
    );
    CREATE TABLE IF NOT EXISTS provider_calls (
        bucket       INTEGER NOT NULL,
        tick         INTEGER NOT NULL,
        agent_id     INTEGER NOT NULL,
        provider     TEXT    NOT NULL,
        phase        TEXT    NOT NULL,
        persona_hash TEXT    NOT NULL,
        context_hash TEXT,
        envelope_id  INTEGER,
        source       TEXT    NOT NULL,
        error        TEXT
    );
    CREATE TABLE IF NOT EXISTS edit_rejections (
        bucket      INTEGER NOT NULL,
        tick        INTEGER NOT NULL,
        agent_id    INTEGER NOT NULL,
        patch_index INTEGER NOT NULL,
        edit_index  INTEGER NOT NULL,
        operation   TEXT    NOT NULL,
        reason      TEXT    NOT NULL,
        detail      TEXT    NOT NULL
    );
    CREATE INDEX IF NOT EXISTS events_bucket    ON events (bucket, tick);
    CREATE INDEX IF NOT EXISTS edges_bucket     ON identity_edges (bucket, tick, observer_id);
    CREATE INDEX IF NOT EXISTS scenarios_bucket ON scenarios (bucket, tick, agent_id);
";

/// Writes commit batches to an SQLite database.
pub struct SqliteSink {
    conn:     Connection,
    finished: bool,
}

impl SqliteSink {
    /// Open (or create) `crv.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("crv.db"))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, finished: false })
    }

    /// The underlying connection, for ad-hoc queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn insert_rows(tx: &Transaction<'_>, batch: &CommitBatch) -> rusqlite::Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO events VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
    )?;
    for r in &batch.events {
        stmt.execute(params![
            r.bucket,
            r.tick,
            r.envelope_id,
            r.kind,
            r.status,
            r.channel,
            r.scope,
            r.actor_id,
            r.recipient_id,
            r.created_tick,
            r.parent_id,
            r.deliver_at,
            r.action,
            r.payload_key,
            r.payload_json,
            r.reason,
        ])?;
    }

    let mut stmt = tx.prepare_cached(
        "INSERT INTO identity_edges VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    for r in &batch.identity_edges {
        stmt.execute(params![
            r.bucket,
            r.tick,
            r.observer_id,
            r.edge_kind,
            r.subject_id,
            r.object_id,
            r.related_agent_id,
            r.token_id,
            r.weight,
            r.edge_sign,
        ])?;
    }

    let mut stmt = tx.prepare_cached(
        "INSERT INTO decisions VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )?;
    for r in &batch.decisions {
        stmt.execute(params![
            r.bucket,
            r.tick,
            r.agent_id,
            r.abstained,
            r.chosen_index,
            r.chosen_action,
            r.chosen_token,
            r.chosen_score,
            r.temperature,
            r.stochastic,
            r.candidates_json,
            r.estimates_json,
        ])?;
    }

    let mut stmt = tx.prepare_cached(
        "INSERT INTO scenarios VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
    )?;
    for r in &batch.scenarios {
        stmt.execute(params![
            r.bucket,
            r.tick,
            r.agent_id,
            r.token_id,
            r.token_kind,
            r.owner_status,
            r.peer_alignment,
            r.group_id,
            r.last_scope,
            r.affect_index,
            r.salient_other,
            r.readout,
            r.context_hash,
            r.estimate,
            r.source,
        ])?;
    }

    let mut stmt = tx.prepare_cached(
        "INSERT INTO provider_calls VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    for r in &batch.provider_calls {
        stmt.execute(params![
            r.bucket,
            r.tick,
            r.agent_id,
            r.provider,
            r.phase,
            r.persona_hash,
            r.context_hash,
            r.envelope_id,
            r.source,
            r.error,
        ])?;
    }

    let mut stmt = tx.prepare_cached(
        "INSERT INTO edit_rejections VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for r in &batch.rejections {
        stmt.execute(params![
            r.bucket,
            r.tick,
            r.agent_id,
            r.patch_index,
            r.edit_index,
            r.operation,
            r.reason,
            r.detail,
        ])?;
    }
    Ok(())
}

impl PersistenceSink for SqliteSink {
    fn write_batch(&mut self, batch: &CommitBatch) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        if batch.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        insert_rows(&tx, batch)?;
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
