//! `crv-output` — persistence sinks for commit batches.
//!
//! Three backends are provided behind Cargo features:
//!
//! | Feature   | Backend     | Files created                                          |
//! |-----------|-------------|--------------------------------------------------------|
//! | *(none)*  | CSV         | `events.csv`, `identity_edges.csv`, `decisions.csv`,   |
//! |           |             | `scenarios.csv`, `provider_calls.csv`,                 |
//! |           |             | `edit_rejections.csv`                                  |
//! | `sqlite`  | SQLite      | `crv.db` (one transaction per batch)                   |
//! | `parquet` | Parquet     | one `.parquet` file per table                          |
//!
//! All backends implement [`PersistenceSink`] and are driven by
//! [`SinkObserver`], which implements `crv_sim::SimObserver`.  A write
//! failure aborts the run with `SimError::Sink`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crv_output::{CsvSink, SinkObserver};
//!
//! let mut obs = SinkObserver::new(CsvSink::new(Path::new("./output"))?);
//! sim.run(&mut obs)?;
//! ```

pub mod columns;
pub mod csv;
pub mod error;
pub mod observer;
pub mod sink;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "parquet")]
pub mod parquet;


pub use csv::CsvSink;
pub use error::{OutputError, OutputResult};
pub use observer::SinkObserver;
pub use sink::PersistenceSink;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSink;

#[cfg(feature = "parquet")]
pub use parquet::ParquetSink;
