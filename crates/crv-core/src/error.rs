//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `CrvError` as one variant
//! where they need to surface a core failure.

use thiserror::Error;

use crate::{AgentId, SchemaVersion};

/// The top-level error type for `crv-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum CrvError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("schema version mismatch: engine supports {expected}, found {found}")]
    VersionMismatch {
        expected: SchemaVersion,
        found:    SchemaVersion,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `crv-*` crates.
pub type CrvResult<T> = Result<T, CrvError>;
