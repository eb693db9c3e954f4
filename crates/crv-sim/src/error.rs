use thiserror::Error;

use crv_core::{CrvError, SchemaVersion};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("{what} length {got} does not match agent count {expected}")]
    AgentCountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },

    #[error("provider `{provider}` speaks schema {found}, engine requires {expected}")]
    VersionMismatch {
        provider: String,
        expected: SchemaVersion,
        found:    SchemaVersion,
    },

    #[error("persistence sink failed: {0}")]
    Sink(String),

    #[error(transparent)]
    Core(#[from] CrvError),
}

pub type SimResult<T> = Result<T, SimError>;
