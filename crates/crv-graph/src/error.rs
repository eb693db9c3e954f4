use thiserror::Error;

use crate::{EdgeKind, Slot};

/// Why a graph edit was rejected.  A rejected edit never mutates the graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("edge kind {kind} requires slot {slot}")]
    MissingSlot { kind: EdgeKind, slot: Slot },

    #[error("edge kind {kind} does not take slot {slot}")]
    ExtraneousSlot { kind: EdgeKind, slot: Slot },

    #[error("non-finite value {value} for {kind}")]
    NonFinite { kind: EdgeKind, value: f64 },

    #[error("weight {value} outside [{min}, {max}] for {kind}")]
    OutOfRange { kind: EdgeKind, value: f64, min: f64, max: f64 },

    #[error("decay lambda must be finite and >= 0, got {0}")]
    InvalidLambda(f64),

    #[error("unknown edge kind {0:?}")]
    UnknownKind(String),
}

impl GraphError {
    /// Short machine-readable reason, used in logs and persisted rows.
    pub fn reason(&self) -> &'static str {
        match self {
            GraphError::MissingSlot { .. } => "missing_slot",
            GraphError::ExtraneousSlot { .. } => "extraneous_slot",
            GraphError::NonFinite { .. } => "non_finite",
            GraphError::OutOfRange { .. } => "out_of_range",
            GraphError::InvalidLambda(_) => "invalid_lambda",
            GraphError::UnknownKind(_) => "unknown_kind",
        }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
