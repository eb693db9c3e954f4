use thiserror::Error;

use crv_core::SchemaVersion;

/// Why a provider call failed.  Never fatal: the engine substitutes a
/// fallback and records the failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("provider timed out after {millis} ms")]
    Timeout { millis: u64 },

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("no policy entry for {0}")]
    MissingPolicy(String),

    #[error("provider returned invalid output: {0}")]
    InvalidOutput(String),

    #[error("provider cache lock poisoned")]
    Poisoned,
}

impl ProviderError {
    /// Short machine-readable reason, used in logs and audit rows.
    pub fn reason(&self) -> &'static str {
        match self {
            ProviderError::Timeout { .. } => "timeout",
            ProviderError::Unavailable(_) => "unavailable",
            ProviderError::MissingPolicy(_) => "missing_policy",
            ProviderError::InvalidOutput(_) => "invalid_output",
            ProviderError::Poisoned => "poisoned",
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors loading an offline policy table.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy parse error: {0}")]
    Parse(String),

    #[error("policy schema version mismatch: engine supports {expected}, found {found}")]
    VersionMismatch {
        expected: SchemaVersion,
        found:    SchemaVersion,
    },

    #[error("duplicate policy key {0}")]
    Duplicate(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PolicyResult<T> = Result<T, PolicyError>;
