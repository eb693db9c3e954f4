//! Schema version metadata.
//!
//! Artifacts the engine consumes (offline policy tables, provider contracts)
//! carry a `SchemaVersion`.  A version is compatible only when both major and
//! minor match [`ENGINE_SCHEMA`]; anything else threatens replay correctness
//! and is rejected before the first tick.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CrvError;

/// Semantic schema version (`major.minor`).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
}

/// The schema version this engine reads and writes.
pub const ENGINE_SCHEMA: SchemaVersion = SchemaVersion { major: 0, minor: 1 };

impl SchemaVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// `true` if `self` matches the engine schema exactly.
    #[inline]
    pub fn is_compatible(self) -> bool {
        self == ENGINE_SCHEMA
    }

    /// Fail with [`CrvError::VersionMismatch`] unless compatible.
    pub fn ensure_compatible(self) -> Result<(), CrvError> {
        if self.is_compatible() {
            Ok(())
        } else {
            Err(CrvError::VersionMismatch { expected: ENGINE_SCHEMA, found: self })
        }
    }

    /// `true` if `self` immediately follows `current`: a minor bump within the
    /// same major, or a major bump by one with minor reset to zero.
    pub fn is_successor_of(self, current: SchemaVersion) -> bool {
        if self.major == current.major {
            return self.minor == current.minor + 1;
        }
        self.major == current.major + 1 && self.minor == 0
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for SchemaVersion {
    type Err = CrvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || CrvError::Parse(format!("invalid schema version {s:?}: expected MAJOR.MINOR"));
        let (major, minor) = s.trim().split_once('.').ok_or_else(bad)?;
        Ok(SchemaVersion {
            major: major.parse().map_err(|_| bad())?,
            minor: minor.parse().map_err(|_| bad())?,
        })
    }
}
