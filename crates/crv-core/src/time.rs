//! Logical time.
//!
//! Time is a monotonically increasing `Tick` counter.  It carries no wall-clock
//! mapping: the engine is a logical stepper and every ordering guarantee is
//! expressed in ticks.  Only the scheduler in `crv-sim` ever advances it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// The tick immediately after `self`.
    #[inline]
    pub fn next(self) -> Tick {
        Tick(self.0 + 1)
    }

    /// Partition bucket for persisted rows: `tick / bucket_size`.
    ///
    /// A `bucket_size` of zero is treated as one.
    #[inline]
    pub fn bucket(self, bucket_size: u64) -> u64 {
        self.0 / bucket_size.max(1)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}
