//! Canonical hashing for contexts, personas and cache keys.
//!
//! Values are serialized to compact JSON with `serde_json` and hashed with
//! SHA-256.  The serialization is canonical as long as the value contains only
//! structs (fixed field order) and ordered maps (`BTreeMap`); hash maps must
//! never be fed to [`canonical_hash`].

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::CrvResult;

/// A SHA-256 digest over a canonical serialization.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContextHash(pub [u8; 32]);

impl ContextHash {
    /// Lower-case hex of the first eight bytes; enough for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Display for ContextHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ContextHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextHash({})", self.short())
    }
}

/// Hash `value` over its canonical JSON serialization.
pub fn canonical_hash<T: Serialize + ?Sized>(value: &T) -> CrvResult<ContextHash> {
    let bytes = serde_json::to_vec(value)?;
    Ok(ContextHash(Sha256::digest(&bytes).into()))
}
