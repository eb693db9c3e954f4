//! Memoizing wrapper around another provider.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crv_core::{ContextHash, SchemaVersion};
use crv_router::EventEnvelope;

use crate::{
    AgentView, CognitionProvider, EstimateSource, EvaluateRequest, InterpretOutcome, Provider,
    ProviderError, ProviderResult, ValueEstimate, fallback_estimate,
};

#[derive(Copy, Clone, Debug, PartialEq)]
struct Entry {
    value:    f64,
    fallback: bool,
}

/// Cache counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits:      u64,
    pub misses:    u64,
    pub fallbacks: u64,
}

/// Memoizes `evaluate` by context hash.
///
/// When the inner provider fails, the fallback value is stored under the key
/// and the error is still returned, so the caller logs the failure once.
/// Later identical requests resolve to the same value and keep the
/// `fallback` source; only computed values are reported as `cache`.
/// `interpret` is passed through uncached.
pub struct CachedOracle {
    inner:     Box<Provider>,
    entries:   Mutex<HashMap<ContextHash, Entry>>,
    hits:      AtomicU64,
    misses:    AtomicU64,
    fallbacks: AtomicU64,
}

impl CachedOracle {
    pub fn new(inner: Provider) -> Self {
        Self {
            inner:     Box::new(inner),
            entries:   Mutex::new(HashMap::new()),
            hits:      AtomicU64::new(0),
            misses:    AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &Provider {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits:      self.hits.load(Ordering::Relaxed),
            misses:    self.misses.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }

    /// `true` if the entry for `key` was recorded as a fallback.
    pub fn is_fallback(&self, key: &ContextHash) -> bool {
        self.entries
            .lock()
            .map(|m| m.get(key).is_some_and(|e| e.fallback))
            .unwrap_or(false)
    }
}

impl CognitionProvider for CachedOracle {
    fn name(&self) -> &str {
        "cached_oracle"
    }

    fn schema_version(&self) -> SchemaVersion {
        self.inner.schema_version()
    }

    fn interpret(
        &self,
        view: &AgentView<'_>,
        observation: &EventEnvelope,
    ) -> ProviderResult<InterpretOutcome> {
        self.inner.interpret(view, observation)
    }

    fn evaluate(&self, req: &EvaluateRequest) -> ProviderResult<ValueEstimate> {
        if let Some(entry) = self
            .entries
            .lock()
            .map_err(|_| ProviderError::Poisoned)?
            .get(&req.context_hash)
            .copied()
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            let source = if entry.fallback { EstimateSource::Fallback } else { EstimateSource::Cache };
            return Ok(ValueEstimate { value: entry.value, source });
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let (entry, result) = match self.inner.evaluate(req) {
            Ok(est) => (Entry { value: est.value, fallback: false }, Ok(est)),
            Err(e) => {
                self.fallbacks.fetch_add(1, Ordering::Relaxed);
                let fb = fallback_estimate(req);
                debug!(
                    target: "crv_cognition",
                    key = %req.context_hash.short(),
                    reason = e.reason(),
                    "recording fallback in cache"
                );
                (Entry { value: fb.value, fallback: true }, Err(e))
            }
        };
        self.entries
            .lock()
            .map_err(|_| ProviderError::Poisoned)?
            .insert(req.context_hash, entry);
        result
    }
}
