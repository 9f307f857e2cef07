//! Compute-once cache of built layers.
//!
//! Every registered layer owns a single slot. The first request for a layer
//! spawns a task on the tokio runtime that invokes its builder, and stores the
//! task as a [`Shared`] future; every concurrent and later request awaits
//! that same future and receives the same `Arc<LayerResult>`.
//!
//! ```text
//! request A ─┐
//!            │                    ┌──────────────┐
//! request B ─┼──► LayerCache ───► │ slot(id)     │──► builder() (once)
//!            │                    │ Shared<...>  │
//! request C ─┘                    └──────────────┘
//!                  A, B, C all receive the same Arc<LayerResult>
//! ```
//!
//! Entries are never evicted: the registry is a startup catalog, not an LRU.
//! What happens after a failed build is decided by [`CachePolicy`].

use choropleth_common::{ChoroplethError, ChoroplethResult, LayerId, LayerResult};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::registry::{LayerBuilder, LayerRegistry};

/// A build in progress or finished, shareable between any number of callers.
pub type SharedBuild = Shared<BoxFuture<'static, ChoroplethResult<Arc<LayerResult>>>>;

/// What to do with a slot whose build failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Keep the failure; every later request replays it without rebuilding.
    #[default]
    CacheFailures,
    /// Clear the slot so the next request invokes the builder again.
    RetryOnFailure,
}

impl FromStr for CachePolicy {
    type Err = ChoroplethError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "cache_failures" => Ok(Self::CacheFailures),
            "retry_on_failure" => Ok(Self::RetryOnFailure),
            other => Err(ChoroplethError::InvalidConfig(format!(
                "unknown cache policy '{}' (expected cache_failures or retry_on_failure)",
                other
            ))),
        }
    }
}

/// Request and build counters.
///
/// All fields are atomic for lock-free reads.
#[derive(Debug, Default)]
pub struct LayerCacheStats {
    /// Requests for registered and unregistered layers
    pub requests: AtomicU64,
    /// Requests answered from an existing slot (finished or in flight)
    pub hits: AtomicU64,
    /// Builder invocations
    pub builds_started: AtomicU64,
    /// Builds that finished with an error
    pub builds_failed: AtomicU64,
    /// Requests for layers with no registered builder
    pub not_found: AtomicU64,
}

impl LayerCacheStats {
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn builds_started(&self) -> u64 {
        self.builds_started.load(Ordering::Relaxed)
    }

    pub fn builds_failed(&self) -> u64 {
        self.builds_failed.load(Ordering::Relaxed)
    }

    pub fn not_found(&self) -> u64 {
        self.not_found.load(Ordering::Relaxed)
    }

    /// Share of requests served from an existing slot, as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let requests = self.requests();
        if requests == 0 {
            0.0
        } else {
            (self.hits() as f64 / requests as f64) * 100.0
        }
    }
}

struct Entry {
    builder: LayerBuilder,
    slot: Mutex<Option<SharedBuild>>,
}

impl Entry {
    fn slot(&self) -> MutexGuard<'_, Option<SharedBuild>> {
        // A builder panicking under the guard leaves the slot untouched, so a
        // poisoned lock still holds a consistent value.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Compute-once cache keyed by [`LayerId`].
///
/// The key set is fixed by the registry at construction, so lookups need no
/// lock; each slot has its own short-lived mutex guarding installation only.
pub struct LayerCache {
    entries: HashMap<LayerId, Entry>,
    policy: CachePolicy,
    stats: Arc<LayerCacheStats>,
}

impl LayerCache {
    pub fn new(registry: LayerRegistry, policy: CachePolicy) -> Self {
        let entries: HashMap<LayerId, Entry> = registry
            .into_builders()
            .into_iter()
            .map(|(id, builder)| {
                (
                    id,
                    Entry {
                        builder,
                        slot: Mutex::new(None),
                    },
                )
            })
            .collect();

        info!(
            layers = entries.len(),
            policy = ?policy,
            "Initializing layer cache"
        );

        Self {
            entries,
            policy,
            stats: Arc::new(LayerCacheStats::default()),
        }
    }

    /// Build (once) and return the layer for `id`.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn get_or_build(&self, id: LayerId) -> ChoroplethResult<Arc<LayerResult>> {
        let build = self.shared(id)?;
        let result = build.clone().await;

        if result.is_err() && self.policy == CachePolicy::RetryOnFailure {
            self.clear_failed(id, &build);
        }

        result
    }

    /// The shared build future for `id`, starting the build if needed.
    ///
    /// Returns `LayerNotFound` without touching any builder when `id` has no
    /// registration. Must be called from within a tokio runtime.
    pub fn shared(&self, id: LayerId) -> ChoroplethResult<SharedBuild> {
        self.stats.requests.fetch_add(1, Ordering::Relaxed);

        let Some(entry) = self.entries.get(&id) else {
            self.stats.not_found.fetch_add(1, Ordering::Relaxed);
            debug!(layer = %id, "Layer has no registered builder");
            return Err(ChoroplethError::LayerNotFound(id));
        };

        let mut slot = entry.slot();
        if let Some(build) = slot.as_ref() {
            let stale = self.policy == CachePolicy::RetryOnFailure
                && matches!(build.peek(), Some(Err(_)));
            if !stale {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                debug!(layer = %id, ready = build.peek().is_some(), "Layer cache hit");
                return Ok(build.clone());
            }
            debug!(layer = %id, "Retrying failed layer build");
        }

        let build = self.start_build(id, &entry.builder);
        *slot = Some(build.clone());
        Ok(build)
    }

    fn start_build(&self, id: LayerId, builder: &LayerBuilder) -> SharedBuild {
        self.stats.builds_started.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("choropleth_layer_builds_total", "layer" => id.name()).increment(1);
        info!(layer = %id, "Starting layer build");

        // The builder runs inside the task so that a panic in its synchronous
        // part is caught by the runtime like one in the future it returns.
        let builder = Arc::clone(builder);
        let task = tokio::spawn(async move {
            let start = Instant::now();
            let result = builder().await;
            (result, start.elapsed().as_millis() as u64)
        });

        let stats = Arc::clone(&self.stats);
        async move {
            let (result, elapsed_ms) = match task.await {
                Ok(finished) => finished,
                Err(join_err) => (
                    Err(ChoroplethError::BuildFailed {
                        layer: id,
                        details: format!("build task did not complete: {}", join_err),
                    }),
                    0,
                ),
            };

            match result {
                Ok(layer) => {
                    info!(
                        layer = %id,
                        stops = layer.stops.len(),
                        features = layer.feature_count(),
                        elapsed_ms = elapsed_ms,
                        "Layer build finished"
                    );
                    Ok(Arc::new(layer))
                }
                Err(err) => {
                    stats.builds_failed.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!("choropleth_layer_build_failures_total", "layer" => id.name())
                        .increment(1);
                    warn!(layer = %id, error = %err, elapsed_ms = elapsed_ms, "Layer build failed");
                    Err(ChoroplethError::build_failed(id, err))
                }
            }
        }
        .boxed()
        .shared()
    }

    fn clear_failed(&self, id: LayerId, failed: &SharedBuild) {
        let Some(entry) = self.entries.get(&id) else {
            return;
        };
        let mut slot = entry.slot();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(failed)) {
            *slot = None;
            debug!(layer = %id, "Cleared failed layer build");
        }
    }

    /// True once `id` has finished building successfully.
    pub fn is_built(&self, id: LayerId) -> bool {
        self.entries
            .get(&id)
            .map(|entry| matches!(entry.slot().as_ref().and_then(|b| b.peek()), Some(Ok(_))))
            .unwrap_or(false)
    }

    /// Number of layers that have finished building successfully.
    pub fn built_count(&self) -> usize {
        self.entries.keys().filter(|id| self.is_built(**id)).count()
    }

    /// Registered layer ids, sorted.
    pub fn ids(&self) -> Vec<LayerId> {
        let mut ids: Vec<LayerId> = self.entries.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn stats(&self) -> &LayerCacheStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_policy_from_str() {
        assert_eq!(
            "cache_failures".parse::<CachePolicy>().unwrap(),
            CachePolicy::CacheFailures
        );
        assert_eq!(
            "Retry-On-Failure".parse::<CachePolicy>().unwrap(),
            CachePolicy::RetryOnFailure
        );
        assert!("sometimes".parse::<CachePolicy>().is_err());
        assert_eq!(CachePolicy::default(), CachePolicy::CacheFailures);
    }

    #[tokio::test]
    async fn test_unregistered_layer_is_not_found() {
        let cache = LayerCache::new(LayerRegistry::default(), CachePolicy::default());
        let err = cache.get_or_build(LayerId::Neighborhoods).await.unwrap_err();
        assert_eq!(err, ChoroplethError::LayerNotFound(LayerId::Neighborhoods));
        assert_eq!(cache.stats().not_found(), 1);
        assert_eq!(cache.stats().builds_started(), 0);
        assert!(!cache.is_built(LayerId::Neighborhoods));
    }

    #[test]
    fn test_hit_rate_empty() {
        assert_eq!(LayerCacheStats::default().hit_rate(), 0.0);
    }
}
