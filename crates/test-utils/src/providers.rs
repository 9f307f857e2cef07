//! Fake data providers for exercising layer builds without touching disk.

use async_trait::async_trait;
use choropleth_common::{ChoroplethError, ChoroplethResult, DataProvider, Dataset, SourceRef};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Serves in-memory datasets by source name and counts every load.
///
/// Loads can be slowed down with [`CountingProvider::with_delay`] so that
/// concurrent requests overlap, and the first N loads can be made to fail
/// with [`CountingProvider::failing_first`].
#[derive(Default)]
pub struct CountingProvider {
    datasets: HashMap<String, Arc<dyn Dataset>>,
    delay: Duration,
    failures_remaining: AtomicUsize,
    loads: AtomicUsize,
}

impl CountingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `dataset` for `source`.
    pub fn with_dataset(mut self, source: &str, dataset: impl Dataset + 'static) -> Self {
        self.datasets.insert(source.to_string(), Arc::new(dataset));
        self
    }

    /// Sleep this long inside every load.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail the first `count` loads with a data source error.
    pub fn failing_first(self, count: usize) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// Number of loads started so far.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataProvider for CountingProvider {
    async fn load_dataset(&self, source: &SourceRef) -> ChoroplethResult<Arc<dyn Dataset>> {
        self.loads.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(ChoroplethError::DataSource(format!("{} is locked", source)));
        }

        self.datasets
            .get(source.as_str())
            .cloned()
            .ok_or_else(|| ChoroplethError::DataSource(format!("no such source: {}", source)))
    }
}
