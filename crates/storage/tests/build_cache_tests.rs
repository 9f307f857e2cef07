//! Concurrency and failure-policy tests for the layer build cache.

use choropleth_common::{
    ChoroplethError, ChoroplethResult, DataProvider, LayerId, LayerResult, SourceRef,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storage::{CachePolicy, LayerCache, LayerRegistry};
use test_utils::{lots_dataset, CountingProvider};

const LOTS: &str = "west_linn_lots";

/// Registry whose single layer loads `LOTS` through `provider`.
fn registry_for(id: LayerId, provider: Arc<CountingProvider>) -> LayerRegistry {
    LayerRegistry::builder()
        .register(id, move || {
            let provider = Arc::clone(&provider);
            async move {
                let source = SourceRef::new(LOTS);
                let dataset = provider.load_dataset(&source).await?;
                Ok::<_, ChoroplethError>(LayerResult {
                    id,
                    title: id.title().to_string(),
                    source,
                    rendering_field: None,
                    range: None,
                    stops: Vec::new(),
                    dataset,
                })
            }
        })
        .build()
        .unwrap()
}

fn slow_provider(failures: usize) -> Arc<CountingProvider> {
    Arc::new(
        CountingProvider::new()
            .with_dataset(LOTS, lots_dataset())
            .with_delay(Duration::from_millis(50))
            .failing_first(failures),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_build_once() {
    let provider = slow_provider(0);
    let cache = Arc::new(LayerCache::new(
        registry_for(LayerId::LotScaleLvPerAcre, Arc::clone(&provider)),
        CachePolicy::CacheFailures,
    ));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_or_build(LayerId::LotScaleLvPerAcre).await })
        })
        .collect();

    let mut layers = Vec::new();
    for handle in handles {
        layers.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(provider.loads(), 1);
    assert_eq!(cache.stats().builds_started(), 1);
    assert!(layers.iter().all(|layer| Arc::ptr_eq(layer, &layers[0])));
    assert_eq!(cache.stats().requests(), 16);
    assert_eq!(cache.stats().hits(), 15);
    assert!(cache.is_built(LayerId::LotScaleLvPerAcre));
}

#[tokio::test]
async fn test_later_request_reuses_finished_build() {
    let provider = slow_provider(0);
    let cache = LayerCache::new(
        registry_for(LayerId::LotScaleFootprints, Arc::clone(&provider)),
        CachePolicy::default(),
    );

    let first = cache.get_or_build(LayerId::LotScaleFootprints).await.unwrap();
    let second = cache.get_or_build(LayerId::LotScaleFootprints).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(provider.loads(), 1);
    assert_eq!(first.feature_count(), test_utils::LOTS.len());
    assert_eq!(cache.built_count(), 1);
}

#[tokio::test]
async fn test_unregistered_id_never_builds() {
    let provider = slow_provider(0);
    let cache = LayerCache::new(
        registry_for(LayerId::LotScaleFootprints, Arc::clone(&provider)),
        CachePolicy::default(),
    );

    let err = cache.get_or_build(LayerId::Neighborhoods).await.unwrap_err();
    assert_eq!(err, ChoroplethError::LayerNotFound(LayerId::Neighborhoods));
    assert_eq!(provider.loads(), 0);
    assert_eq!(cache.stats().builds_started(), 0);
}

#[tokio::test]
async fn test_cached_failure_is_replayed() {
    let provider = slow_provider(1);
    let cache = LayerCache::new(
        registry_for(LayerId::LotScaleLvPerAcre, Arc::clone(&provider)),
        CachePolicy::CacheFailures,
    );

    let first = cache.get_or_build(LayerId::LotScaleLvPerAcre).await.unwrap_err();
    let second = cache.get_or_build(LayerId::LotScaleLvPerAcre).await.unwrap_err();

    assert!(matches!(first, ChoroplethError::BuildFailed { layer: LayerId::LotScaleLvPerAcre, .. }));
    assert_eq!(first, second);
    assert_eq!(provider.loads(), 1);
    assert_eq!(cache.stats().builds_failed(), 1);
    assert!(!cache.is_built(LayerId::LotScaleLvPerAcre));
}

#[tokio::test]
async fn test_retry_policy_rebuilds_after_failure() {
    let provider = slow_provider(1);
    let cache = LayerCache::new(
        registry_for(LayerId::LotScaleLvPerAcre, Arc::clone(&provider)),
        CachePolicy::RetryOnFailure,
    );

    assert!(cache.get_or_build(LayerId::LotScaleLvPerAcre).await.is_err());
    let layer = cache.get_or_build(LayerId::LotScaleLvPerAcre).await.unwrap();
    let again = cache.get_or_build(LayerId::LotScaleLvPerAcre).await.unwrap();

    assert!(Arc::ptr_eq(&layer, &again));
    assert_eq!(provider.loads(), 2);
    assert_eq!(cache.stats().builds_started(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panicking_builder_reports_build_failed() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let registry = LayerRegistry::builder()
        .register(LayerId::Neighborhoods, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                let result: ChoroplethResult<LayerResult> = None.expect("neighborhood shapes");
                result
            }
        })
        .build()
        .unwrap();
    let cache = LayerCache::new(registry, CachePolicy::CacheFailures);

    let err = cache.get_or_build(LayerId::Neighborhoods).await.unwrap_err();
    assert!(matches!(err, ChoroplethError::BuildFailed { layer: LayerId::Neighborhoods, .. }));
    assert!(cache.get_or_build(LayerId::Neighborhoods).await.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.stats().builds_failed(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_builder_panicking_before_its_future_is_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let registry = LayerRegistry::builder()
        .register(LayerId::Neighborhoods, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let setup: Result<(), ChoroplethError> =
                Err(ChoroplethError::DataSource("no shapes".to_string()));
            setup.expect("neighborhood setup");
            async move { Err::<LayerResult, _>(ChoroplethError::DataSource("unreachable".to_string())) }
        })
        .build()
        .unwrap();
    let cache = LayerCache::new(registry, CachePolicy::CacheFailures);

    let first = cache.get_or_build(LayerId::Neighborhoods).await.unwrap_err();
    let second = cache.get_or_build(LayerId::Neighborhoods).await.unwrap_err();

    assert!(matches!(first, ChoroplethError::BuildFailed { layer: LayerId::Neighborhoods, .. }));
    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.stats().builds_started(), 1);
    assert_eq!(cache.stats().builds_failed(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_layers_build_independently() {
    let provider = slow_provider(0);
    let registry = [LayerId::LotScaleFootprints, LayerId::LotScaleLvPerAcre]
        .into_iter()
        .fold(LayerRegistry::builder(), |builder, id| {
            let provider = Arc::clone(&provider);
            builder.register(id, move || {
                let provider = Arc::clone(&provider);
                async move {
                    let source = SourceRef::new(LOTS);
                    let dataset = provider.load_dataset(&source).await?;
                    Ok::<_, ChoroplethError>(LayerResult {
                        id,
                        title: id.title().to_string(),
                        source,
                        rendering_field: None,
                        range: None,
                        stops: Vec::new(),
                        dataset,
                    })
                }
            })
        })
        .build()
        .unwrap();
    let cache = LayerCache::new(registry, CachePolicy::default());

    let (a, b) = tokio::join!(
        cache.get_or_build(LayerId::LotScaleFootprints),
        cache.get_or_build(LayerId::LotScaleLvPerAcre),
    );

    assert_eq!(a.unwrap().id, LayerId::LotScaleFootprints);
    assert_eq!(b.unwrap().id, LayerId::LotScaleLvPerAcre);
    assert_eq!(provider.loads(), 2);
    assert_eq!(cache.built_count(), 2);
}
