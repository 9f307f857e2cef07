//! Layer factory.
//!
//! Turns the configured layer definitions into registered builders and serves
//! built layers through the shared [`LayerCache`]. A build loads the dataset,
//! extracts the distinct values of the rendering field, resolves the
//! normalization range and assigns one color stop per value.

use choropleth_common::{
    ChoroplethError, ChoroplethResult, DataProvider, DomainRange, LayerId, LayerResult,
};
use futures::future::join_all;
use renderer::{build_symbology, extract_distinct_values, value_bounds, NumberFormat, OklchGradient};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use storage::{LayerCache, LayerCacheStats, LayerRegistry};
use tracing::{debug, info, warn};

use crate::config::{LayerDefinition, ServiceConfig};

/// Listing entry for a configured layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub id: LayerId,
    pub title: String,
    pub source: String,
    pub rendering_field: Option<String>,
    pub built: bool,
}

/// Outcome of [`LayerFactory::warm_all`].
#[derive(Debug, Default)]
pub struct WarmSummary {
    pub built: Vec<LayerId>,
    pub failed: Vec<(LayerId, ChoroplethError)>,
    pub duration: Duration,
}

impl WarmSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Builds and caches the configured layers.
pub struct LayerFactory {
    config: Arc<ServiceConfig>,
    gradients: HashMap<LayerId, OklchGradient>,
    cache: LayerCache,
}

impl LayerFactory {
    /// Register a builder for every configured layer.
    ///
    /// Fails on duplicate layers, unresolvable styles, or (with
    /// `require_all_layers`) layers without a definition.
    pub fn new(config: ServiceConfig, provider: Arc<dyn DataProvider>) -> ChoroplethResult<Self> {
        let config = Arc::new(config);
        let format = Arc::new(config.number_format.clone());

        let mut gradients = HashMap::new();
        let mut registry = LayerRegistry::builder();

        for definition in &config.layers {
            let gradient = resolve_gradient(&config, definition)?;
            gradients.insert(definition.id, gradient);

            let definition = Arc::new(definition.clone());
            let provider = Arc::clone(&provider);
            let format = Arc::clone(&format);
            registry = registry.register(definition.id, move || {
                build_layer(
                    Arc::clone(&definition),
                    gradient,
                    Arc::clone(&format),
                    Arc::clone(&provider),
                )
            });
        }

        if config.require_all_layers {
            registry = registry.require_all();
        }

        let cache = LayerCache::new(registry.build()?, config.cache_policy);
        info!(layers = gradients.len(), "Layer factory ready");

        Ok(Self {
            config,
            gradients,
            cache,
        })
    }

    /// Return the built layer for `id`, building it on first request.
    pub async fn request_layer(&self, id: LayerId) -> ChoroplethResult<Arc<LayerResult>> {
        self.cache.get_or_build(id).await
    }

    /// Build every configured layer concurrently.
    pub async fn warm_all(&self) -> WarmSummary {
        let ids = self.cache.ids();
        info!(layers = ids.len(), "Starting layer warming");
        let start = Instant::now();

        let results = join_all(ids.iter().map(|&id| async move {
            (id, self.request_layer(id).await)
        }))
        .await;

        let mut summary = WarmSummary::default();
        for (id, result) in results {
            match result {
                Ok(layer) => {
                    debug!(layer = %id, stops = layer.stops.len(), "Layer warmed");
                    summary.built.push(id);
                }
                Err(err) => {
                    warn!(layer = %id, error = %err, "Layer warming failed");
                    summary.failed.push((id, err));
                }
            }
        }
        summary.duration = start.elapsed();

        info!(
            duration_ms = summary.duration.as_millis() as u64,
            built = summary.built.len(),
            failed = summary.failed.len(),
            "Layer warming complete"
        );
        summary
    }

    /// Configured layers in `LayerId` order.
    pub fn list(&self) -> Vec<LayerSummary> {
        self.cache
            .ids()
            .into_iter()
            .filter_map(|id| self.config.layer(id))
            .map(|definition| LayerSummary {
                id: definition.id,
                title: definition.title(),
                source: definition.source.to_string(),
                rendering_field: definition.rendering_field.clone(),
                built: self.cache.is_built(definition.id),
            })
            .collect()
    }

    pub fn gradient(&self, id: LayerId) -> Option<&OklchGradient> {
        self.gradients.get(&id)
    }

    pub fn number_format(&self) -> &NumberFormat {
        &self.config.number_format
    }

    pub fn stats(&self) -> &LayerCacheStats {
        self.cache.stats()
    }
}

fn resolve_gradient(config: &ServiceConfig, definition: &LayerDefinition) -> ChoroplethResult<OklchGradient> {
    let style = config.style_for(definition).ok_or_else(|| {
        ChoroplethError::InvalidConfig(format!(
            "layer {} refers to unknown style '{}'",
            definition.id,
            definition.style.as_deref().unwrap_or_default()
        ))
    })?;
    style.to_gradient()
}

async fn build_layer(
    definition: Arc<LayerDefinition>,
    gradient: OklchGradient,
    format: Arc<NumberFormat>,
    provider: Arc<dyn DataProvider>,
) -> ChoroplethResult<LayerResult> {
    let dataset = provider.load_dataset(&definition.source).await?;

    let (range, stops) = match &definition.rendering_field {
        Some(field) => {
            let values = extract_distinct_values(dataset.as_ref(), field, &format);
            let range = definition
                .range
                .or_else(|| value_bounds(&values))
                .unwrap_or(DomainRange::new(0.0, 0.0));
            debug!(
                layer = %definition.id,
                field = %field,
                distinct = values.len(),
                min = range.min,
                max = range.max,
                "Assigning layer colors"
            );
            (Some(range), build_symbology(&values, &range, &gradient))
        }
        None => (definition.range, Vec::new()),
    };

    Ok(LayerResult {
        id: definition.id,
        title: definition.title(),
        source: definition.source.clone(),
        rendering_field: definition.rendering_field.clone(),
        range,
        stops,
        dataset,
    })
}
