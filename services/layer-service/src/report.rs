//! JSON views of built layers for the command line.

use choropleth_common::{ColorStop, DomainRange, LayerId, LayerResult};
use renderer::{NumberFormat, OklchGradient, Symbology};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopEntry {
    pub value: f64,
    pub label: String,
    pub color: String,
}

/// A built layer with labelled color stops.
#[derive(Debug, Clone, Serialize)]
pub struct LayerReport {
    pub id: LayerId,
    pub title: String,
    pub source: String,
    pub rendering_field: Option<String>,
    pub range: Option<DomainRange>,
    pub features: usize,
    pub stops: Vec<StopEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub legend: Vec<StopEntry>,
}

impl LayerReport {
    /// Describe `layer`; with `legend_steps > 0` also sample the gradient over
    /// the layer's range.
    pub fn new(
        layer: &LayerResult,
        format: &NumberFormat,
        gradient: Option<&OklchGradient>,
        legend_steps: usize,
    ) -> Self {
        let currency = layer
            .rendering_field
            .as_deref()
            .is_some_and(|field| {
                !format.currency_symbol.is_empty() && field.contains(format.currency_symbol.as_str())
            });
        let entry = |stop: &ColorStop| StopEntry {
            value: stop.value,
            label: if currency {
                format.format_currency(stop.value)
            } else {
                stop.value.to_string()
            },
            color: stop.color.to_hex(),
        };

        let legend = match (gradient, layer.range) {
            (Some(gradient), Some(range)) => gradient.sample(&range, legend_steps),
            _ => Vec::new(),
        };

        Self {
            id: layer.id,
            title: layer.title.clone(),
            source: layer.source.to_string(),
            rendering_field: layer.rendering_field.clone(),
            range: layer.range,
            features: layer.feature_count(),
            stops: layer.stops.iter().map(entry).collect(),
            legend: legend.iter().map(entry).collect(),
        }
    }
}

/// One feature of a built layer: its rendering value and fill color.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureReport {
    pub layer: LayerId,
    pub record: usize,
    pub value: Option<String>,
    pub color: Option<String>,
}

impl FeatureReport {
    /// `None` when `record` is out of range.
    pub fn new(layer: &LayerResult, record: usize, format: &NumberFormat) -> Option<Self> {
        if record >= layer.feature_count() {
            return None;
        }
        let dataset = layer.dataset.as_ref();

        let (value, color) = match &layer.rendering_field {
            Some(field) => {
                let symbology = Symbology::new(field.as_str(), layer.stops.clone());
                (
                    dataset.field_value(record, field),
                    symbology
                        .color_for_record(dataset, record, format)
                        .map(|c| c.to_hex()),
                )
            }
            None => (None, None),
        };

        Some(Self {
            layer: layer.id,
            record,
            value,
            color,
        })
    }
}
