//! Unique-value symbology for choropleth layers.
//!
//! There is no continuous renderer on the consumer side, so a continuous
//! gradient is expressed as one color stop per distinct attribute value.

use choropleth_common::{layer::canonical_bits, ColorStop, Dataset, DomainRange, Rgb};
use serde::Serialize;
use std::collections::HashMap;

use crate::gradient::OklchGradient;
use crate::numbers::NumberFormat;

/// Build one color stop per value, preserving input order.
pub fn build_symbology(values: &[f64], range: &DomainRange, gradient: &OklchGradient) -> Vec<ColorStop> {
    values
        .iter()
        .map(|&value| ColorStop {
            value,
            color: gradient.interpolate(value, range),
        })
        .collect()
}

/// Value → color table for one rendering field.
#[derive(Debug, Clone, Serialize)]
pub struct Symbology {
    pub field: String,
    pub stops: Vec<ColorStop>,
    #[serde(skip)]
    index: HashMap<u64, Rgb>,
}

impl Symbology {
    pub fn new(field: impl Into<String>, stops: Vec<ColorStop>) -> Self {
        let index = stops
            .iter()
            .map(|stop| (canonical_bits(stop.value), stop.color))
            .collect();
        Self {
            field: field.into(),
            stops,
            index,
        }
    }

    /// Extract, color and index `field` of `dataset` in one pass.
    pub fn from_dataset(
        dataset: &dyn Dataset,
        field: &str,
        range: &DomainRange,
        gradient: &OklchGradient,
        format: &NumberFormat,
    ) -> Self {
        let values = crate::domain::extract_distinct_values(dataset, field, format);
        Self::new(field, build_symbology(&values, range, gradient))
    }

    /// Exact-match color for `value`.
    pub fn lookup(&self, value: f64) -> Option<Rgb> {
        self.index.get(&canonical_bits(value)).copied()
    }

    /// Color for a record, parsing its field the same way extraction did.
    pub fn color_for_record(&self, dataset: &dyn Dataset, record: usize, format: &NumberFormat) -> Option<Rgb> {
        let text = dataset.field_value(record, &self.field);
        self.lookup(format.parse_or_zero(text.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn into_stops(self) -> Vec<ColorStop> {
        self.stops
    }
}
