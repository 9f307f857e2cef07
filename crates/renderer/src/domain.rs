//! Distinct-value extraction for a rendering field.

use choropleth_common::{layer::canonical_bits, Dataset, DomainRange};
use tracing::debug;

use crate::numbers::NumberFormat;

/// Collect the distinct numeric values of `field` across `dataset`.
///
/// Missing, null and unparseable values all count as `0.0`; dirty records
/// never abort extraction. The result is sorted ascending and contains no
/// duplicates (`-0.0` is folded into `0.0`).
pub fn extract_distinct_values(dataset: &dyn Dataset, field: &str, format: &NumberFormat) -> Vec<f64> {
    let records = dataset.record_count();
    let mut unparsed = 0usize;

    let mut values: Vec<f64> = (0..records)
        .map(|record| {
            let text = dataset.field_value(record, field);
            match text.as_deref().and_then(|t| format.parse(t)) {
                Some(value) => value + 0.0,
                None => {
                    unparsed += 1;
                    0.0
                }
            }
        })
        .collect();

    values.sort_by(f64::total_cmp);
    values.dedup_by_key(|v| canonical_bits(*v));

    debug!(
        field = field,
        records = records,
        distinct = values.len(),
        defaulted_to_zero = unparsed,
        "Extracted distinct values"
    );

    values
}

/// Smallest range covering all `values`, or None for an empty slice.
pub fn value_bounds(values: &[f64]) -> Option<DomainRange> {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            Some((min, max)) => Some((min.min(v), max.max(v))),
            None => Some((v, v)),
        })?;
    Some(DomainRange::new(min, max))
}
