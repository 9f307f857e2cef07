//! Test data generators for creating synthetic lot attribute data.
//!
//! These generators create predictable, verifiable patterns that can be used
//! across the test suite and benchmarks.

use choropleth_common::MemoryDataset;

/// Formats a value the way the lot scraper writes money: `$1,234.50`.
///
/// # Example
///
/// ```
/// use test_utils::moneyfy;
///
/// assert_eq!(moneyfy(1234.5), "$1,234.50");
/// ```
pub fn moneyfy(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let digits = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// Creates `count` land values spread evenly over `[0, max]`.
///
/// Value `i` is `max * i / (count - 1)`, so the first is 0 and the last is
/// `max`. Every value is distinct when `count > 1`.
pub fn create_land_values(count: usize, max: f64) -> Vec<f64> {
    if count <= 1 {
        return vec![0.0; count];
    }
    let last = (count - 1) as f64;
    (0..count).map(|i| max * i as f64 / last).collect()
}

/// Creates a dataset of `count` lots whose `field` holds money strings.
///
/// Values cycle through `distinct` evenly spaced amounts in `[0, max]`, so
/// extraction should yield exactly `distinct.min(count)` values.
pub fn create_lot_dataset(field: &str, count: usize, distinct: usize, max: f64) -> MemoryDataset {
    let values = create_land_values(distinct.max(1), max);
    MemoryDataset::from_column(
        field,
        (0..count).map(|i| Some(moneyfy(values[i % values.len()]))),
    )
}
