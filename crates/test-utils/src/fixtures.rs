//! Common test fixtures for choropleth layer tests.
//!
//! This module provides pre-defined data that mirrors what the lot scraper
//! writes: currency-formatted land values, some dirty records, and small
//! square lot polygons.

use choropleth_common::MemoryDataset;
use serde_json::{json, Map, Value};

/// Gradient endpoints used by the land-value layers.
pub mod endpoints {
    use choropleth_common::{Oklch, Rgb};

    /// Light yellow
    pub const START: Oklch = Oklch::new(0.9904, 0.0491, 107.26);

    /// Deep blue
    pub const END: Oklch = Oklch::new(0.2604, 0.1097, 264.57);

    /// `START` converted to 8-bit sRGB
    pub const START_RGB: Rgb = Rgb::new(255, 255, 217);

    /// `END` converted to 8-bit sRGB
    pub const END_RGB: Rgb = Rgb::new(8, 29, 88);

    /// Color at the middle of the domain (eased t = 0.5)
    pub const MIDPOINT_RGB: Rgb = Rgb::new(72, 151, 143);
}

/// Attribute names written by the lot scraper.
pub mod fields {
    pub const ADDRESS: &str = "address";
    pub const LAND_USE: &str = "land use";
    pub const LOT_SIZE: &str = "lot size (acres)";
    pub const LAND_VALUE: &str = "land value/acre ($)";
    pub const FOOTPRINT: &str = "building footprint";
}

/// Lot records: (address, land use, lot size, land value/acre, footprint).
///
/// Includes one duplicate land value, one unparseable value and one null.
pub const LOTS: &[(&str, &str, &str, Option<&str>, Option<&str>)] = &[
    ("1800 8th Ct West Linn, OR 97068", "SINGLE-FAMILY", "0.2296", Some("$1,234,567.89"), Some("0.31")),
    ("2150 Blankenship Rd West Linn, OR 97068", "COMMERCIAL", "1.1021", Some("$4,500,000.00"), Some("0.62")),
    ("19300 Willamette Dr West Linn, OR 97068", "MULTI-FAMILY", "0.5112", Some("$1,234,567.89"), Some("0.44")),
    ("5 Failing St West Linn, OR 97068", "SINGLE-FAMILY", "0.1800", Some("N/A"), Some("0.27")),
    ("22 Lazy River Ct West Linn, OR 97068", "SINGLE-FAMILY", "0.3030", None, None),
    ("4000 Summit St West Linn, OR 97068", "SINGLE-FAMILY", "0.2500", Some("$25,000,000.00"), Some("0.19")),
];

/// Distinct land values in [`LOTS`], sorted, with dirty records as `0.0`.
pub const LOT_LAND_VALUES: &[f64] = &[0.0, 1_234_567.89, 4_500_000.0, 25_000_000.0];

/// [`LOTS`] as an in-memory dataset.
pub fn lots_dataset() -> MemoryDataset {
    let mut dataset = MemoryDataset::new();
    for (address, land_use, size, value, footprint) in LOTS {
        dataset.push([
            (fields::ADDRESS, Some(address.to_string())),
            (fields::LAND_USE, Some(land_use.to_string())),
            (fields::LOT_SIZE, Some(size.to_string())),
            (fields::LAND_VALUE, value.map(str::to_string)),
            (fields::FOOTPRINT, footprint.map(str::to_string)),
        ]);
    }
    dataset
}

/// [`LOTS`] as GeoJSON features with small square polygons.
pub fn lot_features() -> Vec<Value> {
    LOTS.iter()
        .enumerate()
        .map(|(i, (address, land_use, size, value, footprint))| {
            let x = -122.64 + i as f64 * 0.001;
            let y = 45.36;
            let mut properties = Map::new();
            properties.insert(fields::ADDRESS.to_string(), json!(address));
            properties.insert(fields::LAND_USE.to_string(), json!(land_use));
            properties.insert(fields::LOT_SIZE.to_string(), json!(size));
            properties.insert(fields::LAND_VALUE.to_string(), json!(value));
            properties.insert(
                fields::FOOTPRINT.to_string(),
                json!(footprint.and_then(|f| f.parse::<f64>().ok())),
            );

            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [x, y], [x + 0.0005, y], [x + 0.0005, y + 0.0005], [x, y + 0.0005], [x, y]
                    ]]
                },
                "properties": properties,
            })
        })
        .collect()
}

/// [`LOTS`] as a GeoJSON FeatureCollection document.
pub fn lots_feature_collection() -> String {
    json!({
        "type": "FeatureCollection",
        "features": lot_features(),
    })
    .to_string()
}

/// [`LOTS`] as newline-delimited GeoJSON features.
pub fn lots_ndjson() -> String {
    lot_features()
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
