//! GeoJSON data provider.
//!
//! Reads either a `FeatureCollection` document or newline-delimited features
//! (one `Feature` per line, optionally prefixed with the RFC 8142 record
//! separator). Properties are exposed as text; geometry is kept as raw JSON.

use async_trait::async_trait;
use choropleth_common::{ChoroplethError, ChoroplethResult, DataProvider, Dataset, SourceRef};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument};

const RECORD_SEPARATOR: char = '\u{1e}';

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    geometry: Value,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Document {
    FeatureCollection { features: Vec<Feature> },
    Feature(Feature),
}

/// Features loaded from a GeoJSON file.
#[derive(Debug, Clone, Default)]
pub struct GeoJsonDataset {
    properties: Vec<Map<String, Value>>,
    geometries: Vec<Value>,
}

impl GeoJsonDataset {
    /// Parse GeoJSON text in either supported layout.
    pub fn parse(text: &str) -> ChoroplethResult<Self> {
        let trimmed = text.trim_start_matches(['\u{feff}', RECORD_SEPARATOR]).trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        // A whole-document parse succeeds for a FeatureCollection or a single
        // Feature; anything else is treated as one feature per line.
        let features = match serde_json::from_str::<Document>(trimmed) {
            Ok(Document::FeatureCollection { features }) => features,
            Ok(Document::Feature(feature)) => vec![feature],
            Err(_) => Self::parse_lines(trimmed)?,
        };

        let mut dataset = Self::default();
        for feature in features {
            dataset.properties.push(feature.properties.unwrap_or_default());
            dataset.geometries.push(feature.geometry);
        }
        Ok(dataset)
    }

    fn parse_lines(text: &str) -> ChoroplethResult<Vec<Feature>> {
        text.lines()
            .enumerate()
            .map(|(n, line)| (n, line.trim_start_matches(RECORD_SEPARATOR).trim()))
            .filter(|(_, line)| !line.is_empty())
            .map(|(n, line)| {
                serde_json::from_str::<Feature>(line).map_err(|e| {
                    ChoroplethError::DataSource(format!("invalid feature on line {}: {}", n + 1, e))
                })
            })
            .collect()
    }

    /// Raw geometry of `record`, if any.
    pub fn geometry(&self, record: usize) -> Option<&Value> {
        self.geometries.get(record).filter(|g| !g.is_null())
    }
}

impl Dataset for GeoJsonDataset {
    fn record_count(&self) -> usize {
        self.properties.len()
    }

    fn field_value(&self, record: usize, field: &str) -> Option<String> {
        match self.properties.get(record)?.get(field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            // f64 Display never uses exponent notation, which the attribute
            // parser does not accept
            Value::Number(n) => Some(match n.as_f64() {
                Some(v) if n.is_f64() => v.to_string(),
                _ => n.to_string(),
            }),
            other => Some(other.to_string()),
        }
    }
}

/// Loads `.geojson` files from disk.
///
/// Relative sources resolve against `base_dir` when one is set.
#[derive(Debug, Clone, Default)]
pub struct GeoJsonProvider {
    base_dir: Option<PathBuf>,
}

impl GeoJsonProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    /// Filesystem path a source refers to.
    pub fn resolve(&self, source: &SourceRef) -> PathBuf {
        let path = Path::new(source.as_str());
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl DataProvider for GeoJsonProvider {
    #[instrument(skip(self, source), fields(source = %source))]
    async fn load_dataset(&self, source: &SourceRef) -> ChoroplethResult<Arc<dyn Dataset>> {
        let path = self.resolve(source);
        let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
            ChoroplethError::DataSource(format!("failed to read {}: {}", path.display(), e))
        })?;

        let dataset = GeoJsonDataset::parse(&text)?;
        debug!(
            path = %path.display(),
            features = dataset.record_count(),
            "Loaded GeoJSON dataset"
        );
        Ok(Arc::new(dataset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": null,
             "properties": {"land value/acre ($)": "$1,234.50", "building footprint": 0.25}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0, 0]},
             "properties": {"land value/acre ($)": null}}
        ]
    }"#;

    #[test]
    fn test_parse_feature_collection() {
        let dataset = GeoJsonDataset::parse(COLLECTION).unwrap();
        assert_eq!(dataset.record_count(), 2);
        assert_eq!(
            dataset.field_value(0, "land value/acre ($)").as_deref(),
            Some("$1,234.50")
        );
        assert_eq!(dataset.field_value(0, "building footprint").as_deref(), Some("0.25"));
        assert_eq!(dataset.field_value(1, "land value/acre ($)"), None);
        assert_eq!(dataset.field_value(1, "building footprint"), None);
        assert!(dataset.geometry(0).is_none());
        assert!(dataset.geometry(1).is_some());
    }

    #[test]
    fn test_parse_ndjson_with_record_separators() {
        let text = "\u{1e}{\"type\":\"Feature\",\"geometry\":null,\"properties\":{\"a\":1}}\n\n\
                    \u{1e}{\"type\":\"Feature\",\"geometry\":null,\"properties\":{\"a\":true}}\n";
        let dataset = GeoJsonDataset::parse(text).unwrap();
        assert_eq!(dataset.record_count(), 2);
        assert_eq!(dataset.field_value(0, "a").as_deref(), Some("1"));
        assert_eq!(dataset.field_value(1, "a").as_deref(), Some("true"));
    }

    #[test]
    fn test_parse_reports_bad_line() {
        let text = "{\"type\":\"Feature\",\"properties\":{}}\n{\"type\":\"Feature\",\"properties\":{}}\nnot json";
        let err = GeoJsonDataset::parse(text).unwrap_err();
        assert!(err.to_string().contains("line 3"), "{}", err);
    }

    #[test]
    fn test_numbers_are_plain_decimals() {
        let text = r#"{"type":"Feature","properties":{"tiny":0.000001,"huge":25000000000000000.0,"count":42}}"#;
        let dataset = GeoJsonDataset::parse(text).unwrap();
        assert_eq!(dataset.field_value(0, "tiny").as_deref(), Some("0.000001"));
        assert_eq!(dataset.field_value(0, "huge").as_deref(), Some("25000000000000000"));
        assert_eq!(dataset.field_value(0, "count").as_deref(), Some("42"));
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(GeoJsonDataset::parse("  \n").unwrap().record_count(), 0);
    }

    #[test]
    fn test_resolve_against_base_dir() {
        let provider = GeoJsonProvider::with_base_dir("/data");
        assert_eq!(
            provider.resolve(&SourceRef::new("lots.geojson")),
            PathBuf::from("/data/lots.geojson")
        );
        assert_eq!(
            provider.resolve(&SourceRef::new("/abs/lots.geojson")),
            PathBuf::from("/abs/lots.geojson")
        );
    }
}
