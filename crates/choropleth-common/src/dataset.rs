//! Data source abstractions.
//!
//! The layer builders only ever need to read attribute values as text, so the
//! [`Dataset`] trait is deliberately narrow. Any backing store (GeoJSON file,
//! geopackage, database table) can implement it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ChoroplethResult;

/// Reference to a data source (a file path, table name or connection string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRef(pub String);

impl SourceRef {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A loaded collection of feature records.
pub trait Dataset: Send + Sync {
    /// Number of records.
    fn record_count(&self) -> usize;

    /// Textual value of `field` for `record`, or None when the field is
    /// missing or null.
    fn field_value(&self, record: usize, field: &str) -> Option<String>;
}

/// Loads datasets from some backing store.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn load_dataset(&self, source: &SourceRef) -> ChoroplethResult<Arc<dyn Dataset>>;
}

/// Dataset held entirely in memory. Mostly useful in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    records: Vec<HashMap<String, Option<String>>>,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset where every record has a single `field`.
    pub fn from_column<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let mut dataset = Self::new();
        for value in values {
            dataset.push([(field, value.map(Into::into))]);
        }
        dataset
    }

    /// Append a record.
    pub fn push<'a, I>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (&'a str, Option<String>)>,
    {
        self.records.push(
            fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        );
    }
}

impl Dataset for MemoryDataset {
    fn record_count(&self) -> usize {
        self.records.len()
    }

    fn field_value(&self, record: usize, field: &str) -> Option<String> {
        self.records.get(record)?.get(field)?.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_dataset_column() {
        let dataset = MemoryDataset::from_column("land use", [Some("SINGLE-FAMILY"), None]);
        assert_eq!(dataset.record_count(), 2);
        assert_eq!(
            dataset.field_value(0, "land use").as_deref(),
            Some("SINGLE-FAMILY")
        );
        assert_eq!(dataset.field_value(1, "land use"), None);
        assert_eq!(dataset.field_value(0, "address"), None);
        assert_eq!(dataset.field_value(7, "land use"), None);
    }
}
