//! Layer storage for the choropleth service.
//!
//! Provides:
//! - The builder registry (`LayerId` → async constructor)
//! - The compute-once build cache shared by all requests
//! - A GeoJSON-backed [`DataProvider`](choropleth_common::DataProvider)

pub mod build_cache;
pub mod geojson;
pub mod registry;

pub use build_cache::{CachePolicy, LayerCache, LayerCacheStats, SharedBuild};
pub use geojson::{GeoJsonDataset, GeoJsonProvider};
pub use registry::{BuildFuture, LayerBuilder, LayerRegistry, LayerRegistryBuilder};
