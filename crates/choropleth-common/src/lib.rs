//! Common types and utilities shared across the choropleth layer crates.

pub mod color;
pub mod dataset;
pub mod error;
pub mod layer;
pub mod range;

pub use color::{Oklch, Rgb};
pub use dataset::{DataProvider, Dataset, MemoryDataset, SourceRef};
pub use error::{ChoroplethError, ChoroplethResult};
pub use layer::{ColorStop, LayerId, LayerResult};
pub use range::DomainRange;
