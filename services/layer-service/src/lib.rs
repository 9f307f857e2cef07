//! Choropleth layer service library.
//!
//! Configuration, the layer factory and the JSON views used by the
//! `layer-service` binary. Exposed as a library for integration tests.

pub mod config;
pub mod factory;
pub mod report;

pub use config::{LayerDefinition, ServiceConfig};
pub use factory::{LayerFactory, LayerSummary, WarmSummary};
pub use report::{FeatureReport, LayerReport};
