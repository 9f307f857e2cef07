//! Error types for choropleth layer construction.

use thiserror::Error;

use crate::LayerId;

/// Result type alias using ChoroplethError.
pub type ChoroplethResult<T> = Result<T, ChoroplethError>;

/// Primary error type for layer requests and builds.
///
/// Errors are `Clone` so a single failed build can be handed to every caller
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChoroplethError {
    // === Request Errors ===
    #[error("Layer not found: {0}")]
    LayerNotFound(LayerId),

    #[error("Unknown layer name: {0}")]
    UnknownLayer(String),

    // === Build Errors ===
    #[error("Building layer {layer} failed: {details}")]
    BuildFailed { layer: LayerId, details: String },

    #[error("Data source error: {0}")]
    DataSource(String),

    // === Registration Errors ===
    #[error("Layer registered more than once: {0}")]
    DuplicateLayer(LayerId),

    #[error("Layers missing a builder: {}", .0.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", "))]
    UnregisteredLayers(Vec<LayerId>),

    // === Configuration Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),
}

impl ChoroplethError {
    /// Short machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            ChoroplethError::LayerNotFound(_) | ChoroplethError::UnknownLayer(_) => "LayerNotFound",
            ChoroplethError::BuildFailed { .. } | ChoroplethError::DataSource(_) => "BuildFailed",
            ChoroplethError::DuplicateLayer(_) | ChoroplethError::UnregisteredLayers(_) => {
                "InvalidRegistry"
            }
            ChoroplethError::InvalidConfig(_) | ChoroplethError::InvalidColor(_) => "InvalidConfig",
        }
    }

    /// Wrap any error raised while building `layer`.
    ///
    /// A `BuildFailed` is passed through untouched so nesting never repeats the
    /// layer name.
    pub fn build_failed(layer: LayerId, err: impl Into<ChoroplethError>) -> Self {
        match err.into() {
            err @ ChoroplethError::BuildFailed { .. } => err,
            other => ChoroplethError::BuildFailed {
                layer,
                details: other.to_string(),
            },
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for ChoroplethError {
    fn from(err: std::io::Error) -> Self {
        ChoroplethError::DataSource(err.to_string())
    }
}

impl From<serde_json::Error> for ChoroplethError {
    fn from(err: serde_json::Error) -> Self {
        ChoroplethError::DataSource(format!("JSON error: {}", err))
    }
}
