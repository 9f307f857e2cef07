//! Choropleth symbology for land-value map layers.
//!
//! - Two-stop OKLCH gradient ([`gradient`])
//! - Currency-aware attribute parsing ([`numbers`])
//! - Distinct-value extraction ([`domain`])
//! - Unique-value symbology assembly ([`symbology`])
//! - Gradient style configuration ([`style`])

pub mod domain;
pub mod gradient;
pub mod numbers;
pub mod style;
pub mod symbology;

pub use domain::{extract_distinct_values, value_bounds};
pub use gradient::OklchGradient;
pub use numbers::NumberFormat;
pub use style::{GradientStyle, StyleConfig};
pub use symbology::{build_symbology, Symbology};
