//! Gradient style configuration.

use choropleth_common::{ChoroplethError, Oklch, Rgb};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::gradient::{rgb_to_oklch, OklchGradient, DEEP_BLUE, LIGHT_YELLOW};

/// Style configuration loaded from JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleConfig {
    #[serde(default = "default_version")]
    pub version: String,
    pub styles: HashMap<String, GradientStyle>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl StyleConfig {
    /// Load style configuration from JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ChoroplethError> {
        serde_json::from_str(json_str)
            .map_err(|e| ChoroplethError::InvalidConfig(format!("style JSON: {}", e)))
    }

    /// Load style configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ChoroplethError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Get a specific style definition
    pub fn get_style(&self, name: &str) -> Option<&GradientStyle> {
        self.styles.get(name)
    }

    /// Validate every style.
    pub fn validate(&self) -> Result<(), ChoroplethError> {
        for (name, style) in &self.styles {
            style
                .to_gradient()
                .map_err(|e| ChoroplethError::InvalidConfig(format!("style {}: {}", name, e)))?;
        }
        Ok(())
    }
}

/// A gradient endpoint, written either as OKLCH components or as a hex color.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Endpoint {
    Hex(String),
    Oklch(Oklch),
}

impl Endpoint {
    pub fn resolve(&self) -> Result<Oklch, ChoroplethError> {
        let color = match self {
            Endpoint::Hex(hex) => rgb_to_oklch(&Rgb::from_hex(hex)?),
            Endpoint::Oklch(color) => *color,
        };
        color.validate().map_err(ChoroplethError::InvalidColor)?;
        Ok(color)
    }
}

/// Two-stop gradient style.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GradientStyle {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_start")]
    pub start: Endpoint,
    #[serde(default = "default_end")]
    pub end: Endpoint,
}

fn default_start() -> Endpoint {
    Endpoint::Oklch(LIGHT_YELLOW)
}

fn default_end() -> Endpoint {
    Endpoint::Oklch(DEEP_BLUE)
}

impl Default for GradientStyle {
    fn default() -> Self {
        Self {
            name: "land_value".to_string(),
            description: Some("Light yellow to deep blue".to_string()),
            start: default_start(),
            end: default_end(),
        }
    }
}

impl GradientStyle {
    /// Resolve endpoints into a gradient.
    pub fn to_gradient(&self) -> Result<OklchGradient, ChoroplethError> {
        Ok(OklchGradient::new(self.start.resolve()?, self.end.resolve()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style_is_land_value_gradient() {
        let gradient = GradientStyle::default().to_gradient().unwrap();
        assert_eq!(gradient, OklchGradient::default());
    }

    #[test]
    fn test_hex_endpoint_resolves() {
        let endpoint = Endpoint::Hex("#081d58".to_string());
        let color = endpoint.resolve().unwrap();
        assert!((color.l - 0.2604).abs() < 0.001);
        assert!((color.h - 264.57).abs() < 0.1);
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(Endpoint::Hex("#zzzzzz".to_string()).resolve().is_err());
        assert!(Endpoint::Oklch(Oklch::new(2.0, 0.1, 0.0)).resolve().is_err());
    }
}
