//! Service configuration loader.
//!
//! Layers, gradient styles, number format and cache policy come from a single
//! YAML file (`config/layers.yaml` by default). A few settings can be
//! overridden from the environment:
//!
//! - `LAYER_CACHE_POLICY`: `cache_failures` or `retry_on_failure`
//! - `LAYER_DATA_DIR`: directory relative data sources resolve against

use anyhow::{bail, Context, Result};
use choropleth_common::{DomainRange, LayerId, SourceRef};
use renderer::{GradientStyle, NumberFormat, StyleConfig};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use storage::CachePolicy;
use tracing::{debug, info};

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// What to do with failed layer builds
    #[serde(default)]
    pub cache_policy: CachePolicy,

    /// Base directory for relative layer sources
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// How attribute text is parsed into numbers
    #[serde(default)]
    pub number_format: NumberFormat,

    /// Optional JSON style file merged into `styles`
    #[serde(default)]
    pub style_file: Option<PathBuf>,

    /// Named gradient styles
    #[serde(default)]
    pub styles: HashMap<String, GradientStyle>,

    /// Refuse to start unless every known layer is configured
    #[serde(default)]
    pub require_all_layers: bool,

    /// Layer definitions
    #[serde(default)]
    pub layers: Vec<LayerDefinition>,
}

/// One configured layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayerDefinition {
    /// Layer id, snake_case or the legacy PascalCase name
    pub id: LayerId,

    /// Display title; defaults to the id's built-in title
    #[serde(default)]
    pub title: Option<String>,

    /// Data source reference
    pub source: SourceRef,

    /// Attribute driving the colors; layers without one get no stops
    #[serde(default)]
    pub rendering_field: Option<String>,

    /// Fixed normalization range; derived from the data when omitted
    #[serde(default)]
    pub range: Option<DomainRange>,

    /// Name of the gradient style; the default land-value gradient when omitted
    #[serde(default)]
    pub style: Option<String>,
}

impl LayerDefinition {
    pub fn title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| self.id.title().to_string())
    }
}

impl ServiceConfig {
    /// Load configuration from a YAML file, apply environment overrides and
    /// validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading layer configuration");

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.load_style_file(base)?;
        config.apply_env_overrides()?;
        config.validate()?;

        info!(
            layers = config.layers.len(),
            styles = config.styles.len(),
            policy = ?config.cache_policy,
            "Layer configuration loaded"
        );
        Ok(config)
    }

    /// Parse configuration without touching the filesystem or environment.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Invalid layer configuration YAML")
    }

    /// Merge styles from `style_file` (resolved against `base`), keeping
    /// inline styles on name clashes.
    pub fn load_style_file(&mut self, base: &Path) -> Result<()> {
        let Some(file) = &self.style_file else {
            return Ok(());
        };
        let path = if file.is_relative() {
            base.join(file)
        } else {
            file.clone()
        };

        let styles = StyleConfig::from_file(&path)
            .with_context(|| format!("Failed to load styles from {}", path.display()))?;
        debug!(path = %path.display(), count = styles.styles.len(), "Loaded style file");

        for (name, style) in styles.styles {
            self.styles.entry(name).or_insert(style);
        }
        Ok(())
    }

    /// Apply `LAYER_CACHE_POLICY` and `LAYER_DATA_DIR` from the environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(policy) = lookup("LAYER_CACHE_POLICY") {
            self.cache_policy = policy
                .parse()
                .context("Invalid LAYER_CACHE_POLICY")?;
            debug!(policy = ?self.cache_policy, "Cache policy overridden from environment");
        }
        if let Some(dir) = lookup("LAYER_DATA_DIR").filter(|d| !d.is_empty()) {
            debug!(data_dir = %dir, "Data directory overridden from environment");
            self.data_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    /// The gradient style a layer uses.
    pub fn style_for(&self, layer: &LayerDefinition) -> Option<GradientStyle> {
        match &layer.style {
            Some(name) => self.styles.get(name).cloned(),
            None => Some(GradientStyle::default()),
        }
    }

    pub fn layer(&self, id: LayerId) -> Option<&LayerDefinition> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    /// Check layer definitions for consistency.
    pub fn validate(&self) -> Result<()> {
        self.number_format
            .validate()
            .context("Invalid number_format")?;

        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(layer.id) {
                bail!("Layer {} is configured more than once", layer.id);
            }

            if layer.source.as_str().trim().is_empty() {
                bail!("Layer {} has an empty source", layer.id);
            }

            if let Some(field) = &layer.rendering_field {
                if field.trim().is_empty() {
                    bail!("Layer {} has an empty rendering_field", layer.id);
                }
            }

            if let Some(range) = &layer.range {
                if !range.min.is_finite() || !range.max.is_finite() || range.min > range.max {
                    bail!(
                        "Layer {} has an invalid range [{}, {}]",
                        layer.id,
                        range.min,
                        range.max
                    );
                }
            }

            let style = self.style_for(layer).with_context(|| {
                format!(
                    "Layer {} refers to unknown style '{}'",
                    layer.id,
                    layer.style.as_deref().unwrap_or_default()
                )
            })?;
            style
                .to_gradient()
                .with_context(|| format!("Layer {} has an invalid style", layer.id))?;
        }

        if self.require_all_layers {
            let missing: Vec<String> = LayerId::ALL
                .into_iter()
                .filter(|id| !seen.contains(id))
                .map(|id| id.to_string())
                .collect();
            if !missing.is_empty() {
                bail!("Layers not configured: {}", missing.join(", "));
            }
        }

        Ok(())
    }
}
