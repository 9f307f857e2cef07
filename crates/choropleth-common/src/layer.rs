//! Layer identifiers and built layer results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::{ChoroplethError, Dataset, DomainRange, Rgb, SourceRef};

/// Identifier of a named map view.
///
/// The set is closed: every layer the application can show has a variant here,
/// whether or not a builder is registered for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerId {
    #[serde(alias = "BuildingFootprint")]
    BuildingFootprint,
    #[serde(alias = "LandValuePerAcre")]
    LandValuePerAcre,
    #[serde(alias = "NetInfrastructureDeficit")]
    NetInfrastructureDeficit,
    #[serde(alias = "LandUseClassification")]
    LandUseClassification,
    #[serde(alias = "AverageBuildingFootprint")]
    AverageBuildingFootprint,
    #[serde(alias = "AverageLandValuePerAcre")]
    AverageLandValuePerAcre,
    #[serde(alias = "LotScaleFootprints")]
    LotScaleFootprints,
    #[serde(alias = "LotScale_LV_PerAcre")]
    LotScaleLvPerAcre,
    #[serde(alias = "Neighborhoods")]
    Neighborhoods,
}

impl LayerId {
    /// Every layer identifier, in display order.
    pub const ALL: [LayerId; 9] = [
        LayerId::BuildingFootprint,
        LayerId::LandValuePerAcre,
        LayerId::NetInfrastructureDeficit,
        LayerId::LandUseClassification,
        LayerId::AverageBuildingFootprint,
        LayerId::AverageLandValuePerAcre,
        LayerId::LotScaleFootprints,
        LayerId::LotScaleLvPerAcre,
        LayerId::Neighborhoods,
    ];

    /// Canonical snake_case name, as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            LayerId::BuildingFootprint => "building_footprint",
            LayerId::LandValuePerAcre => "land_value_per_acre",
            LayerId::NetInfrastructureDeficit => "net_infrastructure_deficit",
            LayerId::LandUseClassification => "land_use_classification",
            LayerId::AverageBuildingFootprint => "average_building_footprint",
            LayerId::AverageLandValuePerAcre => "average_land_value_per_acre",
            LayerId::LotScaleFootprints => "lot_scale_footprints",
            LayerId::LotScaleLvPerAcre => "lot_scale_lv_per_acre",
            LayerId::Neighborhoods => "neighborhoods",
        }
    }

    /// Legacy PascalCase spelling used by older desktop builds.
    fn legacy_name(&self) -> &'static str {
        match self {
            LayerId::BuildingFootprint => "BuildingFootprint",
            LayerId::LandValuePerAcre => "LandValuePerAcre",
            LayerId::NetInfrastructureDeficit => "NetInfrastructureDeficit",
            LayerId::LandUseClassification => "LandUseClassification",
            LayerId::AverageBuildingFootprint => "AverageBuildingFootprint",
            LayerId::AverageLandValuePerAcre => "AverageLandValuePerAcre",
            LayerId::LotScaleFootprints => "LotScaleFootprints",
            LayerId::LotScaleLvPerAcre => "LotScale_LV_PerAcre",
            LayerId::Neighborhoods => "Neighborhoods",
        }
    }

    /// Default human-readable title.
    pub fn title(&self) -> &'static str {
        match self {
            LayerId::BuildingFootprint => "Building Footprint",
            LayerId::LandValuePerAcre => "Land Value per Acre",
            LayerId::NetInfrastructureDeficit => "Net Infrastructure Deficit",
            LayerId::LandUseClassification => "Land Use Classification",
            LayerId::AverageBuildingFootprint => "Average Building Footprint",
            LayerId::AverageLandValuePerAcre => "Average Land Value per Acre",
            LayerId::LotScaleFootprints => "Lot Scale Footprints",
            LayerId::LotScaleLvPerAcre => "Lot Scale Land Value per Acre",
            LayerId::Neighborhoods => "Neighborhoods",
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayerId {
    type Err = ChoroplethError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        LayerId::ALL
            .into_iter()
            .find(|id| id.name() == s || id.legacy_name() == s)
            .ok_or_else(|| ChoroplethError::UnknownLayer(s.to_string()))
    }
}

/// A fill color assigned to one distinct attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub value: f64,
    pub color: Rgb,
}

/// A fully built layer: the loaded dataset plus its value → color legend.
#[derive(Clone)]
pub struct LayerResult {
    /// Layer identifier
    pub id: LayerId,

    /// Human-readable title
    pub title: String,

    /// Where the data was loaded from
    pub source: SourceRef,

    /// Attribute the layer is colored by (None for outline-only layers)
    pub rendering_field: Option<String>,

    /// Normalization bounds used for the gradient
    pub range: Option<DomainRange>,

    /// One color stop per distinct value of the rendering field
    pub stops: Vec<ColorStop>,

    /// Loaded features
    pub dataset: Arc<dyn Dataset>,
}

impl LayerResult {
    /// Number of features in the underlying dataset.
    pub fn feature_count(&self) -> usize {
        self.dataset.record_count()
    }

    /// Exact-match lookup of the fill color for `value`.
    pub fn color_for(&self, value: f64) -> Option<Rgb> {
        let key = canonical_bits(value);
        self.stops
            .iter()
            .find(|stop| canonical_bits(stop.value) == key)
            .map(|stop| stop.color)
    }
}

impl fmt::Debug for LayerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerResult")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("source", &self.source)
            .field("rendering_field", &self.rendering_field)
            .field("range", &self.range)
            .field("stops", &self.stops.len())
            .field("features", &self.feature_count())
            .finish()
    }
}

/// Bit pattern used for value identity. `-0.0` and `0.0` compare equal.
pub fn canonical_bits(value: f64) -> u64 {
    (value + 0.0).to_bits()
}
