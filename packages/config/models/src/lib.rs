#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dashboard configuration schema.
//!
//! Describes every dataset the department and comparison selects can load,
//! the toggleable overlays, the static reference layers, the color ramps,
//! and the light/dark basemap themes. Deserialized from TOML.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Basemap theme selected by the theme radio group.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    /// Light basemap with dark outlines.
    #[default]
    Light,
    /// Dark basemap with light outlines.
    Dark,
}

/// Top-level dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Number of Jenks classes for every choropleth.
    #[serde(default = "default_class_count")]
    pub class_count: usize,
    /// Dataset loaded into the primary map on startup.
    pub default_dataset: String,
    /// Hex geometry shared by both map surfaces.
    pub hex: HexConfig,
    /// Layer ids for the primary map surface.
    pub primary: SurfaceLayout,
    /// Layer ids for the comparison map surface.
    pub comparison: SurfaceLayout,
    /// Named color ramps, lightest first.
    pub ramps: BTreeMap<String, Vec<String>>,
    /// Selectable metric datasets.
    #[serde(default)]
    pub datasets: Vec<DatasetDef>,
    /// Toggleable overlays (drivetime polygons, points of interest).
    #[serde(default)]
    pub overlays: Vec<OverlayDef>,
    /// Always-on reference layers (county outlines and labels).
    #[serde(default)]
    pub reference_layers: Vec<ReferenceLayerDef>,
    /// Basemap styling per theme.
    pub themes: ThemeSet,
}

const fn default_class_count() -> usize {
    5
}

impl DashboardConfig {
    /// Looks up a dataset by id.
    #[must_use]
    pub fn dataset(&self, id: &str) -> Option<&DatasetDef> {
        self.datasets.iter().find(|d| d.id == id)
    }

    /// Looks up an overlay by id.
    #[must_use]
    pub fn overlay(&self, id: &str) -> Option<&OverlayDef> {
        self.overlays.iter().find(|o| o.id == id)
    }

    /// Returns the colors of a named ramp.
    #[must_use]
    pub fn ramp(&self, name: &str) -> Option<&[String]> {
        self.ramps.get(name).map(Vec::as_slice)
    }

    /// Returns the styling for a theme.
    #[must_use]
    pub const fn theme(&self, theme: Theme) -> &ThemeStyle {
        match theme {
            Theme::Light => &self.themes.light,
            Theme::Dark => &self.themes.dark,
        }
    }

    /// Datasets offered in the comparison select.
    pub fn comparison_datasets(&self) -> impl Iterator<Item = &DatasetDef> {
        self.datasets.iter().filter(|d| d.comparison)
    }
}

/// Hex bin geometry and its join key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HexConfig {
    /// Path of the hex `GeoJSON` `FeatureCollection`.
    pub path: String,
    /// Feature property holding the hex id.
    pub join_key: String,
    /// Source id the hex collection is registered under.
    pub source_id: String,
    /// Fill opacity of the choropleth layer.
    #[serde(default = "default_fill_opacity")]
    pub fill_opacity: f64,
    /// Hex outline color.
    pub outline_color: String,
    /// Hex outline width in pixels.
    #[serde(default = "default_line_width")]
    pub outline_width: f64,
}

const fn default_fill_opacity() -> f64 {
    0.7
}

const fn default_line_width() -> f64 {
    1.0
}

/// Layer and legend ids used on one map surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceLayout {
    /// Choropleth fill layer id.
    pub fill_layer_id: String,
    /// Hex outline layer id.
    pub outline_layer_id: String,
    /// Legend list id.
    pub legend_id: String,
    /// Property the joined metric is written to.
    pub metric_property: String,
}

/// A selectable metric dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetDef {
    /// Unique id used by the selects (e.g. `"All"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Path of the metric CSV.
    pub path: String,
    /// CSV column holding the join key.
    pub key_column: String,
    /// CSV column holding the metric.
    pub value_column: String,
    /// Name of the color ramp in [`DashboardConfig::ramps`].
    pub ramp: String,
    /// Prefix for legend values (e.g. `"$"`).
    #[serde(default)]
    pub currency_prefix: Option<String>,
    /// Suffix for legend values (e.g. `"%"`).
    #[serde(default)]
    pub unit_suffix: Option<String>,
    /// Whether the dataset is offered in the comparison select.
    #[serde(default)]
    pub comparison: bool,
}

/// Geometry type an overlay is drawn with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OverlayKind {
    /// Polygon outlines.
    Line,
    /// Filled polygons.
    Fill,
    /// Point markers.
    Circle,
}

impl OverlayKind {
    /// Paint property controlling this kind's color.
    #[must_use]
    pub const fn color_property(self) -> &'static str {
        match self {
            Self::Line => "line-color",
            Self::Fill => "fill-color",
            Self::Circle => "circle-color",
        }
    }
}

/// A toggleable overlay layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayDef {
    /// Layer id, also the toggle id (e.g. `"drivetime-10"`).
    pub id: String,
    /// Human-readable label.
    pub name: String,
    /// Path of the overlay `GeoJSON`.
    pub path: String,
    /// How the overlay is drawn.
    pub kind: OverlayKind,
    /// Line width or circle radius in pixels.
    #[serde(default = "default_line_width")]
    pub width: f64,
}

impl OverlayDef {
    /// Source id the overlay data is registered under.
    #[must_use]
    pub fn source_id(&self) -> String {
        format!("{}-source", self.id)
    }
}

/// Kind of static reference layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Boundary outline, recolored by theme.
    Outline,
    /// Text labels from a feature property.
    Label,
}

/// An always-on reference layer drawn above the choropleth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceLayerDef {
    /// Layer id.
    pub id: String,
    /// Source id.
    pub source_id: String,
    /// `GeoJSON` path handed to the display layer as-is.
    pub path: String,
    /// Outline or label.
    pub kind: ReferenceKind,
    /// Feature property used as label text.
    #[serde(default)]
    pub label_field: Option<String>,
    /// Minimum zoom at which the layer shows.
    #[serde(default)]
    pub min_zoom: Option<f64>,
    /// Line width for outlines.
    #[serde(default = "default_line_width")]
    pub width: f64,
}

/// Styling for both themes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeSet {
    /// Light theme.
    pub light: ThemeStyle,
    /// Dark theme.
    pub dark: ThemeStyle,
}

/// Colors and basemap tiles for one theme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeStyle {
    /// Raster tile URL template.
    pub tile_url: String,
    /// Reference outline color (counties).
    pub outline_color: String,
    /// Overlay color (drivetime polygons).
    pub overlay_color: String,
    /// Reference label text color.
    pub label_color: String,
    /// Reference label halo color.
    pub label_halo_color: String,
}
