//! Display-layer integration.
//!
//! [`DisplaySurface`] is the slice of a `MapLibre`-style map API the
//! dashboard drives: source and layer registration, data replacement,
//! paint and layout properties, plus the legend panel beside the map.
//! Every call site checks `has_source`/`has_layer` first; implementations
//! report missing targets as [`SurfaceError`] rather than panicking.

use serde::{Deserialize, Serialize};

use crate::SurfaceError;
use crate::legend::LegendEntry;

/// A data source registered with the display layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceSpec {
    /// `GeoJSON` source. `data` is either a URL string or an inline object.
    Geojson {
        /// Inline `FeatureCollection` or URL.
        data: serde_json::Value,
    },
    /// Raster tile source.
    Raster {
        /// Tile URL templates.
        tiles: Vec<String>,
        /// Tile size in pixels.
        #[serde(rename = "tileSize")]
        tile_size: u32,
        /// Attribution HTML.
        #[serde(skip_serializing_if = "Option::is_none")]
        attribution: Option<String>,
    },
}

/// Layer rendering type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Filled polygons.
    Fill,
    /// Lines and polygon outlines.
    Line,
    /// Circles at point features.
    Circle,
    /// Text labels.
    Symbol,
    /// Raster tiles.
    Raster,
}

/// A style layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Layer id.
    pub id: String,
    /// Rendering type.
    #[serde(rename = "type")]
    pub kind: LayerKind,
    /// Source id.
    pub source: String,
    /// Paint properties.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub paint: serde_json::Map<String, serde_json::Value>,
    /// Layout properties.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub layout: serde_json::Map<String, serde_json::Value>,
    /// Feature filter expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,
    /// Minimum zoom.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<f64>,
}

impl LayerSpec {
    /// Creates a layer with no paint, layout, or filter.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: LayerKind, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            source: source.into(),
            paint: serde_json::Map::new(),
            layout: serde_json::Map::new(),
            filter: None,
            minzoom: None,
        }
    }

    /// Adds a paint property.
    #[must_use]
    pub fn paint(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.paint.insert(name.to_string(), value.into());
        self
    }

    /// Adds a layout property.
    #[must_use]
    pub fn layout(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.layout.insert(name.to_string(), value.into());
        self
    }

    /// Sets the filter expression.
    #[must_use]
    pub fn filter(mut self, filter: serde_json::Value) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sets the minimum zoom.
    #[must_use]
    pub const fn minzoom(mut self, zoom: f64) -> Self {
        self.minzoom = Some(zoom);
        self
    }
}

/// Layer visibility layout value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Drawn.
    Visible,
    /// Registered but not drawn.
    None,
}

impl Visibility {
    /// The layout property value for this visibility.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::None => "none",
        }
    }
}

/// The display layer a map view renders into.
pub trait DisplaySurface {
    /// Whether a source with this id is registered.
    fn has_source(&self, id: &str) -> bool;

    /// Whether a layer with this id is registered.
    fn has_layer(&self, id: &str) -> bool;

    /// Registers a source.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::DuplicateSource`] if the id is taken.
    fn add_source(&mut self, id: &str, spec: SourceSpec) -> Result<(), SurfaceError>;

    /// Replaces a `GeoJSON` source's data.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::MissingSource`] if the source is unknown.
    fn set_source_data(&mut self, id: &str, data: serde_json::Value) -> Result<(), SurfaceError>;

    /// Replaces a raster source's tile URLs.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::MissingSource`] if the source is unknown.
    fn set_tiles(&mut self, id: &str, tiles: Vec<String>) -> Result<(), SurfaceError>;

    /// Registers a layer on top of the existing ones.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::DuplicateLayer`] if the id is taken, or
    /// [`SurfaceError::MissingSource`] if its source is unknown.
    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), SurfaceError>;

    /// Sets a paint property.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::MissingLayer`] if the layer is unknown.
    fn set_paint_property(
        &mut self,
        layer: &str,
        name: &str,
        value: serde_json::Value,
    ) -> Result<(), SurfaceError>;

    /// Sets a layout property.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::MissingLayer`] if the layer is unknown.
    fn set_layout_property(
        &mut self,
        layer: &str,
        name: &str,
        value: serde_json::Value,
    ) -> Result<(), SurfaceError>;

    /// Replaces the contents of a legend list.
    fn replace_legend(&mut self, legend_id: &str, entries: Vec<LegendEntry>);
}

/// Sets a layer's visibility if the layer exists.
///
/// Returns whether the layer was found.
///
/// # Errors
///
/// Propagates errors from the surface.
pub fn set_visibility(
    surface: &mut dyn DisplaySurface,
    layer: &str,
    visibility: Visibility,
) -> Result<bool, SurfaceError> {
    if !surface.has_layer(layer) {
        return Ok(false);
    }
    surface.set_layout_property(layer, "visibility", visibility.as_str().into())?;
    Ok(true)
}

/// Sets a paint property if the layer exists.
///
/// Returns whether the layer was found.
///
/// # Errors
///
/// Propagates errors from the surface.
pub fn set_paint_if_present(
    surface: &mut dyn DisplaySurface,
    layer: &str,
    name: &str,
    value: serde_json::Value,
) -> Result<bool, SurfaceError> {
    if !surface.has_layer(layer) {
        return Ok(false);
    }
    surface.set_paint_property(layer, name, value)?;
    Ok(true)
}
