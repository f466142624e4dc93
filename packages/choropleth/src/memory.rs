//! In-memory display surface.
//!
//! Keeps the full style state (sources, ordered layers, legends) in plain
//! collections. Useful for headless rendering of the dashboard style and
//! for asserting on what a controller did to a map.

use std::collections::BTreeMap;

use crate::SurfaceError;
use crate::legend::LegendEntry;
use crate::surface::{DisplaySurface, LayerSpec, SourceSpec, Visibility};

/// A [`DisplaySurface`] backed by in-memory collections.
#[derive(Debug, Default, Clone)]
pub struct MemorySurface {
    sources: BTreeMap<String, SourceSpec>,
    layers: Vec<LayerSpec>,
    legends: BTreeMap<String, Vec<LegendEntry>>,
    source_registrations: usize,
    layer_registrations: usize,
    data_updates: usize,
}

impl MemorySurface {
    /// Creates an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a registered source.
    #[must_use]
    pub fn source(&self, id: &str) -> Option<&SourceSpec> {
        self.sources.get(id)
    }

    /// Returns a registered layer.
    #[must_use]
    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Layer ids in draw order, bottom first.
    #[must_use]
    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.id.as_str()).collect()
    }

    /// Returns a layer's paint property.
    #[must_use]
    pub fn paint(&self, layer: &str, name: &str) -> Option<&serde_json::Value> {
        self.layer(layer)?.paint.get(name)
    }

    /// Returns a layer's effective visibility, `None` if it is not
    /// registered. Layers without a visibility property are visible.
    #[must_use]
    pub fn visibility(&self, layer: &str) -> Option<Visibility> {
        let layer = self.layer(layer)?;
        match layer.layout.get("visibility").and_then(serde_json::Value::as_str) {
            Some("none") => Some(Visibility::None),
            _ => Some(Visibility::Visible),
        }
    }

    /// Returns the current contents of a legend.
    #[must_use]
    pub fn legend(&self, id: &str) -> Option<&[LegendEntry]> {
        self.legends.get(id).map(Vec::as_slice)
    }

    /// Total successful `add_source` calls.
    #[must_use]
    pub const fn source_registrations(&self) -> usize {
        self.source_registrations
    }

    /// Total successful `add_layer` calls.
    #[must_use]
    pub const fn layer_registrations(&self) -> usize {
        self.layer_registrations
    }

    /// Total successful `set_source_data` calls.
    #[must_use]
    pub const fn data_updates(&self) -> usize {
        self.data_updates
    }

    fn layer_mut(&mut self, id: &str) -> Result<&mut LayerSpec, SurfaceError> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| SurfaceError::MissingLayer { id: id.to_string() })
    }

    fn source_mut(&mut self, id: &str) -> Result<&mut SourceSpec, SurfaceError> {
        self.sources
            .get_mut(id)
            .ok_or_else(|| SurfaceError::MissingSource { id: id.to_string() })
    }
}

impl DisplaySurface for MemorySurface {
    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id == id)
    }

    fn add_source(&mut self, id: &str, spec: SourceSpec) -> Result<(), SurfaceError> {
        if self.sources.contains_key(id) {
            return Err(SurfaceError::DuplicateSource { id: id.to_string() });
        }
        self.sources.insert(id.to_string(), spec);
        self.source_registrations += 1;
        Ok(())
    }

    fn set_source_data(&mut self, id: &str, data: serde_json::Value) -> Result<(), SurfaceError> {
        match self.source_mut(id)? {
            SourceSpec::Geojson { data: current } => {
                *current = data;
                self.data_updates += 1;
                Ok(())
            }
            SourceSpec::Raster { .. } => Err(SurfaceError::WrongSourceType { id: id.to_string() }),
        }
    }

    fn set_tiles(&mut self, id: &str, tiles: Vec<String>) -> Result<(), SurfaceError> {
        match self.source_mut(id)? {
            SourceSpec::Raster { tiles: current, .. } => {
                *current = tiles;
                Ok(())
            }
            SourceSpec::Geojson { .. } => Err(SurfaceError::WrongSourceType { id: id.to_string() }),
        }
    }

    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), SurfaceError> {
        if self.has_layer(&layer.id) {
            return Err(SurfaceError::DuplicateLayer { id: layer.id });
        }
        if !self.has_source(&layer.source) {
            return Err(SurfaceError::MissingSource { id: layer.source });
        }
        self.layers.push(layer);
        self.layer_registrations += 1;
        Ok(())
    }

    fn set_paint_property(
        &mut self,
        layer: &str,
        name: &str,
        value: serde_json::Value,
    ) -> Result<(), SurfaceError> {
        self.layer_mut(layer)?.paint.insert(name.to_string(), value);
        Ok(())
    }

    fn set_layout_property(
        &mut self,
        layer: &str,
        name: &str,
        value: serde_json::Value,
    ) -> Result<(), SurfaceError> {
        self.layer_mut(layer)?.layout.insert(name.to_string(), value);
        Ok(())
    }

    fn replace_legend(&mut self, legend_id: &str, entries: Vec<LegendEntry>) {
        self.legends.insert(legend_id.to_string(), entries);
    }
}
