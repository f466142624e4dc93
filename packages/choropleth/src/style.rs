//! Style layers for the dashboard.
//!
//! Builds the sources and layers every map surface carries: the raster
//! basemap, the hex choropleth and its outline, toggleable overlays, and
//! the county reference layers.

use serde_json::json;
use visit_map_config_models::{
    HexConfig, OverlayDef, OverlayKind, ReferenceKind, ReferenceLayerDef, SurfaceLayout,
    ThemeStyle,
};

use crate::expression::{build_color_expression, positive_filter};
use crate::surface::{LayerKind, LayerSpec, SourceSpec};

/// Raster basemap source id.
pub const BASEMAP_SOURCE_ID: &str = "carto";

/// Raster basemap layer id.
pub const BASEMAP_LAYER_ID: &str = "carto-layer";

const BASEMAP_ATTRIBUTION: &str = "&copy; <a href=\"https://carto.com/\">CARTO</a> | \
     <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap contributors</a>";

/// Fill stops used until the first dataset is classified.
const INITIAL_BREAKS: [f64; 6] = [1.0, 5.0, 10.0, 20.0, 50.0, 100.0];

const LABEL_FONTS: [&str; 2] = ["Open Sans Bold Italic", "Arial Unicode MS Regular"];

/// Raster basemap source for a theme.
#[must_use]
pub fn basemap_source(theme: &ThemeStyle) -> SourceSpec {
    SourceSpec::Raster {
        tiles: vec![theme.tile_url.clone()],
        tile_size: 256,
        attribution: Some(BASEMAP_ATTRIBUTION.to_string()),
    }
}

/// Raster basemap layer.
#[must_use]
pub fn basemap_layer() -> LayerSpec {
    LayerSpec::new(BASEMAP_LAYER_ID, LayerKind::Raster, BASEMAP_SOURCE_ID)
}

/// `GeoJSON` source holding hex geometry.
#[must_use]
pub const fn geojson_source(data: serde_json::Value) -> SourceSpec {
    SourceSpec::Geojson { data }
}

/// Choropleth fill layer, hiding hexes without a positive metric.
#[must_use]
pub fn choropleth_layer(hex: &HexConfig, layout: &SurfaceLayout, ramp: &[String]) -> LayerSpec {
    let fill_color = build_color_expression(&layout.metric_property, &INITIAL_BREAKS, ramp)
        .unwrap_or_else(|| json!("#cccccc"));

    LayerSpec::new(&layout.fill_layer_id, LayerKind::Fill, &hex.source_id)
        .paint("fill-color", fill_color)
        .paint("fill-opacity", hex.fill_opacity)
        .filter(positive_filter(&layout.metric_property))
}

/// Hex outline layer drawn over the fill.
#[must_use]
pub fn hex_outline_layer(hex: &HexConfig, layout: &SurfaceLayout) -> LayerSpec {
    LayerSpec::new(&layout.outline_layer_id, LayerKind::Line, &hex.source_id)
        .paint("line-color", hex.outline_color.as_str())
        .paint("line-width", hex.outline_width)
        .filter(positive_filter(&layout.metric_property))
}

/// Overlay layer styled for the current theme.
#[must_use]
pub fn overlay_layer(overlay: &OverlayDef, theme: &ThemeStyle) -> LayerSpec {
    let layer = LayerSpec::new(&overlay.id, overlay_layer_kind(overlay.kind), overlay.source_id())
        .paint(overlay.kind.color_property(), theme.overlay_color.as_str());

    match overlay.kind {
        OverlayKind::Line => layer.paint("line-width", overlay.width),
        OverlayKind::Fill => layer.paint("fill-opacity", 0.3),
        OverlayKind::Circle => layer
            .paint("circle-radius", overlay.width)
            .paint("circle-stroke-color", "#ffffff")
            .paint("circle-stroke-width", 1.0),
    }
}

const fn overlay_layer_kind(kind: OverlayKind) -> LayerKind {
    match kind {
        OverlayKind::Line => LayerKind::Line,
        OverlayKind::Fill => LayerKind::Fill,
        OverlayKind::Circle => LayerKind::Circle,
    }
}

/// Reference source; the display layer fetches `path` itself.
#[must_use]
pub fn reference_source(reference: &ReferenceLayerDef) -> SourceSpec {
    SourceSpec::Geojson {
        data: json!(reference.path),
    }
}

/// Reference layer styled for the current theme.
#[must_use]
pub fn reference_layer(reference: &ReferenceLayerDef, theme: &ThemeStyle) -> LayerSpec {
    let layer = match reference.kind {
        ReferenceKind::Outline => {
            LayerSpec::new(&reference.id, LayerKind::Line, &reference.source_id)
                .paint("line-color", theme.outline_color.as_str())
                .paint("line-width", reference.width)
        }
        ReferenceKind::Label => {
            let field = reference.label_field.as_deref().unwrap_or("NAME");
            LayerSpec::new(&reference.id, LayerKind::Symbol, &reference.source_id)
                .layout("text-field", json!(["to-string", ["upcase", ["get", field]]]))
                .layout("text-font", json!(LABEL_FONTS))
                .layout("text-size", 15)
                .layout("text-allow-overlap", false)
                .paint("text-color", theme.label_color.as_str())
                .paint("text-halo-color", theme.label_halo_color.as_str())
                .paint("text-halo-width", 2)
        }
    };

    match reference.min_zoom {
        Some(zoom) => layer.minzoom(zoom),
        None => layer,
    }
}

/// Paint properties a theme switch rewrites on a reference layer.
#[must_use]
pub fn reference_theme_paint(
    reference: &ReferenceLayerDef,
    theme: &ThemeStyle,
) -> Vec<(&'static str, serde_json::Value)> {
    match reference.kind {
        ReferenceKind::Outline => vec![("line-color", json!(theme.outline_color))],
        ReferenceKind::Label => vec![
            ("text-color", json!(theme.label_color)),
            ("text-halo-color", json!(theme.label_halo_color)),
        ],
    }
}
