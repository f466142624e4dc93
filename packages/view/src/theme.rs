//! Theme restyling for an already-populated surface.

use visit_map_choropleth::style::{BASEMAP_SOURCE_ID, reference_theme_paint};
use visit_map_choropleth::surface::set_paint_if_present;
use visit_map_choropleth::{DisplaySurface, SurfaceError};
use visit_map_config_models::{DashboardConfig, ThemeStyle};

/// Swaps basemap tiles and recolors reference and overlay layers.
///
/// Only touches layers that are registered; nothing is added and no data
/// is reloaded. Returns the number of layers recolored.
///
/// # Errors
///
/// Propagates [`SurfaceError`] from the surface.
pub fn restyle(
    surface: &mut dyn DisplaySurface,
    config: &DashboardConfig,
    style: &ThemeStyle,
) -> Result<usize, SurfaceError> {
    if surface.has_source(BASEMAP_SOURCE_ID) {
        surface.set_tiles(BASEMAP_SOURCE_ID, vec![style.tile_url.clone()])?;
    }

    let mut recolored = 0;

    for reference in &config.reference_layers {
        let mut touched = false;
        for (name, value) in reference_theme_paint(reference, style) {
            touched |= set_paint_if_present(surface, &reference.id, name, value)?;
        }
        if touched {
            recolored += 1;
        }
    }

    for overlay in &config.overlays {
        if set_paint_if_present(
            surface,
            &overlay.id,
            overlay.kind.color_property(),
            style.overlay_color.as_str().into(),
        )? {
            recolored += 1;
        }
    }

    Ok(recolored)
}
