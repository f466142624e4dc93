#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Choropleth rendering against a display surface.
//!
//! Turns class breaks and a color ramp into a `MapLibre` paint expression
//! and a legend, and pushes both to a [`DisplaySurface`] as one update.
//! Also defines the dashboard's style layers and an in-memory surface.

pub mod expression;
pub mod legend;
pub mod memory;
pub mod style;
pub mod surface;

pub use expression::build_color_expression;
pub use legend::{LegendEntry, LegendOptions, build_legend};
pub use memory::MemorySurface;
pub use surface::{DisplaySurface, LayerKind, LayerSpec, SourceSpec, Visibility};

use thiserror::Error;

/// Errors reported by a display surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The referenced source is not registered.
    #[error("Source '{id}' does not exist")]
    MissingSource {
        /// Source id.
        id: String,
    },

    /// The referenced layer is not registered.
    #[error("Layer '{id}' does not exist")]
    MissingLayer {
        /// Layer id.
        id: String,
    },

    /// A source with this id is already registered.
    #[error("Source '{id}' already exists")]
    DuplicateSource {
        /// Source id.
        id: String,
    },

    /// A layer with this id is already registered.
    #[error("Layer '{id}' already exists")]
    DuplicateLayer {
        /// Layer id.
        id: String,
    },

    /// The operation does not apply to this source's type.
    #[error("Source '{id}' has the wrong type for this operation")]
    WrongSourceType {
        /// Source id.
        id: String,
    },
}

/// Where a choropleth update lands on a surface.
#[derive(Debug, Clone, Copy)]
pub struct ChoroplethTarget<'a> {
    /// Fill layer receiving the `fill-color` expression.
    pub layer_id: &'a str,
    /// Legend list to replace.
    pub legend_id: &'a str,
    /// Feature property the expression reads.
    pub property: &'a str,
}

/// Repaints a choropleth layer and replaces its legend.
///
/// The expression and legend are both built before anything is touched.
/// When either cannot be built (fewer than two breaks, empty ramp) or the
/// fill layer does not exist yet, the surface is left unchanged and
/// `Ok(false)` is returned.
///
/// # Errors
///
/// Propagates [`SurfaceError`] from the paint update.
pub fn apply_choropleth(
    surface: &mut dyn DisplaySurface,
    target: ChoroplethTarget<'_>,
    breaks: &[f64],
    colors: &[String],
    options: &LegendOptions,
) -> Result<bool, SurfaceError> {
    let Some(expression) = build_color_expression(target.property, breaks, colors) else {
        log::debug!("{}: not enough breaks to repaint", target.layer_id);
        return Ok(false);
    };
    let legend = build_legend(breaks, colors, options);
    if legend.is_empty() {
        return Ok(false);
    }

    if !surface.has_layer(target.layer_id) {
        log::debug!("{}: layer not registered, skipping repaint", target.layer_id);
        return Ok(false);
    }

    surface.set_paint_property(target.layer_id, "fill-color", expression)?;
    surface.replace_legend(target.legend_id, legend);

    log::debug!(
        "{}: repainted with {} classes",
        target.layer_id,
        breaks.len() - 1
    );

    Ok(true)
}
