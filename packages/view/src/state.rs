//! Application state owned by the view controller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use visit_map_config_models::{DashboardConfig, SurfaceLayout, Theme};

/// One of the two map surfaces.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SurfaceId {
    /// The main visits map.
    Primary,
    /// The side-by-side demographic map.
    Comparison,
}

impl SurfaceId {
    /// Layer ids and metric property used on this surface.
    #[must_use]
    pub const fn layout(self, config: &DashboardConfig) -> &SurfaceLayout {
        match self {
            Self::Primary => &config.primary,
            Self::Comparison => &config.comparison,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Selection {
    requested: Option<String>,
    rendered: Option<String>,
    generation: u64,
}

/// Everything the UI has asked for so far.
///
/// Each surface carries a selection generation. Starting a new selection
/// bumps it, so results of an older load can be recognized and dropped.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    theme: Theme,
    primary: Selection,
    comparison: Selection,
    overlays: BTreeMap<String, bool>,
}

impl AppState {
    /// Active basemap theme.
    #[must_use]
    pub const fn theme(&self) -> Theme {
        self.theme
    }

    /// Dataset most recently requested for a surface.
    #[must_use]
    pub fn dataset(&self, surface: SurfaceId) -> Option<&str> {
        self.selection(surface).requested.as_deref()
    }

    /// Dataset currently drawn on a surface.
    #[must_use]
    pub fn rendered(&self, surface: SurfaceId) -> Option<&str> {
        self.selection(surface).rendered.as_deref()
    }

    /// Generation of the newest selection on a surface.
    #[must_use]
    pub const fn generation(&self, surface: SurfaceId) -> u64 {
        self.selection(surface).generation
    }

    /// Whether the overlay toggle is on.
    #[must_use]
    pub fn overlay_enabled(&self, id: &str) -> bool {
        self.overlays.get(id).copied().unwrap_or(false)
    }

    /// Ids of every overlay whose toggle is on.
    pub fn enabled_overlays(&self) -> impl Iterator<Item = &str> {
        self.overlays
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(id, _)| id.as_str())
    }

    pub(crate) const fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Records a new request and returns its generation.
    pub(crate) fn request(&mut self, surface: SurfaceId, dataset: &str) -> u64 {
        let selection = self.selection_mut(surface);
        selection.requested = Some(dataset.to_string());
        selection.generation += 1;
        selection.generation
    }

    pub(crate) fn mark_rendered(&mut self, surface: SurfaceId, dataset: &str) {
        self.selection_mut(surface).rendered = Some(dataset.to_string());
    }

    /// Supersedes any in-flight load for a surface.
    pub(crate) fn invalidate(&mut self, surface: SurfaceId) {
        let selection = self.selection_mut(surface);
        selection.generation += 1;
        selection.rendered = None;
    }

    /// Sets an overlay toggle, returning the previous value.
    pub(crate) fn set_overlay(&mut self, id: &str, enabled: bool) -> bool {
        self.overlays
            .insert(id.to_string(), enabled)
            .unwrap_or(false)
    }

    const fn selection(&self, surface: SurfaceId) -> &Selection {
        match surface {
            SurfaceId::Primary => &self.primary,
            SurfaceId::Comparison => &self.comparison,
        }
    }

    const fn selection_mut(&mut self, surface: SurfaceId) -> &mut Selection {
        match surface {
            SurfaceId::Primary => &mut self.primary,
            SurfaceId::Comparison => &mut self.comparison,
        }
    }
}
