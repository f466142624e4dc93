//! The view controller.
//!
//! [`ViewController`] is the single writer for every map surface. Dataset
//! selections go through a ticket so a slow load that finishes after a
//! newer one is dropped instead of overwriting it. Overlay data is fetched
//! at most once and shared between surfaces.

use std::collections::BTreeMap;
use std::sync::Arc;

use visit_map_choropleth::style::{self, BASEMAP_LAYER_ID, BASEMAP_SOURCE_ID};
use visit_map_choropleth::surface::set_visibility;
use visit_map_choropleth::{
    ChoroplethTarget, DisplaySurface, LegendOptions, Visibility, apply_choropleth,
};
use visit_map_classify::{ClassBreaks, compute_breaks, positive_values};
use visit_map_config_models::{DashboardConfig, OverlayDef, Theme, ThemeStyle};
use visit_map_dataset::join::join_metric;
use visit_map_dataset::{Fetcher, load_collection, load_metric_rows};
use visit_map_dataset_models::SpatialCollection;

use crate::ViewError;
use crate::command::Command;
use crate::overlay::{OverlayAction, OverlayState, transition};
use crate::state::{AppState, SurfaceId};
use crate::theme::restyle;

/// A dataset request that has been recorded but not yet loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTicket {
    surface: SurfaceId,
    dataset_id: String,
    generation: u64,
}

impl SelectionTicket {
    /// Surface the selection renders on.
    #[must_use]
    pub const fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// Requested dataset.
    #[must_use]
    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    /// Generation recorded when the selection was made.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Joined and classified data for a ticket, ready to render.
#[derive(Debug, Clone)]
pub struct LoadedSelection {
    ticket: SelectionTicket,
    joined: SpatialCollection,
    breaks: Option<ClassBreaks>,
}

impl LoadedSelection {
    /// Ticket the data was loaded for.
    #[must_use]
    pub const fn ticket(&self) -> &SelectionTicket {
        &self.ticket
    }

    /// Hex collection with the metric property written to every feature.
    #[must_use]
    pub const fn joined(&self) -> &SpatialCollection {
        &self.joined
    }

    /// `None` when the dataset has fewer than two distinct positive values.
    #[must_use]
    pub const fn breaks(&self) -> Option<&ClassBreaks> {
        self.breaks.as_ref()
    }
}

struct SurfaceSlot<S> {
    surface: S,
    overlays: BTreeMap<String, OverlayState>,
}

impl<S> SurfaceSlot<S> {
    const fn new(surface: S) -> Self {
        Self {
            surface,
            overlays: BTreeMap::new(),
        }
    }

    fn overlay_state(&self, id: &str) -> OverlayState {
        self.overlays.get(id).copied().unwrap_or_default()
    }
}

/// Owns the application state and drives one or two map surfaces.
pub struct ViewController<S, F> {
    config: Arc<DashboardConfig>,
    fetcher: F,
    state: AppState,
    base: Option<Arc<SpatialCollection>>,
    overlay_cache: BTreeMap<String, Arc<serde_json::Value>>,
    primary: SurfaceSlot<S>,
    comparison: Option<SurfaceSlot<S>>,
}

impl<S: DisplaySurface, F: Fetcher> ViewController<S, F> {
    /// Creates a controller for `primary`. Nothing is fetched until
    /// [`Self::initialize`].
    #[must_use]
    pub fn new(config: Arc<DashboardConfig>, fetcher: F, primary: S) -> Self {
        Self {
            config,
            fetcher,
            state: AppState::default(),
            base: None,
            overlay_cache: BTreeMap::new(),
            primary: SurfaceSlot::new(primary),
            comparison: None,
        }
    }

    /// Current selections, toggles and theme.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Dashboard configuration the controller was built with.
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Fetcher used for every dataset and overlay.
    #[must_use]
    pub const fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// The primary surface.
    #[must_use]
    pub const fn primary(&self) -> &S {
        &self.primary.surface
    }

    /// The comparison surface, if attached.
    #[must_use]
    pub fn comparison(&self) -> Option<&S> {
        self.comparison.as_ref().map(|slot| &slot.surface)
    }

    /// The hex geometry every join starts from, once loaded.
    #[must_use]
    pub fn base(&self) -> Option<&SpatialCollection> {
        self.base.as_deref()
    }

    /// State of an overlay on a surface. Detached surfaces report
    /// [`OverlayState::Absent`].
    #[must_use]
    pub fn overlay_state(&self, surface: SurfaceId, id: &str) -> OverlayState {
        self.slot(surface)
            .map_or(OverlayState::Absent, |slot| slot.overlay_state(id))
    }

    /// Loads the hex geometry, installs the base layers on the primary
    /// surface and renders the default dataset.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the geometry or default dataset cannot be
    /// loaded, or the surface rejects a layer.
    pub async fn initialize(&mut self) -> Result<bool, ViewError> {
        let base = if let Some(base) = &self.base {
            Arc::clone(base)
        } else {
            let base = load_collection(&self.fetcher, &self.config.hex.path)
                .await
                .inspect_err(|e| log::error!("Failed to load hex geometry: {e}"))?;
            log::info!(
                "Loaded {} hex features from {}",
                base.len(),
                self.config.hex.path
            );
            let base = Arc::new(base);
            self.base = Some(Arc::clone(&base));
            base
        };

        let config = Arc::clone(&self.config);
        install_base_layers(
            &mut self.primary.surface,
            &config,
            SurfaceId::Primary,
            &base,
            config.theme(self.state.theme()),
        )?;

        self.select_dataset(&config.default_dataset).await
    }

    /// Loads and renders a dataset on the primary surface.
    ///
    /// Returns whether the result was rendered.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the dataset is unknown or fails to load.
    /// The previous rendering is left in place.
    pub async fn select_dataset(&mut self, id: &str) -> Result<bool, ViewError> {
        self.select(SurfaceId::Primary, id).await
    }

    /// Loads and renders a dataset on the comparison surface.
    ///
    /// Without an attached comparison surface the choice is only recorded
    /// and rendered on the next [`Self::attach_comparison`].
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the dataset is unknown or fails to load.
    pub async fn select_comparison_dataset(&mut self, id: &str) -> Result<bool, ViewError> {
        self.select(SurfaceId::Comparison, id).await
    }

    async fn select(&mut self, surface: SurfaceId, id: &str) -> Result<bool, ViewError> {
        let ticket = self.begin_selection(surface, id)?;
        if self.slot(surface).is_none() {
            log::debug!("{surface}: no surface attached, deferring '{id}'");
            return Ok(false);
        }

        let loaded = self
            .load_selection(ticket)
            .await
            .inspect_err(|e| log::error!("{surface}: failed to load dataset '{id}': {e}"))?;

        self.apply_selection(loaded)
    }

    /// Records a selection and returns the ticket its result must present.
    ///
    /// Any ticket issued earlier for the same surface becomes stale.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::UnknownDataset`] if no dataset has this id.
    pub fn begin_selection(
        &mut self,
        surface: SurfaceId,
        dataset_id: &str,
    ) -> Result<SelectionTicket, ViewError> {
        if self.config.dataset(dataset_id).is_none() {
            return Err(ViewError::UnknownDataset {
                id: dataset_id.to_string(),
            });
        }

        let generation = self.state.request(surface, dataset_id);
        log::debug!("{surface}: selecting '{dataset_id}' (generation {generation})");

        Ok(SelectionTicket {
            surface,
            dataset_id: dataset_id.to_string(),
            generation,
        })
    }

    /// Fetches the dataset for a ticket, joins it onto the hex geometry and
    /// classifies the result. Touches no surface.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the controller is not initialized or the
    /// dataset fails to load.
    pub async fn load_selection(
        &self,
        ticket: SelectionTicket,
    ) -> Result<LoadedSelection, ViewError> {
        let base = self.base.as_deref().ok_or(ViewError::NotInitialized)?;
        let dataset =
            self.config
                .dataset(&ticket.dataset_id)
                .ok_or_else(|| ViewError::UnknownDataset {
                    id: ticket.dataset_id.clone(),
                })?;
        let layout = ticket.surface.layout(&self.config);

        let rows = load_metric_rows(
            &self.fetcher,
            &dataset.path,
            &dataset.key_column,
            &dataset.value_column,
        )
        .await?;

        let joined = join_metric(
            base,
            &rows,
            &self.config.hex.join_key,
            &layout.metric_property,
        );
        let values = positive_values(joined.metric_values(&layout.metric_property));
        let breaks = compute_breaks(&values, self.config.class_count);

        Ok(LoadedSelection {
            ticket,
            joined,
            breaks,
        })
    }

    /// Pushes a loaded selection to its surface.
    ///
    /// Returns `false` without touching anything if a newer selection was
    /// started since the ticket was issued or the surface is detached.
    /// Unclassifiable data still replaces the hex data but keeps the
    /// current colors and legend.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the surface rejects the update.
    pub fn apply_selection(&mut self, loaded: LoadedSelection) -> Result<bool, ViewError> {
        let LoadedSelection {
            ticket,
            joined,
            breaks,
        } = loaded;

        let current = self.state.generation(ticket.surface);
        if ticket.generation != current {
            log::warn!(
                "{}: discarding stale '{}' result (generation {} superseded by {current})",
                ticket.surface,
                ticket.dataset_id,
                ticket.generation
            );
            return Ok(false);
        }

        let config = Arc::clone(&self.config);
        let dataset =
            config
                .dataset(&ticket.dataset_id)
                .ok_or_else(|| ViewError::UnknownDataset {
                    id: ticket.dataset_id.clone(),
                })?;
        let layout = ticket.surface.layout(&config);

        let Some(slot) = self.slot_mut(ticket.surface) else {
            log::debug!("{}: surface detached, dropping result", ticket.surface);
            return Ok(false);
        };
        let surface: &mut dyn DisplaySurface = &mut slot.surface;

        if !surface.has_source(&config.hex.source_id) {
            log::warn!(
                "{}: hex source '{}' not registered, skipping render",
                ticket.surface,
                config.hex.source_id
            );
            return Ok(false);
        }
        surface.set_source_data(&config.hex.source_id, joined.to_json_value()?)?;

        let repainted = if let Some(breaks) = &breaks {
            let target = ChoroplethTarget {
                layer_id: &layout.fill_layer_id,
                legend_id: &layout.legend_id,
                property: &layout.metric_property,
            };
            let options = LegendOptions {
                currency_prefix: dataset.currency_prefix.clone(),
                unit_suffix: dataset.unit_suffix.clone(),
            };
            let colors = config.ramp(&dataset.ramp).unwrap_or_default();
            apply_choropleth(surface, target, breaks.bounds(), colors, &options)?
        } else {
            log::info!(
                "{}: '{}' has fewer than two distinct positive values, keeping current colors",
                ticket.surface,
                ticket.dataset_id
            );
            false
        };

        self.state
            .mark_rendered(ticket.surface, &ticket.dataset_id);
        log::info!(
            "{}: rendered '{}'{}",
            ticket.surface,
            ticket.dataset_id,
            if repainted { "" } else { " (colors unchanged)" }
        );

        Ok(true)
    }

    /// Turns an overlay on or off on every attached surface.
    ///
    /// The first enable fetches the overlay data; later toggles only flip
    /// visibility. Redundant toggles do nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the overlay is unknown, its data fails to
    /// load, or a surface rejects it. On failure the toggle reverts and
    /// every surface is put back in line with it.
    pub async fn set_overlay(&mut self, id: &str, enabled: bool) -> Result<(), ViewError> {
        let config = Arc::clone(&self.config);
        let overlay = config
            .overlay(id)
            .ok_or_else(|| ViewError::UnknownOverlay { id: id.to_string() })?;

        let previous = self.state.set_overlay(id, enabled);

        let mut result = self
            .apply_overlay(SurfaceId::Primary, overlay, enabled)
            .await;
        if result.is_ok() {
            result = self
                .apply_overlay(SurfaceId::Comparison, overlay, enabled)
                .await;
        }

        if let Err(e) = &result {
            log::error!(
                "Failed to {} overlay '{id}': {e}",
                if enabled { "enable" } else { "disable" }
            );
            self.state.set_overlay(id, previous);
            for surface in [SurfaceId::Primary, SurfaceId::Comparison] {
                if let Err(rollback) = self.apply_overlay(surface, overlay, previous).await {
                    log::warn!("{surface}: failed to restore overlay '{id}': {rollback}");
                }
            }
        }

        result
    }

    async fn apply_overlay(
        &mut self,
        surface: SurfaceId,
        overlay: &OverlayDef,
        enable: bool,
    ) -> Result<(), ViewError> {
        let Some(current) = self.slot(surface).map(|slot| slot.overlay_state(&overlay.id)) else {
            return Ok(());
        };
        let action = transition(current, enable);

        let data = match action {
            OverlayAction::Register => Some(self.overlay_data(overlay).await?),
            OverlayAction::Show | OverlayAction::Hide | OverlayAction::Keep => None,
        };

        let config = Arc::clone(&self.config);
        let palette = config.theme(self.state.theme());
        let Some(slot) = self.slot_mut(surface) else {
            return Ok(());
        };

        match (action, data) {
            (OverlayAction::Register, Some(data)) => {
                register_overlay(&mut slot.surface, overlay, palette, &data)?;
            }
            (OverlayAction::Show, _) => {
                set_visibility(&mut slot.surface, &overlay.id, Visibility::Visible)?;
            }
            (OverlayAction::Hide, _) => {
                set_visibility(&mut slot.surface, &overlay.id, Visibility::None)?;
            }
            _ => {}
        }

        let next = action.next_state(current);
        slot.overlays.insert(overlay.id.clone(), next);
        if action != OverlayAction::Keep {
            log::debug!("{surface}: overlay '{}' {current} -> {next}", overlay.id);
        }

        Ok(())
    }

    async fn overlay_data(
        &mut self,
        overlay: &OverlayDef,
    ) -> Result<Arc<serde_json::Value>, ViewError> {
        if let Some(data) = self.overlay_cache.get(&overlay.id) {
            return Ok(Arc::clone(data));
        }

        let collection = load_collection(&self.fetcher, &overlay.path).await?;
        log::info!(
            "Loaded overlay '{}' ({} features)",
            overlay.id,
            collection.len()
        );

        let data = Arc::new(collection.to_json_value()?);
        self.overlay_cache
            .insert(overlay.id.clone(), Arc::clone(&data));
        Ok(data)
    }

    /// Attaches the side-by-side comparison surface.
    ///
    /// Installs the base layers, mirrors every overlay visible on the
    /// primary surface (from cached data) and renders the comparison
    /// dataset if one has been selected. Replaces any surface already
    /// attached.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::NotInitialized`] before [`Self::initialize`]
    /// has loaded the geometry, or an error if the surface rejects a layer.
    /// A comparison dataset that fails to load is logged and leaves the
    /// surface attached without data.
    pub async fn attach_comparison(&mut self, surface: S) -> Result<(), ViewError> {
        let base = self.base.clone().ok_or(ViewError::NotInitialized)?;
        let config = Arc::clone(&self.config);

        let mut slot = SurfaceSlot::new(surface);
        install_base_layers(
            &mut slot.surface,
            &config,
            SurfaceId::Comparison,
            &base,
            config.theme(self.state.theme()),
        )?;

        self.state.invalidate(SurfaceId::Comparison);
        if self.comparison.replace(slot).is_some() {
            log::warn!("Replacing attached comparison surface");
        }

        let visible: Vec<String> = self
            .primary
            .overlays
            .iter()
            .filter(|(_, state)| **state == OverlayState::Visible)
            .map(|(id, _)| id.clone())
            .collect();
        for id in visible {
            if let Some(overlay) = config.overlay(&id) {
                self.apply_overlay(SurfaceId::Comparison, overlay, true)
                    .await?;
            }
        }

        if let Some(id) = self
            .state
            .dataset(SurfaceId::Comparison)
            .map(ToString::to_string)
        {
            if let Err(e) = self.select_comparison_dataset(&id).await {
                log::warn!("Comparison surface attached without '{id}': {e}");
            }
        }

        log::info!("Comparison surface attached");
        Ok(())
    }

    /// Detaches and returns the comparison surface. Loads still in flight
    /// for it are discarded when they complete.
    pub fn detach_comparison(&mut self) -> Option<S> {
        self.state.invalidate(SurfaceId::Comparison);
        let slot = self.comparison.take()?;
        log::info!("Comparison surface detached");
        Some(slot.surface)
    }

    /// Switches the basemap theme on every attached surface.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if a surface rejects the restyle.
    pub fn set_theme(&mut self, theme: Theme) -> Result<(), ViewError> {
        self.state.set_theme(theme);

        let config = Arc::clone(&self.config);
        let palette = config.theme(theme);

        let mut recolored = restyle(&mut self.primary.surface, &config, palette)?;
        if let Some(slot) = &mut self.comparison {
            recolored += restyle(&mut slot.surface, &config, palette)?;
        }

        log::info!("Switched to {theme} theme ({recolored} layers recolored)");
        Ok(())
    }

    /// Runs a UI command.
    ///
    /// # Errors
    ///
    /// Returns the error of the operation the command maps to.
    pub async fn dispatch(&mut self, command: Command) -> Result<(), ViewError> {
        log::debug!("Dispatching {command:?}");

        match command {
            Command::SelectDataset { id } => self.select_dataset(&id).await.map(drop),
            Command::SelectComparisonDataset { id } => {
                self.select_comparison_dataset(&id).await.map(drop)
            }
            Command::ToggleOverlay { id, enabled } => self.set_overlay(&id, enabled).await,
            Command::SetTheme { theme } => self.set_theme(theme),
        }
    }

    fn slot(&self, surface: SurfaceId) -> Option<&SurfaceSlot<S>> {
        match surface {
            SurfaceId::Primary => Some(&self.primary),
            SurfaceId::Comparison => self.comparison.as_ref(),
        }
    }

    fn slot_mut(&mut self, surface: SurfaceId) -> Option<&mut SurfaceSlot<S>> {
        match surface {
            SurfaceId::Primary => Some(&mut self.primary),
            SurfaceId::Comparison => self.comparison.as_mut(),
        }
    }
}

/// Registers the basemap, hex source, choropleth, hex outline and
/// reference layers that are not already present.
fn install_base_layers(
    surface: &mut dyn DisplaySurface,
    config: &DashboardConfig,
    surface_id: SurfaceId,
    base: &SpatialCollection,
    palette: &ThemeStyle,
) -> Result<(), ViewError> {
    let layout = surface_id.layout(config);

    if !surface.has_source(BASEMAP_SOURCE_ID) {
        surface.add_source(BASEMAP_SOURCE_ID, style::basemap_source(palette))?;
    }
    if !surface.has_layer(BASEMAP_LAYER_ID) {
        surface.add_layer(style::basemap_layer())?;
    }

    if !surface.has_source(&config.hex.source_id) {
        surface.add_source(
            &config.hex.source_id,
            style::geojson_source(base.to_json_value()?),
        )?;
    }

    let initial_dataset = match surface_id {
        SurfaceId::Primary => config.dataset(&config.default_dataset),
        SurfaceId::Comparison => config.comparison_datasets().next(),
    };
    let ramp = initial_dataset
        .and_then(|dataset| config.ramp(&dataset.ramp))
        .unwrap_or_default();

    if !surface.has_layer(&layout.fill_layer_id) {
        surface.add_layer(style::choropleth_layer(&config.hex, layout, ramp))?;
    }
    if !surface.has_layer(&layout.outline_layer_id) {
        surface.add_layer(style::hex_outline_layer(&config.hex, layout))?;
    }

    for reference in &config.reference_layers {
        if !surface.has_source(&reference.source_id) {
            surface.add_source(&reference.source_id, style::reference_source(reference))?;
        }
        if !surface.has_layer(&reference.id) {
            surface.add_layer(style::reference_layer(reference, palette))?;
        }
    }

    log::debug!("{surface_id}: base layers installed");
    Ok(())
}

/// Registers an overlay's source and layer, reusing whichever already
/// exists.
fn register_overlay(
    surface: &mut dyn DisplaySurface,
    overlay: &OverlayDef,
    palette: &ThemeStyle,
    data: &serde_json::Value,
) -> Result<(), ViewError> {
    let source_id = overlay.source_id();
    if !surface.has_source(&source_id) {
        surface.add_source(&source_id, style::geojson_source(data.clone()))?;
    }

    if surface.has_layer(&overlay.id) {
        set_visibility(surface, &overlay.id, Visibility::Visible)?;
    } else {
        surface.add_layer(style::overlay_layer(overlay, palette))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use visit_map_choropleth::{
        LayerSpec, LegendEntry, MemorySurface, SourceSpec, SurfaceError,
    };
    use visit_map_dataset::{DatasetError, MemoryFetcher};

    const HEX_PATH: &str = "Data/hex_boundaries_reprojected.geojson";
    const DRIVETIME_10_PATH: &str = "Data/drivetime_10.geojson";

    type Controller = ViewController<MemorySurface, MemoryFetcher>;

    fn hexes() -> String {
        let features: Vec<_> = ["H1", "H2", "H3"]
            .iter()
            .map(|id| {
                json!({
                    "type": "Feature",
                    "geometry": null,
                    "properties": { "hex_id": id }
                })
            })
            .collect();
        json!({ "type": "FeatureCollection", "features": features }).to_string()
    }

    fn drivetime() -> String {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-84.39, 33.75], [-84.38, 33.76]]
                },
                "properties": { "minutes": 10 }
            }]
        })
        .to_string()
    }

    fn fetcher() -> MemoryFetcher {
        MemoryFetcher::new()
            .with_file(HEX_PATH, hexes())
            .with_file("Data/All.csv", "hex_id,Visits\nH1,10\nH2,50\n")
            .with_file("Data/Emergency.csv", "hex_id,Visits\nH1,1\nH2,2\nH3,3\n")
            .with_file("Data/Imaging.csv", "hex_id,Visits\nH1,5\nH2,5\n")
            .with_file(
                "Data/demographics/median_income.csv",
                "hex_id,value\nH1,\"32,000\"\nH2,\"58,500\"\nH3,\"120,000\"\n",
            )
            .with_file(DRIVETIME_10_PATH, drivetime())
            .with_file("Data/drivetime_15.geojson", drivetime())
    }

    fn controller() -> Controller {
        ViewController::new(
            Arc::new(visit_map_config::dashboard()),
            fetcher(),
            MemorySurface::new(),
        )
    }

    async fn initialized() -> Controller {
        let mut controller = controller();
        assert!(controller.initialize().await.unwrap());
        controller
    }

    fn hex_visits(surface: &MemorySurface) -> Vec<serde_json::Value> {
        let Some(SourceSpec::Geojson { data }) = surface.source("hexes") else {
            panic!("hex source missing");
        };
        data["features"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["properties"]["Visits"].clone())
            .collect()
    }

    fn legend_of(surface: &MemorySurface, id: &str) -> Vec<LegendEntry> {
        surface.legend(id).map(<[LegendEntry]>::to_vec).unwrap_or_default()
    }

    /// Memory surface that refuses to register one layer id.
    #[derive(Default)]
    struct RejectingSurface {
        inner: MemorySurface,
        reject_layer: Option<String>,
    }

    impl RejectingSurface {
        fn rejecting(layer: &str) -> Self {
            Self {
                inner: MemorySurface::new(),
                reject_layer: Some(layer.to_string()),
            }
        }
    }

    impl DisplaySurface for RejectingSurface {
        fn has_source(&self, id: &str) -> bool {
            self.inner.has_source(id)
        }

        fn has_layer(&self, id: &str) -> bool {
            self.inner.has_layer(id)
        }

        fn add_source(&mut self, id: &str, spec: SourceSpec) -> Result<(), SurfaceError> {
            self.inner.add_source(id, spec)
        }

        fn set_source_data(
            &mut self,
            id: &str,
            data: serde_json::Value,
        ) -> Result<(), SurfaceError> {
            self.inner.set_source_data(id, data)
        }

        fn set_tiles(&mut self, id: &str, tiles: Vec<String>) -> Result<(), SurfaceError> {
            self.inner.set_tiles(id, tiles)
        }

        fn add_layer(&mut self, layer: LayerSpec) -> Result<(), SurfaceError> {
            if self.reject_layer.as_deref() == Some(layer.id.as_str()) {
                return Err(SurfaceError::DuplicateLayer { id: layer.id });
            }
            self.inner.add_layer(layer)
        }

        fn set_paint_property(
            &mut self,
            layer: &str,
            name: &str,
            value: serde_json::Value,
        ) -> Result<(), SurfaceError> {
            self.inner.set_paint_property(layer, name, value)
        }

        fn set_layout_property(
            &mut self,
            layer: &str,
            name: &str,
            value: serde_json::Value,
        ) -> Result<(), SurfaceError> {
            self.inner.set_layout_property(layer, name, value)
        }

        fn replace_legend(&mut self, legend_id: &str, entries: Vec<LegendEntry>) {
            self.inner.replace_legend(legend_id, entries);
        }
    }

    #[tokio::test]
    async fn initialize_renders_default_dataset() {
        let controller = initialized().await;
        let surface = controller.primary();

        assert_eq!(
            surface.layer_ids(),
            vec![
                "carto-layer",
                "visits-choropleth",
                "hex-outline",
                "ga-county-outline",
                "ga-county-labels",
            ]
        );
        assert_eq!(hex_visits(surface), vec![json!(10), json!(50), json!(0)]);

        let legend = legend_of(surface, "legend");
        assert_eq!(legend.len(), 1);
        assert_eq!(legend[0].label, "10+");
        assert_eq!(
            surface.paint("visits-choropleth", "fill-color"),
            Some(&json!(["interpolate", ["linear"], ["get", "Visits"], 10.0, "#fef0d9"]))
        );
        assert_eq!(controller.state().rendered(SurfaceId::Primary), Some("All"));
    }

    #[tokio::test]
    async fn initialize_fails_without_geometry() {
        let mut controller = ViewController::new(
            Arc::new(visit_map_config::dashboard()),
            MemoryFetcher::new(),
            MemorySurface::new(),
        );

        let err = controller.initialize().await.unwrap_err();

        assert!(matches!(
            err,
            ViewError::Dataset(DatasetError::Status { status: 404, .. })
        ));
        assert!(controller.primary().layer_ids().is_empty());
        assert!(controller.base().is_none());
    }

    #[tokio::test]
    async fn selecting_dataset_reruns_pipeline() {
        let mut controller = initialized().await;

        assert!(controller.select_dataset("Emergency").await.unwrap());

        let surface = controller.primary();
        assert_eq!(hex_visits(surface), vec![json!(1), json!(2), json!(3)]);
        let legend = legend_of(surface, "legend");
        assert_eq!(legend.len(), 2);
        assert!(legend[0].label.starts_with('1'));
        assert!(legend[1].label.ends_with('+'));
    }

    #[tokio::test]
    async fn base_geometry_is_fetched_once() {
        let mut controller = initialized().await;
        controller.select_dataset("Emergency").await.unwrap();
        controller.select_dataset("All").await.unwrap();

        assert_eq!(controller.fetcher().fetch_count(HEX_PATH), 1);
        assert!(
            controller
                .base()
                .unwrap()
                .features()
                .iter()
                .all(|f| f.property("Visits").is_none())
        );
    }

    #[tokio::test]
    async fn unclassifiable_dataset_keeps_colors() {
        let mut controller = initialized().await;
        let paint_before = controller
            .primary()
            .paint("visits-choropleth", "fill-color")
            .cloned();

        assert!(controller.select_dataset("Imaging").await.unwrap());

        let surface = controller.primary();
        assert_eq!(hex_visits(surface), vec![json!(5), json!(5), json!(0)]);
        assert_eq!(
            surface.paint("visits-choropleth", "fill-color").cloned(),
            paint_before
        );
        assert_eq!(legend_of(surface, "legend")[0].label, "10+");
    }

    #[tokio::test]
    async fn failed_load_leaves_previous_rendering() {
        let mut controller = initialized().await;
        let updates_before = controller.primary().data_updates();

        let err = controller.select_dataset("Orthopedics").await.unwrap_err();

        assert!(matches!(err, ViewError::Dataset(_)));
        let surface = controller.primary();
        assert_eq!(surface.data_updates(), updates_before);
        assert_eq!(hex_visits(surface), vec![json!(10), json!(50), json!(0)]);
        assert_eq!(legend_of(surface, "legend")[0].label, "10+");
        assert_eq!(controller.state().rendered(SurfaceId::Primary), Some("All"));
    }

    #[tokio::test]
    async fn unknown_ids_are_rejected() {
        let mut controller = initialized().await;

        assert!(matches!(
            controller.select_dataset("Cardiology").await,
            Err(ViewError::UnknownDataset { .. })
        ));
        assert!(matches!(
            controller.set_overlay("drivetime-60", true).await,
            Err(ViewError::UnknownOverlay { .. })
        ));
    }

    #[tokio::test]
    async fn stale_selection_is_discarded() {
        let mut controller = initialized().await;

        let slow = controller
            .begin_selection(SurfaceId::Primary, "Emergency")
            .unwrap();
        let fast = controller
            .begin_selection(SurfaceId::Primary, "All")
            .unwrap();

        let fast = controller.load_selection(fast).await.unwrap();
        assert!(controller.apply_selection(fast).unwrap());
        let slow = controller.load_selection(slow).await.unwrap();
        assert!(slow.breaks().is_some());
        assert!(!controller.apply_selection(slow).unwrap());

        let surface = controller.primary();
        assert_eq!(hex_visits(surface), vec![json!(10), json!(50), json!(0)]);
        assert_eq!(legend_of(surface, "legend")[0].label, "10+");
        assert_eq!(controller.state().dataset(SurfaceId::Primary), Some("All"));
    }

    #[tokio::test]
    async fn overlay_toggle_fetches_once() {
        let mut controller = initialized().await;

        controller.set_overlay("drivetime-10", true).await.unwrap();
        assert_eq!(
            controller.overlay_state(SurfaceId::Primary, "drivetime-10"),
            OverlayState::Visible
        );

        controller.set_overlay("drivetime-10", false).await.unwrap();
        assert_eq!(
            controller.overlay_state(SurfaceId::Primary, "drivetime-10"),
            OverlayState::Hidden
        );
        assert_eq!(
            controller.primary().visibility("drivetime-10"),
            Some(Visibility::None)
        );

        controller.set_overlay("drivetime-10", true).await.unwrap();
        assert_eq!(
            controller.primary().visibility("drivetime-10"),
            Some(Visibility::Visible)
        );

        assert_eq!(controller.fetcher().fetch_count(DRIVETIME_10_PATH), 1);
        assert!(controller.primary().has_source("drivetime-10-source"));
        assert!(controller.state().overlay_enabled("drivetime-10"));
    }

    #[tokio::test]
    async fn redundant_toggles_do_nothing() {
        let mut controller = initialized().await;

        controller.set_overlay("drivetime-15", false).await.unwrap();
        assert_eq!(
            controller.overlay_state(SurfaceId::Primary, "drivetime-15"),
            OverlayState::Absent
        );
        assert!(!controller.primary().has_layer("drivetime-15"));

        controller.set_overlay("drivetime-15", true).await.unwrap();
        let layers = controller.primary().layer_registrations();
        let sources = controller.primary().source_registrations();

        controller.set_overlay("drivetime-15", true).await.unwrap();

        assert_eq!(controller.primary().layer_registrations(), layers);
        assert_eq!(controller.primary().source_registrations(), sources);
        assert_eq!(
            controller.fetcher().fetch_count("Data/drivetime_15.geojson"),
            1
        );
    }

    #[tokio::test]
    async fn failed_overlay_fetch_stays_absent() {
        let mut controller = initialized().await;
        controller.fetcher().remove(DRIVETIME_10_PATH);

        let err = controller
            .set_overlay("drivetime-10", true)
            .await
            .unwrap_err();

        assert!(matches!(err, ViewError::Dataset(_)));
        assert_eq!(
            controller.overlay_state(SurfaceId::Primary, "drivetime-10"),
            OverlayState::Absent
        );
        assert!(!controller.state().overlay_enabled("drivetime-10"));
        assert!(!controller.primary().has_layer("drivetime-10"));

        controller.fetcher().insert(DRIVETIME_10_PATH, drivetime());
        controller.set_overlay("drivetime-10", true).await.unwrap();
        assert_eq!(
            controller.overlay_state(SurfaceId::Primary, "drivetime-10"),
            OverlayState::Visible
        );
        assert_eq!(controller.fetcher().fetch_count(DRIVETIME_10_PATH), 2);
    }

    #[tokio::test]
    async fn comparison_mirrors_visible_overlays_from_cache() {
        let mut controller = initialized().await;
        controller.set_overlay("drivetime-10", true).await.unwrap();
        controller.set_overlay("drivetime-15", true).await.unwrap();
        controller.set_overlay("drivetime-15", false).await.unwrap();

        controller
            .attach_comparison(MemorySurface::new())
            .await
            .unwrap();

        let comparison = controller.comparison().unwrap();
        assert!(comparison.has_layer("comparison-choropleth"));
        assert!(comparison.has_layer("comparison-hex-outline"));
        assert_eq!(
            comparison.visibility("drivetime-10"),
            Some(Visibility::Visible)
        );
        assert!(!comparison.has_layer("drivetime-15"));
        assert_eq!(controller.fetcher().fetch_count(DRIVETIME_10_PATH), 1);

        controller.set_overlay("drivetime-10", false).await.unwrap();
        assert_eq!(
            controller.overlay_state(SurfaceId::Comparison, "drivetime-10"),
            OverlayState::Hidden
        );
        assert_eq!(
            controller.overlay_state(SurfaceId::Primary, "drivetime-10"),
            OverlayState::Hidden
        );
    }

    #[tokio::test]
    async fn comparison_dataset_renders_on_attach() {
        let mut controller = initialized().await;

        assert!(
            !controller
                .select_comparison_dataset("median_income")
                .await
                .unwrap()
        );
        assert_eq!(
            controller.fetcher().fetch_count("Data/demographics/median_income.csv"),
            0
        );

        controller
            .attach_comparison(MemorySurface::new())
            .await
            .unwrap();

        let comparison = controller.comparison().unwrap();
        let legend = legend_of(comparison, "comparison-legend");
        assert_eq!(legend.len(), 2);
        assert!(legend[0].label.starts_with("$32,000"));
        assert_eq!(legend[0].color, "#edf8e9");
        assert_eq!(
            controller.state().rendered(SurfaceId::Comparison),
            Some("median_income")
        );
        assert_eq!(legend_of(controller.primary(), "legend")[0].label, "10+");
    }

    #[tokio::test]
    async fn detached_comparison_drops_in_flight_result() {
        let mut controller = initialized().await;
        controller
            .attach_comparison(MemorySurface::new())
            .await
            .unwrap();

        let ticket = controller
            .begin_selection(SurfaceId::Comparison, "median_income")
            .unwrap();
        let loaded = controller.load_selection(ticket).await.unwrap();
        let detached = controller.detach_comparison().unwrap();

        assert!(!controller.apply_selection(loaded).unwrap());
        assert!(detached.legend("comparison-legend").is_none());
        assert!(controller.comparison().is_none());
    }

    #[tokio::test]
    async fn theme_switch_restyles_without_reloading() {
        let mut controller = initialized().await;
        controller.set_overlay("drivetime-10", true).await.unwrap();
        controller
            .attach_comparison(MemorySurface::new())
            .await
            .unwrap();
        let hex_fetches = controller.fetcher().fetch_count(HEX_PATH);

        controller.set_theme(Theme::Dark).unwrap();

        let dark = controller.config().theme(Theme::Dark).clone();
        for surface in [controller.primary(), controller.comparison().unwrap()] {
            assert_eq!(
                surface.paint("ga-county-outline", "line-color"),
                Some(&json!(dark.outline_color))
            );
            assert_eq!(
                surface.paint("drivetime-10", "line-color"),
                Some(&json!(dark.overlay_color))
            );
            assert!(!surface.has_layer("drivetime-30"));
        }
        assert_eq!(controller.fetcher().fetch_count(HEX_PATH), hex_fetches);
        assert_eq!(controller.state().theme(), Theme::Dark);
    }

    #[tokio::test]
    async fn overlays_added_after_theme_switch_use_new_colors() {
        let mut controller = initialized().await;
        controller.set_theme(Theme::Dark).unwrap();

        controller.set_overlay("drivetime-15", true).await.unwrap();

        let dark = controller.config().theme(Theme::Dark).clone();
        assert_eq!(
            controller.primary().paint("drivetime-15", "line-color"),
            Some(&json!(dark.overlay_color))
        );
    }

    #[tokio::test]
    async fn dispatches_commands() {
        let mut controller = initialized().await;
        let commands: Vec<Command> = serde_json::from_str(
            r#"[
                {"type": "select_dataset", "id": "Emergency"},
                {"type": "toggle_overlay", "id": "drivetime-10", "enabled": true},
                {"type": "set_theme", "theme": "dark"}
            ]"#,
        )
        .unwrap();

        for command in commands {
            controller.dispatch(command).await.unwrap();
        }

        assert_eq!(
            controller.state().rendered(SurfaceId::Primary),
            Some("Emergency")
        );
        assert!(controller.primary().has_layer("drivetime-10"));
        assert_eq!(controller.state().theme(), Theme::Dark);
    }

    #[tokio::test]
    async fn rejected_overlay_on_comparison_restores_primary() {
        let mut controller = ViewController::new(
            Arc::new(visit_map_config::dashboard()),
            fetcher(),
            RejectingSurface::default(),
        );
        assert!(controller.initialize().await.unwrap());
        controller
            .attach_comparison(RejectingSurface::rejecting("drivetime-10"))
            .await
            .unwrap();

        let err = controller
            .set_overlay("drivetime-10", true)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ViewError::Surface(SurfaceError::DuplicateLayer { .. })
        ));
        assert!(!controller.state().overlay_enabled("drivetime-10"));
        assert_eq!(
            controller.overlay_state(SurfaceId::Primary, "drivetime-10"),
            OverlayState::Hidden
        );
        assert_eq!(
            controller.primary().inner.visibility("drivetime-10"),
            Some(Visibility::None)
        );
        assert_eq!(
            controller.overlay_state(SurfaceId::Comparison, "drivetime-10"),
            OverlayState::Absent
        );
    }

    #[tokio::test]
    async fn comparison_attaches_when_its_dataset_fails() {
        let mut controller = initialized().await;
        assert!(
            !controller
                .select_comparison_dataset("population")
                .await
                .unwrap()
        );

        controller
            .attach_comparison(MemorySurface::new())
            .await
            .unwrap();

        let comparison = controller.comparison().unwrap();
        assert!(comparison.has_layer("comparison-choropleth"));
        assert!(comparison.has_layer("comparison-hex-outline"));
        assert!(comparison.legend("comparison-legend").is_none());
        assert_eq!(controller.state().rendered(SurfaceId::Comparison), None);
        assert_eq!(
            controller.state().dataset(SurfaceId::Comparison),
            Some("population")
        );
    }
}
