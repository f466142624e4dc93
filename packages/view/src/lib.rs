#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! View controller for the visit map dashboard.
//!
//! Owns the application state (theme, dataset selections, overlay toggles)
//! and one or two map surfaces. UI events arrive as [`Command`]s; each one
//! re-runs the load → join → classify → render pipeline, toggles an
//! overlay, or restyles the surfaces for a theme.

pub mod animation;
pub mod command;
pub mod controller;
pub mod overlay;
pub mod state;
pub mod theme;

pub use command::Command;
pub use controller::{LoadedSelection, SelectionTicket, ViewController};
pub use overlay::{OverlayAction, OverlayState};
pub use state::{AppState, SurfaceId};

use thiserror::Error;
use visit_map_choropleth::SurfaceError;
use visit_map_dataset::DatasetError;

/// Errors returned by the view controller.
#[derive(Debug, Error)]
pub enum ViewError {
    /// Loading or parsing a file failed.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// The display surface rejected an update.
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// Serializing a collection for the display surface failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// No dataset with this id is configured.
    #[error("Unknown dataset '{id}'")]
    UnknownDataset {
        /// Requested dataset id.
        id: String,
    },

    /// No overlay with this id is configured.
    #[error("Unknown overlay '{id}'")]
    UnknownOverlay {
        /// Requested overlay id.
        id: String,
    },

    /// The hex geometry has not been loaded yet.
    #[error("View has not been initialized")]
    NotInitialized,
}
