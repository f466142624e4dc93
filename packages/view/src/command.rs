//! Typed UI commands.

use serde::{Deserialize, Serialize};
use visit_map_config_models::Theme;

/// A user action forwarded from the UI.
///
/// Serialized with a `type` tag, e.g.
/// `{"type": "toggle_overlay", "id": "drivetime-10", "enabled": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Department select changed.
    SelectDataset {
        /// Dataset id.
        id: String,
    },
    /// Comparison select changed.
    SelectComparisonDataset {
        /// Dataset id.
        id: String,
    },
    /// Overlay checkbox changed.
    ToggleOverlay {
        /// Overlay id.
        id: String,
        /// New checkbox state.
        enabled: bool,
    },
    /// Theme radio changed.
    SetTheme {
        /// Selected theme.
        theme: Theme,
    },
}
