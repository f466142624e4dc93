//! Overlay layer state machine.
//!
//! Every overlay on every surface is in one of three states. Registration
//! happens once, on the first enable; after that the layer is only ever
//! shown or hidden through its visibility property.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Lifecycle of one overlay on one surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OverlayState {
    /// Source and layer are not registered.
    #[default]
    Absent,
    /// Registered with visibility `none`.
    Hidden,
    /// Registered and drawn.
    Visible,
}

/// Surface work needed to honor a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum OverlayAction {
    /// Fetch the data, then register the source and layer.
    Register,
    /// Set visibility to `visible`.
    Show,
    /// Set visibility to `none`.
    Hide,
    /// Nothing to do.
    Keep,
}

impl OverlayAction {
    /// State the overlay ends up in once this action succeeds.
    #[must_use]
    pub const fn next_state(self, current: OverlayState) -> OverlayState {
        match self {
            Self::Register | Self::Show => OverlayState::Visible,
            Self::Hide => OverlayState::Hidden,
            Self::Keep => current,
        }
    }
}

/// Decides what a toggle does to an overlay in `state`.
#[must_use]
pub const fn transition(state: OverlayState, enable: bool) -> OverlayAction {
    match (state, enable) {
        (OverlayState::Absent, true) => OverlayAction::Register,
        (OverlayState::Hidden, true) => OverlayAction::Show,
        (OverlayState::Visible, false) => OverlayAction::Hide,
        (OverlayState::Visible, true) | (OverlayState::Absent | OverlayState::Hidden, false) => {
            OverlayAction::Keep
        }
    }
}
