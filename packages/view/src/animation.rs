//! Per-frame easing for the hover tooltip.
//!
//! The host drives these once per animation frame; nothing here owns a
//! timer.

use visit_map_choropleth::legend::format_number;

/// Gap between the cursor and the tooltip, in pixels.
pub const TOOLTIP_OFFSET: f64 = 10.0;

/// Minimum distance kept from the viewport edge, in pixels.
pub const EDGE_PADDING: f64 = 10.0;

/// Fraction of the remaining distance covered per frame.
pub const TOOLTIP_EASING: f64 = 0.1;

/// Screen position in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    /// Pixels from the left edge.
    pub x: f64,
    /// Pixels from the top edge.
    pub y: f64,
}

impl Point {
    /// Point at `(x, y)`.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Size of `width` by `height`.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Moves `current` a `factor` of the way toward `target`.
///
/// `factor` is clamped to `0..=1`.
#[must_use]
pub fn ease_toward(current: f64, target: f64, factor: f64) -> f64 {
    factor.clamp(0.0, 1.0).mul_add(target - current, current)
}

/// Where the tooltip wants to be for a given cursor position.
///
/// Sits below and to the right of the cursor, flipping to the other side
/// on an axis where it would run past the viewport edge.
#[must_use]
pub fn tooltip_target(mouse: Point, tooltip: Size, viewport: Size) -> Point {
    let x = if mouse.x + TOOLTIP_OFFSET + tooltip.width + EDGE_PADDING > viewport.width {
        mouse.x - tooltip.width - TOOLTIP_OFFSET
    } else {
        mouse.x + TOOLTIP_OFFSET
    };
    let y = if mouse.y + TOOLTIP_OFFSET + tooltip.height + EDGE_PADDING > viewport.height {
        mouse.y - tooltip.height - TOOLTIP_OFFSET
    } else {
        mouse.y + TOOLTIP_OFFSET
    };
    Point::new(x, y)
}

/// Eased tooltip position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TooltipTracker {
    position: Point,
}

impl TooltipTracker {
    /// Tracker resting at `position`.
    #[must_use]
    pub const fn new(position: Point) -> Self {
        Self { position }
    }

    /// Position after the last step.
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    /// Advances one frame toward the target for `mouse` and returns the new
    /// position.
    pub fn step(&mut self, mouse: Point, tooltip: Size, viewport: Size) -> Point {
        let target = tooltip_target(mouse, tooltip, viewport);
        self.position = Point::new(
            ease_toward(self.position.x, target.x, TOOLTIP_EASING),
            ease_toward(self.position.y, target.y, TOOLTIP_EASING),
        );
        self.position
    }
}

/// Eased opacity for showing and hiding the tooltip.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OpacityFade {
    current: f64,
    target: f64,
}

impl OpacityFade {
    /// Opacity after the last step, in `0..=1`.
    #[must_use]
    pub const fn current(&self) -> f64 {
        self.current
    }

    /// Fades toward fully opaque.
    pub const fn show(&mut self) {
        self.target = 1.0;
    }

    /// Fades toward fully transparent.
    pub const fn hide(&mut self) {
        self.target = 0.0;
    }

    /// Advances one frame and returns the new opacity.
    pub fn step(&mut self) -> f64 {
        self.current = ease_toward(self.current, self.target, TOOLTIP_EASING);
        self.current
    }

    /// Whether the opacity is within `epsilon` of its target.
    #[must_use]
    pub fn is_settled(&self, epsilon: f64) -> bool {
        (self.current - self.target).abs() <= epsilon
    }
}

/// Tooltip markup for a hovered hex.
#[must_use]
pub fn tooltip_text(visits: f64) -> String {
    format!("<strong>Visits:</strong> {}", format_number(visits))
}
