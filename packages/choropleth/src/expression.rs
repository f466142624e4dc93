//! Paint expressions for choropleth fills.

use serde_json::{Value, json};

/// Builds a linear `interpolate` expression mapping `property` to a color.
///
/// Each class lower bound (`breaks[0..classes]`) becomes a stop paired
/// with the class color, so values below the first break take the first
/// color and values at or above the last stop take the last. Stops stop at
/// the shorter of the class count and the ramp length.
///
/// Returns `None` when fewer than two breaks or no colors are given.
#[must_use]
pub fn build_color_expression(property: &str, breaks: &[f64], colors: &[String]) -> Option<Value> {
    if breaks.len() < 2 || colors.is_empty() {
        return None;
    }

    let mut expression = vec![json!("interpolate"), json!(["linear"]), json!(["get", property])];
    for (stop, color) in breaks[..breaks.len() - 1].iter().zip(colors) {
        expression.push(json!(stop));
        expression.push(json!(color));
    }

    Some(Value::Array(expression))
}

/// Filter keeping only features whose `property` is positive.
#[must_use]
pub fn positive_filter(property: &str) -> Value {
    json!([">", ["get", property], 0])
}
