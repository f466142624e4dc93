//! Legend entries and value formatting.

use serde::{Deserialize, Serialize};

/// Decoration applied to legend values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendOptions {
    /// Prepended to each value (e.g. `"$"`).
    pub currency_prefix: Option<String>,
    /// Appended to each value (e.g. `"%"`).
    pub unit_suffix: Option<String>,
}

/// One swatch/label row of a legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    /// Swatch color.
    pub color: String,
    /// Range label, e.g. `"1,000-5,000"` or `"5,000+"`.
    pub label: String,
}

/// Formats a value with thousands separators and the configured
/// decoration. Whole numbers print without decimals; others keep up to
/// two.
#[must_use]
pub fn format_value(value: f64, options: &LegendOptions) -> String {
    format!(
        "{}{}{}",
        options.currency_prefix.as_deref().unwrap_or(""),
        format_number(value),
        options.unit_suffix.as_deref().unwrap_or(""),
    )
}

/// Formats a number with thousands separators and at most two decimals.
#[must_use]
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    if value < 0.0 && (int_part != "0" || !frac_part.is_empty()) {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Builds one legend entry per class.
///
/// Class `i` pairs `breaks[i]` with `breaks[i + 1]`; the last class is
/// open-ended (`"{low}+"`). Classes beyond the ramp reuse its last color.
/// Returns an empty list when fewer than two breaks or no colors are
/// given.
#[must_use]
pub fn build_legend(breaks: &[f64], colors: &[String], options: &LegendOptions) -> Vec<LegendEntry> {
    if breaks.len() < 2 || colors.is_empty() {
        return Vec::new();
    }

    let classes = breaks.len() - 1;
    (0..classes)
        .map(|i| {
            let low = format_value(breaks[i], options);
            let label = if i + 1 == classes {
                format!("{low}+")
            } else {
                format!("{low}-{}", format_value(breaks[i + 1], options))
            };
            LegendEntry {
                color: colors[i.min(colors.len() - 1)].clone(),
                label,
            }
        })
        .collect()
}
