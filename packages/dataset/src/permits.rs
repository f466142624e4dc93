//! Building-permit trend series for the permits chart.

use visit_map_dataset_models::{PermitPoint, PermitSeries, TickConfig};

use crate::DatasetError;

/// Header of the month label column.
pub const MONTH_COLUMN: &str = "month";

/// Header of the permit count column.
pub const PERMITS_COLUMN: &str = "permits";

/// Screen widths below this get a reduced tick count.
pub const COMPACT_WIDTH_PX: u32 = 768;

/// Parses a permit CSV with `month` and `permits` columns.
///
/// Counts are rounded to whole permits; blank, negative, or unparseable
/// counts become `0`.
///
/// # Errors
///
/// Returns [`DatasetError`] if the CSV is malformed or a column is missing.
pub fn parse_permit_series(text: &str) -> Result<PermitSeries, DatasetError> {
    let rows = crate::parse::parse_metric_rows(text, MONTH_COLUMN, PERMITS_COLUMN)?;

    let points = rows
        .into_iter()
        .map(|row| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let permits = row.value.max(0.0).round() as u64;
            PermitPoint {
                label: row.key,
                permits,
            }
        })
        .collect();

    Ok(PermitSeries { points })
}

/// Chooses x-axis tick layout for a given screen width.
///
/// Narrow screens auto-skip down to six labels; wider screens show every
/// month. Labels are rotated 45 degrees either way.
#[must_use]
pub const fn tick_config(screen_width: u32) -> TickConfig {
    if screen_width < COMPACT_WIDTH_PX {
        TickConfig {
            auto_skip: true,
            max_ticks_limit: Some(6),
            max_rotation: 45,
            min_rotation: 45,
        }
    } else {
        TickConfig {
            auto_skip: false,
            max_ticks_limit: None,
            max_rotation: 45,
            min_rotation: 45,
        }
    }
}
