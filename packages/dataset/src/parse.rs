//! CSV and `GeoJSON` parsing.

use geojson::GeoJson;
use visit_map_dataset_models::{MetricRow, SpatialCollection};

use crate::DatasetError;

/// Parses a metric cell, treating blank or unparseable text as `0`.
///
/// Thousands separators are stripped first, so `"1,204"` parses as `1204`.
#[must_use]
pub fn parse_numeric(raw: &str) -> f64 {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parses a delimited metric file with a header row.
///
/// Rows with an empty key are skipped. Duplicate keys are kept in file
/// order; the join resolves them last-wins.
///
/// # Errors
///
/// Returns [`DatasetError::MissingColumn`] if either column is absent from
/// the header, or [`DatasetError::Csv`] if a record cannot be read.
pub fn parse_metric_rows(
    text: &str,
    key_column: &str,
    value_column: &str,
) -> Result<Vec<MetricRow>, DatasetError> {
    let text = text.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let key_idx = column_index(&headers, key_column)?;
    let value_idx = column_index(&headers, value_column)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = result?;
        let key = record.get(key_idx).unwrap_or("");
        if key.is_empty() {
            skipped += 1;
            continue;
        }
        let value = parse_numeric(record.get(value_idx).unwrap_or(""));
        rows.push(MetricRow::new(key, value));
    }

    if skipped > 0 {
        log::debug!("Skipped {skipped} rows with an empty '{key_column}'");
    }

    Ok(rows)
}

fn column_index(headers: &csv::StringRecord, column: &str) -> Result<usize, DatasetError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| DatasetError::MissingColumn {
            column: column.to_string(),
        })
}

/// Parses a `GeoJSON` document that must be a `FeatureCollection`.
///
/// # Errors
///
/// Returns [`DatasetError::GeoJson`] for malformed input, or
/// [`DatasetError::Conversion`] if the document is a bare geometry or
/// feature.
pub fn parse_collection(text: &str) -> Result<SpatialCollection, DatasetError> {
    match text.parse::<GeoJson>().map_err(Box::new)? {
        GeoJson::FeatureCollection(collection) => Ok(SpatialCollection::new(collection)),
        GeoJson::Feature(_) => Err(DatasetError::Conversion {
            message: "Expected a FeatureCollection, found a Feature".to_string(),
        }),
        GeoJson::Geometry(_) => Err(DatasetError::Conversion {
            message: "Expected a FeatureCollection, found a Geometry".to_string(),
        }),
    }
}
