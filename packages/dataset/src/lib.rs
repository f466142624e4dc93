#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dataset fetching, parsing, and the metric spatial join.
//!
//! Static CSV and `GeoJSON` files are fetched through a [`Fetcher`],
//! parsed into [`MetricRow`]s and [`SpatialCollection`]s, and merged with
//! [`join::join_metric`] into an augmented collection ready for
//! classification.

pub mod fetch;
pub mod join;
pub mod parse;
pub mod permits;

pub use fetch::{Fetcher, FileFetcher, HttpFetcher, MemoryFetcher};

use thiserror::Error;
use visit_map_dataset_models::{MetricRow, PermitSeries, SpatialCollection};

/// Errors that can occur while loading datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("Request for {path} failed with status {status}")]
    Status {
        /// Requested path or URL.
        path: String,
        /// HTTP status code.
        status: u16,
    },

    /// I/O error reading a local file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] Box<geojson::Error>),

    /// A required CSV header column is missing.
    #[error("Missing column '{column}' in CSV header")]
    MissingColumn {
        /// Name of the missing column.
        column: String,
    },

    /// Data conversion error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Fetches and parses a metric CSV.
///
/// # Errors
///
/// Returns [`DatasetError`] if the fetch fails, the CSV is malformed, or
/// either column is missing from the header.
pub async fn load_metric_rows(
    fetcher: &dyn Fetcher,
    path: &str,
    key_column: &str,
    value_column: &str,
) -> Result<Vec<MetricRow>, DatasetError> {
    let text = fetcher.fetch_text(path).await?;
    let rows = parse::parse_metric_rows(&text, key_column, value_column)?;
    log::debug!("{path}: parsed {} metric rows", rows.len());
    Ok(rows)
}

/// Fetches and parses a `GeoJSON` feature collection.
///
/// # Errors
///
/// Returns [`DatasetError`] if the fetch fails or the payload is not a
/// `FeatureCollection`.
pub async fn load_collection(
    fetcher: &dyn Fetcher,
    path: &str,
) -> Result<SpatialCollection, DatasetError> {
    let text = fetcher.fetch_text(path).await?;
    let collection = parse::parse_collection(&text)?;
    log::debug!("{path}: parsed {} features", collection.len());
    Ok(collection)
}

/// Fetches and parses the building-permit trend CSV.
///
/// # Errors
///
/// Returns [`DatasetError`] if the fetch fails or the CSV lacks the
/// expected columns.
pub async fn load_permit_series(
    fetcher: &dyn Fetcher,
    path: &str,
) -> Result<PermitSeries, DatasetError> {
    let text = fetcher.fetch_text(path).await?;
    permits::parse_permit_series(&text)
}
