#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dataset types shared by the join pipeline and the view controller.
//!
//! Tabular metrics are loaded as [`MetricRow`] values and joined onto a
//! [`SpatialCollection`] of hex polygons. The permit trend chart consumes a
//! [`PermitSeries`].

use geojson::{Feature, FeatureCollection};
use serde::{Deserialize, Serialize};

/// One row of a tabular metric dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    /// Identifier matching a spatial feature's join key (e.g. a hex id).
    pub key: String,
    /// Measured metric (visit count, income, population, ...).
    pub value: f64,
}

impl MetricRow {
    /// Creates a new row.
    #[must_use]
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// An ordered collection of spatial features.
///
/// The canonical base copy is kept behind an `Arc` by its owner; every join
/// produces a fresh collection so re-classification never mutates the base
/// geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialCollection {
    inner: FeatureCollection,
}

impl SpatialCollection {
    /// Wraps a `GeoJSON` feature collection.
    #[must_use]
    pub const fn new(inner: FeatureCollection) -> Self {
        Self { inner }
    }

    /// Builds a collection from individual features.
    #[must_use]
    pub fn from_features(features: Vec<Feature>) -> Self {
        Self {
            inner: FeatureCollection {
                bbox: None,
                features,
                foreign_members: None,
            },
        }
    }

    /// Returns the features in order.
    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.inner.features
    }

    /// Returns the features mutably.
    pub fn features_mut(&mut self) -> &mut [Feature] {
        &mut self.inner.features
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.features.len()
    }

    /// Whether the collection holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.features.is_empty()
    }

    /// Reads `property` from every feature as a number, treating missing
    /// or non-numeric values as `0`.
    pub fn metric_values<'a>(&'a self, property: &'a str) -> impl Iterator<Item = f64> + 'a {
        self.inner.features.iter().map(move |feature| {
            feature
                .property(property)
                .and_then(serde_json::Value::as_f64)
                .unwrap_or(0.0)
        })
    }

    /// Serializes the collection for a display source's `data` field.
    ///
    /// # Errors
    ///
    /// Returns an error if a feature carries a value that cannot be
    /// represented as JSON.
    pub fn to_json_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(&self.inner)
    }

    /// Returns the wrapped feature collection.
    #[must_use]
    pub fn into_inner(self) -> FeatureCollection {
        self.inner
    }
}

/// One month of the building-permit trend series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitPoint {
    /// Axis label, e.g. `"Jan 2024"`.
    pub label: String,
    /// Permits issued during the month.
    pub permits: u64,
}

/// Rolling building-permit counts in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitSeries {
    /// Points in file order.
    pub points: Vec<PermitPoint>,
}

impl PermitSeries {
    /// Axis labels in order.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.label.as_str()).collect()
    }

    /// Permit counts in order.
    #[must_use]
    pub fn counts(&self) -> Vec<u64> {
        self.points.iter().map(|p| p.permits).collect()
    }

    /// Largest monthly count, or `0` for an empty series.
    #[must_use]
    pub fn peak(&self) -> u64 {
        self.points.iter().map(|p| p.permits).max().unwrap_or(0)
    }
}

/// X-axis tick layout for the permit chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickConfig {
    /// Whether the chart may drop labels to avoid overlap.
    pub auto_skip: bool,
    /// Upper bound on visible ticks, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ticks_limit: Option<u32>,
    /// Maximum label rotation in degrees.
    pub max_rotation: u16,
    /// Minimum label rotation in degrees.
    pub min_rotation: u16,
}
