//! Left outer join of metric rows onto spatial features.
//!
//! Every feature in the base collection comes out the other side carrying
//! the metric property: the matched value, or `0` when no row shares its
//! key. Feature count and order are preserved.

use std::collections::BTreeMap;

use geojson::Feature;
use geojson::feature::Id;
use visit_map_dataset_models::{MetricRow, SpatialCollection};

/// Largest integer an `f64` represents exactly.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Builds a key to value lookup. Later rows overwrite earlier ones.
#[must_use]
pub fn metric_lookup(rows: &[MetricRow]) -> BTreeMap<&str, f64> {
    rows.iter().map(|row| (row.key.as_str(), row.value)).collect()
}

/// Returns a feature's join key.
///
/// Reads `key_property` from the property bag, accepting strings or
/// numbers, and falls back to the feature's top-level `id`.
#[must_use]
pub fn feature_key(feature: &Feature, key_property: &str) -> Option<String> {
    match feature.property(key_property) {
        Some(serde_json::Value::String(s)) => return Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => return Some(n.to_string()),
        _ => {}
    }

    match &feature.id {
        Some(Id::String(s)) => Some(s.trim().to_string()),
        Some(Id::Number(n)) => Some(n.to_string()),
        None => None,
    }
}

/// Encodes a metric as JSON, keeping whole numbers as integers.
#[must_use]
pub fn metric_json(value: f64) -> serde_json::Value {
    if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INT {
        #[allow(clippy::cast_possible_truncation)]
        let whole = value as i64;
        serde_json::Value::from(whole)
    } else {
        serde_json::Value::from(value)
    }
}

/// Joins `rows` onto a copy of `base`, writing each feature's metric to
/// `property_name`.
///
/// The base collection is never modified. Features whose key has no
/// matching row (or that have no key at all) get `0`.
#[must_use]
pub fn join_metric(
    base: &SpatialCollection,
    rows: &[MetricRow],
    key_property: &str,
    property_name: &str,
) -> SpatialCollection {
    let lookup = metric_lookup(rows);
    let mut joined = base.clone();
    let mut matched = 0usize;

    for feature in joined.features_mut() {
        let value = feature_key(feature, key_property)
            .and_then(|key| lookup.get(key.as_str()).copied())
            .inspect(|_| matched += 1)
            .unwrap_or(0.0);
        feature.set_property(property_name, metric_json(value));
    }

    log::debug!(
        "Joined {} rows onto {} features ({matched} matched, {} defaulted to 0)",
        rows.len(),
        joined.len(),
        joined.len() - matched
    );

    joined
}
