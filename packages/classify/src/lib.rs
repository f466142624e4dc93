#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Jenks natural-breaks classification.
//!
//! Partitions a set of positive metric values into contiguous classes that
//! minimize the within-class sum of squared deviations. The resulting
//! boundaries feed the choropleth color expression and legend.
//!
//! Classification runs over the *distinct* values weighted by how often
//! each occurs, so equal values always land in the same class and every
//! boundary is distinct.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of classes used by the dashboard.
pub const DEFAULT_CLASS_COUNT: usize = 5;

/// Reasons a boundary list cannot be used as [`ClassBreaks`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BreaksError {
    /// Fewer than two boundaries.
    #[error("Class breaks need at least 2 bounds, got {count}")]
    TooFew {
        /// Number of bounds supplied.
        count: usize,
    },

    /// A boundary is not finite or not greater than the one before it.
    #[error("Class breaks must be finite and strictly ascending (index {index})")]
    NotAscending {
        /// Index of the offending bound.
        index: usize,
    },
}

/// Ascending class boundaries produced by [`compute_breaks`].
///
/// Holds `classes() + 1` strictly ascending values. The first is the
/// minimum input value, the last is the maximum, and each interior value is
/// the lower bound of the corresponding class. Serialized as a plain array;
/// deserialization rejects lists that break these rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ClassBreaks {
    bounds: Vec<f64>,
}

impl TryFrom<Vec<f64>> for ClassBreaks {
    type Error = BreaksError;

    fn try_from(bounds: Vec<f64>) -> Result<Self, Self::Error> {
        if bounds.len() < 2 {
            return Err(BreaksError::TooFew {
                count: bounds.len(),
            });
        }
        if let Some(index) = bounds.iter().position(|b| !b.is_finite()) {
            return Err(BreaksError::NotAscending { index });
        }
        if let Some(index) = bounds.windows(2).position(|w| w[0] >= w[1]) {
            return Err(BreaksError::NotAscending { index: index + 1 });
        }
        Ok(Self { bounds })
    }
}

impl From<ClassBreaks> for Vec<f64> {
    fn from(breaks: ClassBreaks) -> Self {
        breaks.bounds
    }
}

impl ClassBreaks {
    /// Returns the boundaries in ascending order.
    #[must_use]
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Number of classes described by these boundaries.
    #[must_use]
    pub fn classes(&self) -> usize {
        self.bounds.len() - 1
    }

    /// Smallest classified value.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.bounds[0]
    }

    /// Largest classified value.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.bounds[self.bounds.len() - 1]
    }

    /// Iterates `(low, high)` pairs for each class.
    pub fn ranges(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.bounds.windows(2).map(|w| (w[0], w[1]))
    }

    /// Returns the class index a value falls into, clamping values outside
    /// the classified range to the first or last class.
    #[must_use]
    pub fn class_of(&self, value: f64) -> usize {
        let last = self.classes() - 1;
        self.bounds[1..self.bounds.len() - 1]
            .iter()
            .position(|&lower| value < lower)
            .unwrap_or(last)
    }

    /// Consumes the breaks, returning the raw boundary vector.
    #[must_use]
    pub fn into_bounds(self) -> Vec<f64> {
        self.bounds
    }
}

/// Keeps only finite, strictly positive values.
///
/// Zero and negative metrics mean "no data" and must not pull the class
/// boundaries down.
pub fn positive_values(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    values
        .into_iter()
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect()
}

/// Computes Jenks natural breaks for `values` using up to `k` classes.
///
/// Non-positive and non-finite values are ignored. Returns `None` when
/// fewer than two distinct values remain or `k` is zero; callers treat that
/// as "leave the current rendering alone".
///
/// The effective class count is `min(k, distinct - 1)`, so two distinct
/// values yield the single class `[min, max]`. The partition itself is
/// unconstrained Jenks. When the top class holds only the maximum, its
/// lower bound is emitted halfway between the class below and the maximum
/// so the boundaries stay strictly ascending.
#[must_use]
pub fn compute_breaks(values: &[f64], k: usize) -> Option<ClassBreaks> {
    if k == 0 {
        return None;
    }

    let groups = distinct_groups(values);
    let distinct = groups.len();
    if distinct < 2 {
        log::trace!("compute_breaks: {distinct} distinct values, not classifiable");
        return None;
    }

    let classes = k.min(distinct - 1);
    let sums = PrefixSums::new(&groups);

    let max = groups[distinct - 1].0;

    let mut bounds = Vec::with_capacity(classes + 1);
    bounds.push(groups[0].0);
    for start in class_starts(&sums, distinct, classes) {
        if start == distinct - 1 {
            // Lone maximum: split between it and the class below.
            bounds.push(groups[start - 1].0.midpoint(max));
        } else {
            bounds.push(groups[start].0);
        }
    }
    bounds.push(max);

    log::trace!(
        "compute_breaks: {} values, {distinct} distinct, {classes} classes -> {bounds:?}",
        values.len()
    );

    Some(ClassBreaks { bounds })
}

/// Sorted distinct positive values paired with their multiplicity.
fn distinct_groups(values: &[f64]) -> Vec<(f64, f64)> {
    let mut sorted = positive_values(values.iter().copied());
    sorted.sort_by(f64::total_cmp);

    let mut groups: Vec<(f64, f64)> = Vec::new();
    for value in sorted {
        match groups.last_mut() {
            Some((last, weight)) if last.total_cmp(&value).is_eq() => *weight += 1.0,
            _ => groups.push((value, 1.0)),
        }
    }
    groups
}

/// Weighted prefix sums for O(1) range variance.
struct PrefixSums {
    weight: Vec<f64>,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl PrefixSums {
    fn new(groups: &[(f64, f64)]) -> Self {
        let mut weight = vec![0.0; groups.len() + 1];
        let mut sum = vec![0.0; groups.len() + 1];
        let mut sum_sq = vec![0.0; groups.len() + 1];

        for (i, &(value, count)) in groups.iter().enumerate() {
            weight[i + 1] = weight[i] + count;
            sum[i + 1] = count.mul_add(value, sum[i]);
            sum_sq[i + 1] = (count * value).mul_add(value, sum_sq[i]);
        }

        Self {
            weight,
            sum,
            sum_sq,
        }
    }

    /// Sum of squared deviations over groups `start..=end`.
    fn deviation(&self, start: usize, end: usize) -> f64 {
        let w = self.weight[end + 1] - self.weight[start];
        let s = self.sum[end + 1] - self.sum[start];
        let q = self.sum_sq[end + 1] - self.sum_sq[start];
        (q - s * s / w).max(0.0)
    }
}

/// Returns the starting group index of classes `2..=classes`.
///
/// Dynamic program over `cost[c][j]`: the minimal total deviation of
/// splitting groups `0..=j` into `c + 1` classes. `start[c][j]` records
/// where the last of those classes begins.
fn class_starts(sums: &PrefixSums, distinct: usize, classes: usize) -> Vec<usize> {
    let mut cost = vec![vec![f64::INFINITY; distinct]; classes];
    let mut start = vec![vec![0usize; distinct]; classes];

    for j in 0..distinct {
        cost[0][j] = sums.deviation(0, j);
    }

    for c in 1..classes {
        for j in c..distinct {
            for i in c..=j {
                let candidate = cost[c - 1][i - 1] + sums.deviation(i, j);
                if candidate < cost[c][j] {
                    cost[c][j] = candidate;
                    start[c][j] = i;
                }
            }
        }
    }

    let mut starts = vec![0usize; classes - 1];
    let mut end = distinct - 1;
    for c in (1..classes).rev() {
        let s = start[c][end];
        starts[c - 1] = s;
        end = s - 1;
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_bounds(breaks: &ClassBreaks, expected: &[f64]) {
        assert_eq!(breaks.bounds().len(), expected.len(), "{breaks:?}");
        for (actual, want) in breaks.bounds().iter().zip(expected) {
            assert!((actual - want).abs() < f64::EPSILON, "{breaks:?}");
        }
    }

    #[test]
    fn two_distinct_values_collapse_to_single_class() {
        let breaks = compute_breaks(&[10.0, 50.0], 2).unwrap();
        assert_bounds(&breaks, &[10.0, 50.0]);
        assert_eq!(breaks.classes(), 1);
    }

    #[test]
    fn separates_obvious_clusters() {
        let values = [1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 100.0, 101.0];
        let breaks = compute_breaks(&values, 3).unwrap();
        assert_bounds(&breaks, &[1.0, 10.0, 100.0, 101.0]);
    }

    #[test]
    fn never_splits_equal_values() {
        let values = [1.0, 1.0, 2.0, 2.0, 9.0, 10.0];
        let breaks = compute_breaks(&values, 2).unwrap();
        assert_bounds(&breaks, &[1.0, 9.0, 10.0]);
    }

    #[test]
    fn ties_keep_the_earliest_split() {
        let breaks = compute_breaks(&[1.0, 2.0, 3.0], 2).unwrap();
        assert_bounds(&breaks, &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn lone_outlier_gets_its_own_class() {
        let values = [1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 1000.0];
        let breaks = compute_breaks(&values, 3).unwrap();

        assert_bounds(&breaks, &[1.0, 10.0, 506.0, 1000.0]);
        assert_eq!(breaks.class_of(12.0), 1);
        assert_eq!(breaks.class_of(1000.0), 2);
    }

    #[test]
    fn singleton_classes_stay_ascending() {
        let values = [5.0, 5.0, 6.0, 40.0, 41.0, 9_000.0];
        let breaks = compute_breaks(&values, 5).unwrap();

        assert_bounds(&breaks, &[5.0, 6.0, 40.0, 4_520.5, 9_000.0]);
        assert_eq!(breaks.class_of(41.0), 2);
        assert_eq!(breaks.class_of(9_000.0), 3);
    }

    #[test]
    fn deserialization_enforces_invariants() {
        assert!(serde_json::from_str::<ClassBreaks>("[5.0]").is_err());
        assert!(serde_json::from_str::<ClassBreaks>("[]").is_err());
        assert!(serde_json::from_str::<ClassBreaks>("[1.0, 1.0]").is_err());
        assert!(serde_json::from_str::<ClassBreaks>("[1.0, 9.0, 4.0]").is_err());
        assert_eq!(
            ClassBreaks::try_from(vec![3.0]),
            Err(BreaksError::TooFew { count: 1 })
        );
        assert_eq!(
            ClassBreaks::try_from(vec![1.0, 9.0, 4.0]),
            Err(BreaksError::NotAscending { index: 2 })
        );

        let breaks: ClassBreaks = serde_json::from_str("[1.0, 5.0, 9.0]").unwrap();
        assert_eq!(breaks.classes(), 2);
        assert_eq!(breaks.class_of(6.0), 1);
    }

    #[test]
    fn serializes_as_plain_array() {
        let breaks = compute_breaks(&[10.0, 50.0], 2).unwrap();
        let json = serde_json::to_string(&breaks).unwrap();
        assert_eq!(json, "[10.0,50.0]");
        assert_eq!(serde_json::from_str::<ClassBreaks>(&json).unwrap(), breaks);
    }

    #[test]
    fn returns_k_plus_one_ascending_bounds() {
        let values: Vec<f64> = [4, 8, 15, 16, 23, 42, 57, 61, 99, 140, 141, 300]
            .iter()
            .map(|&v| f64::from(v))
            .collect();
        let breaks = compute_breaks(&values, 5).unwrap();

        assert_eq!(breaks.bounds().len(), 6);
        assert!((breaks.min() - 4.0).abs() < f64::EPSILON);
        assert!((breaks.max() - 300.0).abs() < f64::EPSILON);
        assert!(breaks.bounds().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn unsorted_input_is_handled() {
        let breaks = compute_breaks(&[101.0, 3.0, 12.0, 1.0, 100.0, 10.0, 2.0, 11.0], 3).unwrap();
        assert_bounds(&breaks, &[1.0, 10.0, 100.0, 101.0]);
    }

    #[test]
    fn ignores_zero_and_negative_values() {
        assert!(compute_breaks(&[0.0, -3.0, 7.0, 7.0], 5).is_none());

        let breaks = compute_breaks(&[0.0, 0.0, 5.0, 20.0], 5).unwrap();
        assert_bounds(&breaks, &[5.0, 20.0]);
    }

    #[test]
    fn unclassifiable_inputs_return_none() {
        assert!(compute_breaks(&[], 5).is_none());
        assert!(compute_breaks(&[5.0, 5.0, 5.0], 5).is_none());
        assert!(compute_breaks(&[f64::NAN, 3.0], 5).is_none());
        assert!(compute_breaks(&[1.0, 2.0], 0).is_none());
    }

    #[test]
    fn is_deterministic() {
        let values = [3.0, 7.0, 7.0, 8.0, 20.0, 21.0, 22.0, 50.0, 51.0, 90.0];
        let first = compute_breaks(&values, 4);
        let second = compute_breaks(&values, 4);
        assert_eq!(first, second);
    }

    #[test]
    fn class_of_clamps_to_range() {
        let breaks = compute_breaks(&[1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 100.0, 101.0], 3).unwrap();
        assert_eq!(breaks.class_of(0.5), 0);
        assert_eq!(breaks.class_of(2.0), 0);
        assert_eq!(breaks.class_of(10.0), 1);
        assert_eq!(breaks.class_of(100.0), 2);
        assert_eq!(breaks.class_of(5_000.0), 2);
    }

    #[test]
    fn ranges_pair_adjacent_bounds() {
        let breaks = compute_breaks(&[1.0, 2.0, 3.0], 2).unwrap();
        let ranges: Vec<_> = breaks.ranges().collect();
        assert_eq!(ranges, vec![(1.0, 2.0), (2.0, 3.0)]);
    }

    #[test]
    fn positive_values_filters_no_data() {
        let kept = positive_values([0.0, 4.0, -1.0, f64::INFINITY, 2.5]);
        assert_eq!(kept, vec![4.0, 2.5]);
    }
}
