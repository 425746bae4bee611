//! Sparse threshold table lookup.
//!
//! Tables are keyed by a discrete category and then a numeric secondary key
//! (postnatal hour, height percentile). Between tabulated keys values are
//! linearly interpolated; outside the tabulated range they are clamped to the
//! nearest end and the clamp is reported back to the caller.

use error_common::{ClinicalError, Result};
use itertools::Itertools;
use reference_data::{ThresholdCurve, ThresholdTable};
use serde::{Deserialize, Serialize};

/// Where a lookup key fell relative to the tabulated keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterpolationPosition {
    Exact,
    Interpolated,
    ClampedBelow,
    ClampedAbove,
}

impl InterpolationPosition {
    pub fn is_clamped(self) -> bool {
        matches!(
            self,
            InterpolationPosition::ClampedBelow | InterpolationPosition::ClampedAbove
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdLookup {
    pub value: f64,
    pub position: InterpolationPosition,
}

/// Straight line through `(x0, y0)` and `(x1, y1)` evaluated at `x`.
pub fn lerp(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    if x1 == x0 {
        return y0;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Evaluates a curve at `x`, clamping outside its key range.
///
/// # Errors
///
/// `InvalidReferenceData` for a curve without points.
pub fn evaluate_curve(curve: &ThresholdCurve, x: f64) -> Result<ThresholdLookup> {
    let points = curve.points();
    let (Some(&(min_key, min_value)), Some(&(max_key, max_value))) = (points.first(), points.last())
    else {
        return Err(ClinicalError::InvalidReferenceData(
            "threshold curve has no points".to_string(),
        ));
    };

    if let Some(&(_, value)) = points.iter().find(|(key, _)| *key == x) {
        return Ok(ThresholdLookup {
            value,
            position: InterpolationPosition::Exact,
        });
    }
    if x <= min_key {
        return Ok(ThresholdLookup {
            value: min_value,
            position: InterpolationPosition::ClampedBelow,
        });
    }
    if x >= max_key {
        return Ok(ThresholdLookup {
            value: max_value,
            position: InterpolationPosition::ClampedAbove,
        });
    }

    let value = points
        .iter()
        .tuple_windows()
        .find(|((x0, _), (x1, _))| *x0 < x && x < *x1)
        .map_or(max_value, |(&(x0, y0), &(x1, y1))| lerp(x0, y0, x1, y1, x));
    Ok(ThresholdLookup {
        value,
        position: InterpolationPosition::Interpolated,
    })
}

/// Full lookup, reporting whether the key was tabulated, interpolated or clamped.
pub fn lookup(table: &ThresholdTable, category: &str, x: f64) -> Result<ThresholdLookup> {
    let curve = table
        .curve(category)
        .ok_or_else(|| ClinicalError::MissingCategory(category.to_string()))?;
    evaluate_curve(curve, x)
}

pub fn interpolate(table: &ThresholdTable, category: &str, x: f64) -> Result<f64> {
    lookup(table, category, x).map(|l| l.value)
}

/// A curve defined as a fixed offset below a stored one, floored at zero.
pub fn derived(table: &ThresholdTable, category: &str, x: f64, offset: f64) -> Result<f64> {
    interpolate(table, category, x).map(|value| (value - offset).max(0.0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BucketStatus {
    Exact,
    Nearest,
    BelowRange,
    AboveRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketMatch<K> {
    pub key: K,
    pub status: BucketStatus,
}

fn as_f64<K: Into<f64>>(key: K) -> f64 {
    key.into()
}

/// Picks the tabulated key closest to `target`; ties go to the lower key.
///
/// Returns `None` only when `keys` is empty.
pub fn nearest_bucket<K>(keys: &[K], target: f64) -> Option<BucketMatch<K>>
where
    K: Copy + Into<f64>,
{
    let sorted: Vec<K> = keys
        .iter()
        .copied()
        .sorted_by(|a, b| as_f64(*a).total_cmp(&as_f64(*b)))
        .collect();
    let lowest = as_f64(*sorted.first()?);
    let highest = as_f64(*sorted.last()?);

    // min_by keeps the first of equal elements, so ascending order breaks ties low
    let key = sorted.iter().copied().min_by(|a, b| {
        let da = (as_f64(*a) - target).abs();
        let db = (as_f64(*b) - target).abs();
        da.total_cmp(&db)
    })?;

    let status = if as_f64(key) == target {
        BucketStatus::Exact
    } else if target < lowest {
        BucketStatus::BelowRange
    } else if target > highest {
        BucketStatus::AboveRange
    } else {
        BucketStatus::Nearest
    };
    Some(BucketMatch { key, status })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn table() -> ThresholdTable {
        let mut curves = BTreeMap::new();
        curves.insert(
            "40_noRisk".to_string(),
            vec![(12.0, 9.0), (24.0, 11.0), (48.0, 14.0), (96.0, 16.0)],
        );
        ThresholdTable::from_curves("mg/dL", curves).unwrap()
    }

    #[test]
    fn test_interpolates_between_keys() {
        let found = lookup(&table(), "40_noRisk", 72.0).unwrap();
        assert_eq!(found.position, InterpolationPosition::Interpolated);
        assert!((found.value - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_exact_key_returns_tabulated_value() {
        let found = lookup(&table(), "40_noRisk", 24.0).unwrap();
        assert_eq!(found, ThresholdLookup { value: 11.0, position: InterpolationPosition::Exact });
    }

    #[test]
    fn test_clamps_outside_range() {
        let below = lookup(&table(), "40_noRisk", 6.0).unwrap();
        assert_eq!(below.value, 9.0);
        assert_eq!(below.position, InterpolationPosition::ClampedBelow);

        let above = lookup(&table(), "40_noRisk", 200.0).unwrap();
        assert_eq!(above.value, 16.0);
        assert!(above.position.is_clamped());
    }

    #[test]
    fn test_single_point_curve_clamps_both_ways() {
        let curve = ThresholdCurve::new(vec![(24.0, 11.0)]).unwrap();
        assert_eq!(evaluate_curve(&curve, 24.0).unwrap().position, InterpolationPosition::Exact);
        assert_eq!(evaluate_curve(&curve, 6.0).unwrap().position, InterpolationPosition::ClampedBelow);
        assert_eq!(evaluate_curve(&curve, 48.0).unwrap().position, InterpolationPosition::ClampedAbove);
        assert!(ThresholdCurve::new(vec![]).is_err());
    }

    #[test]
    fn test_unknown_category() {
        let err = interpolate(&table(), "34_noRisk", 24.0).unwrap_err();
        assert_eq!(err, ClinicalError::MissingCategory("34_noRisk".into()));
    }

    #[test]
    fn test_derived_curve_floors_at_zero() {
        assert!((derived(&table(), "40_noRisk", 72.0, 2.0).unwrap() - 13.0).abs() < 1e-12);
        assert_eq!(derived(&table(), "40_noRisk", 12.0, 50.0).unwrap(), 0.0);
    }

    #[test]
    fn test_nearest_bucket_ties_resolve_low() {
        let buckets: [u8; 7] = [5, 10, 25, 50, 75, 90, 95];
        let tie = nearest_bucket(&buckets, 37.5).unwrap();
        assert_eq!(tie, BucketMatch { key: 25, status: BucketStatus::Nearest });

        assert_eq!(nearest_bucket(&buckets, 60.0).unwrap().key, 50);
        assert_eq!(nearest_bucket(&buckets, 75.0).unwrap().status, BucketStatus::Exact);
        assert_eq!(
            nearest_bucket(&buckets, 2.0).unwrap(),
            BucketMatch { key: 5, status: BucketStatus::BelowRange }
        );
        assert_eq!(nearest_bucket(&buckets, 99.0).unwrap().status, BucketStatus::AboveRange);
        assert!(nearest_bucket::<u8>(&[], 50.0).is_none());
    }

    #[test]
    fn test_nearest_bucket_accepts_unsorted_keys() {
        let buckets = [95.0, 5.0, 50.0];
        assert_eq!(nearest_bucket(&buckets, 27.5).unwrap().key, 5.0);
    }
}
