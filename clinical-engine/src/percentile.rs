//! LMS z-scores, normal-distribution conversions and reference row interpolation.

use crate::interpolation::{lerp, InterpolationPosition};
use error_common::{ClinicalError, Result};
use itertools::Itertools;
use reference_data::ReferencePoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// z-scores reported when a percentile sits at or beyond the ends of the scale
pub const Z_FLOOR: f64 = -4.0;
pub const Z_CEILING: f64 = 4.0;

/// Percentile curves reported alongside a growth measurement
pub const REFERENCE_CURVE_PERCENTILES: [f64; 9] = [3.0, 5.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 97.0];

/// LMS z-score of `value`.
///
/// Expects `value > 0`, `m > 0` and `s > 0`; nothing is clamped.
pub fn z_score(value: f64, l: f64, m: f64, s: f64) -> f64 {
    if l == 0.0 {
        (value / m).ln() / s
    } else {
        ((value / m).powf(l) - 1.0) / (l * s)
    }
}

/// Measurement value at a given z-score (inverse of [`z_score`]).
pub fn value_from_z(z: f64, l: f64, m: f64, s: f64) -> f64 {
    if l == 0.0 {
        m * (s * z).exp()
    } else {
        m * (1.0 + l * s * z).powf(1.0 / l)
    }
}

/// Error function, Abramowitz and Stegun 7.1.26 (|error| < 1.5e-7).
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

/// Standard normal cumulative distribution.
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Percentile (0..100) of a z-score.
pub fn percentile_from_z(z: f64) -> f64 {
    normal_cdf(z) * 100.0
}

/// z-score of a percentile, Abramowitz and Stegun 26.2.23 (|error| < 4.5e-4).
///
/// Percentiles at or beyond the ends of the scale map to [`Z_FLOOR`] and
/// [`Z_CEILING`].
pub fn z_from_percentile(percentile: f64) -> f64 {
    const C0: f64 = 2.515517;
    const C1: f64 = 0.802853;
    const C2: f64 = 0.010328;
    const D1: f64 = 1.432788;
    const D2: f64 = 0.189269;
    const D3: f64 = 0.001308;

    if percentile <= 0.0 {
        return Z_FLOOR;
    }
    if percentile >= 100.0 {
        return Z_CEILING;
    }

    let p = percentile / 100.0;
    let tail = if p < 0.5 { p } else { 1.0 - p };
    let t = (-2.0 * tail.ln()).sqrt();
    let magnitude = t - (C0 + C1 * t + C2 * t * t) / (1.0 + D1 * t + D2 * t * t + D3 * t * t * t);
    if p < 0.5 {
        -magnitude
    } else {
        magnitude
    }
}

/// LMS parameters at an arbitrary age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolatedLms {
    pub age_months: f64,
    pub l: f64,
    pub m: f64,
    pub s: f64,
    pub percentiles: BTreeMap<String, f64>,
    pub position: InterpolationPosition,
}

impl InterpolatedLms {
    fn from_row(point: &ReferencePoint, age_months: f64, position: InterpolationPosition) -> Self {
        Self {
            age_months,
            l: point.l,
            m: point.m,
            s: point.s,
            percentiles: point.percentiles.clone(),
            position,
        }
    }

    pub fn z_score(&self, value: f64) -> f64 {
        z_score(value, self.l, self.m, self.s)
    }

    pub fn value_at(&self, z: f64) -> f64 {
        value_from_z(z, self.l, self.m, self.s)
    }
}

/// LMS parameters at `age_months` from rows sorted ascending by age.
///
/// A tabulated age returns its row unchanged; otherwise the two rows on either
/// side are interpolated linearly on L, M, S and on every percentile label both
/// rows carry. Ages outside the table return the nearest end row, flagged as
/// clamped.
pub fn interpolate_reference(points: &[ReferencePoint], age_months: f64) -> Result<InterpolatedLms> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Err(ClinicalError::MissingReferenceData(
            "reference table has no rows".to_string(),
        ));
    };

    if let Some(row) = points.iter().find(|p| p.age_months == age_months) {
        return Ok(InterpolatedLms::from_row(row, age_months, InterpolationPosition::Exact));
    }
    if age_months < first.age_months {
        return Ok(InterpolatedLms::from_row(first, first.age_months, InterpolationPosition::ClampedBelow));
    }
    if age_months > last.age_months {
        return Ok(InterpolatedLms::from_row(last, last.age_months, InterpolationPosition::ClampedAbove));
    }

    let Some((lower, upper)) = points
        .iter()
        .tuple_windows()
        .find(|(a, b)| a.age_months < age_months && age_months < b.age_months)
    else {
        return Err(ClinicalError::MissingReferenceData(format!(
            "no bracketing rows for age {age_months} months"
        )));
    };

    let at = |y0: f64, y1: f64| lerp(lower.age_months, y0, upper.age_months, y1, age_months);
    let percentiles = lower
        .percentiles
        .iter()
        .filter_map(|(label, low)| {
            upper
                .percentiles
                .get(label)
                .map(|high| (label.clone(), at(*low, *high)))
        })
        .collect();

    Ok(InterpolatedLms {
        age_months,
        l: at(lower.l, upper.l),
        m: at(lower.m, upper.m),
        s: at(lower.s, upper.s),
        percentiles,
        position: InterpolationPosition::Interpolated,
    })
}

/// Reference curve values (P3 to P97) for LMS parameters.
pub fn reference_curves(lms: &InterpolatedLms) -> BTreeMap<String, f64> {
    REFERENCE_CURVE_PERCENTILES
        .iter()
        .map(|p| (format!("P{p}"), lms.value_at(z_from_percentile(*p))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reference_data::Sex;

    #[test]
    fn test_z_score_at_median_is_zero() {
        assert_eq!(z_score(16.0, -2.0, 16.0, 0.1), 0.0);
        assert_eq!(z_score(16.0, 0.0, 16.0, 0.1), 0.0);
    }

    #[test]
    fn test_z_score_box_cox_and_log_branches() {
        // L = 1 reduces to (value - M) / (M * S)
        assert!((z_score(17.6, 1.0, 16.0, 0.1) - 1.0).abs() < 1e-12);
        assert!((z_score(16.0 * 0.1f64.exp(), 0.0, 16.0, 0.1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_value_from_z_inverts_z_score() {
        for (l, m, s) in [(-2.15, 15.7, 0.1185), (0.0, 30.0, 0.12), (1.0, 138.4, 0.044)] {
            let value = value_from_z(1.645, l, m, s);
            assert!((z_score(value, l, m, s) - 1.645).abs() < 1e-9);
        }
    }

    #[test]
    fn test_percentile_from_z_known_points() {
        assert!((percentile_from_z(0.0) - 50.0).abs() < 1e-6);
        assert!((percentile_from_z(1.0) - 84.134).abs() < 1e-2);
        assert!((percentile_from_z(-1.96) - 2.5).abs() < 1e-2);
    }

    #[test]
    fn test_z_from_percentile_ends() {
        assert_eq!(z_from_percentile(0.0), -4.0);
        assert_eq!(z_from_percentile(-5.0), -4.0);
        assert_eq!(z_from_percentile(100.0), 4.0);
        assert!(z_from_percentile(50.0).abs() < 1e-3);
        assert!((z_from_percentile(97.5) - 1.96).abs() < 1e-3);
        assert!((z_from_percentile(2.5) + 1.96).abs() < 1e-3);
    }

    fn rows() -> Vec<ReferencePoint> {
        let mut a = ReferencePoint::new(Sex::Female, 96.0, -2.0, 16.0, 0.10);
        a.percentiles.insert("P50".into(), 16.0);
        a.percentiles.insert("P95".into(), 20.0);
        let mut b = ReferencePoint::new(Sex::Female, 108.0, -1.8, 17.0, 0.12);
        b.percentiles.insert("P50".into(), 17.0);
        vec![a, b]
    }

    #[test]
    fn test_interpolate_reference_midpoint() {
        let lms = interpolate_reference(&rows(), 102.0).unwrap();
        assert_eq!(lms.position, InterpolationPosition::Interpolated);
        assert!((lms.l + 1.9).abs() < 1e-12);
        assert!((lms.m - 16.5).abs() < 1e-12);
        assert!((lms.s - 0.11).abs() < 1e-12);
        assert_eq!(lms.percentiles.get("P50"), Some(&16.5));
        assert!(!lms.percentiles.contains_key("P95"));
    }

    #[test]
    fn test_interpolate_reference_exact_and_clamped() {
        let exact = interpolate_reference(&rows(), 108.0).unwrap();
        assert_eq!((exact.m, exact.position), (17.0, InterpolationPosition::Exact));

        let below = interpolate_reference(&rows(), 60.0).unwrap();
        assert_eq!(below.position, InterpolationPosition::ClampedBelow);
        assert_eq!(below.m, 16.0);

        let single = interpolate_reference(&rows()[..1], 200.0).unwrap();
        assert_eq!(single.m, 16.0);
    }

    #[test]
    fn test_interpolate_reference_empty_table() {
        assert!(matches!(
            interpolate_reference(&[], 24.0),
            Err(ClinicalError::MissingReferenceData(_))
        ));
    }

    #[test]
    fn test_reference_curves_are_ordered() {
        let lms = interpolate_reference(&rows(), 100.0).unwrap();
        let curves = reference_curves(&lms);
        assert_eq!(curves.len(), 9);
        assert!(curves["P3"] < curves["P50"] && curves["P50"] < curves["P97"]);
        assert!((curves["P50"] - lms.m).abs() < 0.01);
    }
}
