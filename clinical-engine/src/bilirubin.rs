//! Neonatal hyperbilirubinemia risk.

use crate::classification::{BilirubinRiskLevel, Bound, RuleSet};
use crate::interpolation::{derived, lookup, InterpolationPosition};
use error_common::{ClinicalError, Result};
use reference_data::BilirubinThresholds;
use serde::{Deserialize, Serialize};
use tracing::debug_span;

pub const MIN_AGE_HOURS: f64 = 12.0;
pub const MAX_AGE_HOURS: f64 = 336.0;

/// Gestational ages (completed weeks) with their own threshold curves; older
/// infants use the last one
pub const MIN_GESTATIONAL_AGE_WEEKS: u8 = 35;
pub const MAX_GESTATIONAL_AGE_WEEKS: u8 = 40;

/// Threshold table key for a gestational age and neurotoxicity risk status,
/// e.g. `38_withRisk`.
pub fn risk_category_for(gestational_age_weeks: f64, has_risk_factors: bool) -> Result<String> {
    let min = MIN_GESTATIONAL_AGE_WEEKS;
    let weeks = (min..=MAX_GESTATIONAL_AGE_WEEKS)
        .rev()
        .find(|week| f64::from(*week) <= gestational_age_weeks)
        .ok_or_else(|| {
            ClinicalError::OutOfDomain(format!(
                "gestational age {gestational_age_weeks} weeks is below {min} weeks"
            ))
        })?;
    let risk = if has_risk_factors { "withRisk" } else { "noRisk" };
    Ok(format!("{weeks}_{risk}"))
}

/// Treatment thresholds at the infant's age (mg/dL)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BilirubinCutPoints {
    pub confirm_with_tsb: f64,
    pub phototherapy: f64,
    pub escalation_of_care: f64,
    pub exchange_transfusion: f64,
}

impl BilirubinCutPoints {
    pub fn rules(&self) -> RuleSet<BilirubinRiskLevel> {
        RuleSet::new(BilirubinRiskLevel::Routine)
            .rule(BilirubinRiskLevel::ExchangeTransfusion, Bound::AtLeast(self.exchange_transfusion))
            .rule(BilirubinRiskLevel::EscalationOfCare, Bound::AtLeast(self.escalation_of_care))
            .rule(BilirubinRiskLevel::Phototherapy, Bound::AtLeast(self.phototherapy))
            .rule(BilirubinRiskLevel::ConfirmWithTsb, Bound::AtLeast(self.confirm_with_tsb))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BilirubinResult {
    pub age_hours: f64,
    pub total_bilirubin_mg_dl: f64,
    pub risk_category: String,
    pub thresholds: BilirubinCutPoints,
    /// How the age sat against the tabulated hours
    pub position: InterpolationPosition,
    /// Distance below (negative) or above the phototherapy threshold
    pub phototherapy_margin: f64,
    pub level: BilirubinRiskLevel,
}

impl BilirubinResult {
    pub fn label(&self) -> String {
        self.level.to_string()
    }
}

/// Grades a total serum bilirubin against the treatment curves for a risk category.
pub fn compute_bilirubin_risk(
    age_hours: f64,
    total_bilirubin_mg_dl: f64,
    risk_category: &str,
    thresholds: &BilirubinThresholds,
) -> Result<BilirubinResult> {
    let _span = debug_span!("bilirubin", category = risk_category).entered();

    if !(MIN_AGE_HOURS..=MAX_AGE_HOURS).contains(&age_hours) {
        return Err(ClinicalError::out_of_range(
            "age_hours",
            age_hours,
            MIN_AGE_HOURS,
            MAX_AGE_HOURS,
        ));
    }

    let photo = lookup(thresholds.phototherapy(), risk_category, age_hours)?;
    let exchange = lookup(thresholds.exchange_transfusion(), risk_category, age_hours)?;
    let cut_points = BilirubinCutPoints {
        confirm_with_tsb: derived(
            thresholds.phototherapy(),
            risk_category,
            age_hours,
            thresholds.confirm_offset(),
        )?,
        phototherapy: photo.value,
        escalation_of_care: derived(
            thresholds.exchange_transfusion(),
            risk_category,
            age_hours,
            thresholds.escalation_offset(),
        )?,
        exchange_transfusion: exchange.value,
    };

    Ok(BilirubinResult {
        age_hours,
        total_bilirubin_mg_dl,
        risk_category: risk_category.to_string(),
        level: cut_points.rules().classify(total_bilirubin_mg_dl),
        thresholds: cut_points,
        position: photo.position,
        phototherapy_margin: total_bilirubin_mg_dl - photo.value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reference_data::ThresholdTable;
    use std::collections::BTreeMap;

    fn thresholds() -> BilirubinThresholds {
        let table = |points: Vec<(f64, f64)>| {
            let mut curves = BTreeMap::new();
            curves.insert("40_noRisk".to_string(), points);
            ThresholdTable::from_curves("mg/dL", curves).unwrap()
        };
        BilirubinThresholds::new(
            table(vec![(48.0, 14.0), (96.0, 16.0)]),
            table(vec![(48.0, 22.0), (96.0, 25.0)]),
            2.0,
            3.0,
        )
        .unwrap()
    }

    #[test]
    fn test_threshold_interpolated_at_72_hours() {
        let result = compute_bilirubin_risk(72.0, 10.0, "40_noRisk", &thresholds()).unwrap();
        assert!((result.thresholds.phototherapy - 15.0).abs() < 1e-12);
        assert!((result.thresholds.exchange_transfusion - 23.5).abs() < 1e-12);
        assert!((result.thresholds.escalation_of_care - 21.5).abs() < 1e-12);
        assert!((result.thresholds.confirm_with_tsb - 12.0).abs() < 1e-12);
        assert_eq!(result.position, InterpolationPosition::Interpolated);
        assert_eq!(result.level, BilirubinRiskLevel::Routine);
    }

    #[test]
    fn test_levels_in_severity_order() {
        let t = thresholds();
        let level = |tsb| compute_bilirubin_risk(72.0, tsb, "40_noRisk", &t).unwrap().level;
        assert_eq!(level(11.9), BilirubinRiskLevel::Routine);
        assert_eq!(level(12.0), BilirubinRiskLevel::ConfirmWithTsb);
        assert_eq!(level(15.0), BilirubinRiskLevel::Phototherapy);
        assert_eq!(level(21.5), BilirubinRiskLevel::EscalationOfCare);
        assert_eq!(level(24.0), BilirubinRiskLevel::ExchangeTransfusion);
    }

    #[test]
    fn test_age_domain() {
        let t = thresholds();
        for age in [11.9, 336.5] {
            assert!(matches!(
                compute_bilirubin_risk(age, 10.0, "40_noRisk", &t),
                Err(ClinicalError::OutOfDomain(_))
            ));
        }
        let clamped = compute_bilirubin_risk(12.0, 10.0, "40_noRisk", &t).unwrap();
        assert_eq!(clamped.position, InterpolationPosition::ClampedBelow);
    }

    #[test]
    fn test_unknown_category() {
        let err = compute_bilirubin_risk(72.0, 10.0, "36_withRisk", &thresholds()).unwrap_err();
        assert_eq!(err, ClinicalError::MissingCategory("36_withRisk".into()));
    }

    #[test]
    fn test_risk_category_from_gestation() {
        assert_eq!(risk_category_for(38.6, true).unwrap(), "38_withRisk");
        assert_eq!(risk_category_for(42.0, false).unwrap(), "40_noRisk");
        assert_eq!(risk_category_for(35.0, false).unwrap(), "35_noRisk");
        assert!(matches!(risk_category_for(34.9, false), Err(ClinicalError::OutOfDomain(_))));
    }
}
