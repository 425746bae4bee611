//! Anthropometric percentile calculator.

use crate::classification::{PercentileBand, WeightStatus};
use crate::interpolation::InterpolationPosition;
use crate::measurement::PatientMeasurement;
use crate::percentile::{interpolate_reference, percentile_from_z, reference_curves};
use error_common::{ClinicalError, Result};
use reference_data::{GrowthMeasure, LmsTable, Sex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug_span;

/// Body mass index, kg/m².
pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthResult {
    pub measure: GrowthMeasure,
    pub sex: Sex,
    pub age_months: f64,
    /// Measured value in the table's unit (cm, kg or kg/m²)
    pub value: f64,
    pub unit: String,
    pub z_score: f64,
    pub percentile: f64,
    pub band: PercentileBand,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_status: Option<WeightStatus>,
    pub l: f64,
    pub m: f64,
    pub s: f64,
    pub reference_position: InterpolationPosition,
    pub reference_curves: BTreeMap<String, f64>,
}

impl GrowthResult {
    pub fn label(&self) -> String {
        match self.weight_status {
            Some(status) => status.to_string(),
            None => self.band.to_string(),
        }
    }
}

fn measured_value(measure: GrowthMeasure, patient: &PatientMeasurement) -> Result<f64> {
    match measure {
        GrowthMeasure::HeightForAge => patient.require_height_cm(),
        GrowthMeasure::WeightForAge => patient.require_weight_kg(),
        GrowthMeasure::BmiForAge => Ok(bmi(patient.require_weight_kg()?, patient.require_height_cm()?)),
        GrowthMeasure::HeadCircumferenceForAge => patient.require_head_circumference_cm(),
    }
}

/// Percentile and z-score of the patient's measurement against an LMS table.
///
/// The measure is the table's own. Ages outside the range the table covers
/// for the patient's sex are `OutOfDomain`.
pub fn compute_anthropometric_percentile(
    patient: &PatientMeasurement,
    table: &LmsTable,
) -> Result<GrowthResult> {
    let measure = table.measure();
    let _span = debug_span!("growth", measure = %measure).entered();

    let sex = patient.require_sex()?;
    let age_months = patient.require_age()?.in_months();
    let value = measured_value(measure, patient)?;

    let points = table.points_for(sex)?;
    let (min_age, max_age) = table.age_range(sex).ok_or_else(|| {
        ClinicalError::MissingReferenceData(format!("{measure} table has no rows for {sex}"))
    })?;
    if age_months < min_age || age_months > max_age {
        return Err(ClinicalError::out_of_range("age_months", age_months, min_age, max_age));
    }

    let lms = interpolate_reference(points, age_months)?;
    let z_score = lms.z_score(value);
    let percentile = percentile_from_z(z_score);

    Ok(GrowthResult {
        measure,
        sex,
        age_months,
        value,
        unit: measure.unit().to_string(),
        z_score,
        percentile,
        band: PercentileBand::from_percentile(percentile),
        weight_status: (measure == GrowthMeasure::BmiForAge)
            .then(|| WeightStatus::from_percentile(percentile)),
        l: lms.l,
        m: lms.m,
        s: lms.s,
        reference_position: lms.position,
        reference_curves: reference_curves(&lms),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::PatientAge;
    use crate::units::{BodyWeight, Length};
    use reference_data::ReferencePoint;

    fn height_table() -> LmsTable {
        LmsTable::new(
            GrowthMeasure::HeightForAge,
            vec![
                ReferencePoint::new(Sex::Male, 24.0, 1.0, 50.0, 0.1),
                ReferencePoint::new(Sex::Male, 36.0, 1.0, 60.0, 0.1),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_bmi() {
        assert!((bmi(26.0, 128.0) - 15.869140625).abs() < 1e-9);
    }

    #[test]
    fn test_height_percentile_at_tabulated_age() {
        let patient = PatientMeasurement::new()
            .with_sex(Sex::Male)
            .with_age(PatientAge::Years(2.0))
            .with_height(Length::cm(55.0));
        let result = compute_anthropometric_percentile(&patient, &height_table()).unwrap();
        assert!((result.z_score - 1.0).abs() < 1e-12);
        assert!((result.percentile - 84.13).abs() < 0.01);
        assert_eq!(result.band, PercentileBand::SeventyFifthToNinetieth);
        assert_eq!(result.reference_position, InterpolationPosition::Exact);
        assert!(result.weight_status.is_none());
    }

    #[test]
    fn test_age_outside_table_is_out_of_domain() {
        let patient = PatientMeasurement::new()
            .with_sex(Sex::Male)
            .with_age(PatientAge::Months(40.0))
            .with_height(Length::cm(95.0));
        let err = compute_anthropometric_percentile(&patient, &height_table()).unwrap_err();
        assert!(matches!(err, ClinicalError::OutOfDomain(_)));
    }

    #[test]
    fn test_missing_sex_and_measurement() {
        let patient = PatientMeasurement::new().with_age(PatientAge::Months(30.0));
        let err = compute_anthropometric_percentile(&patient, &height_table()).unwrap_err();
        assert_eq!(err, ClinicalError::MissingInput("sex is required".into()));

        let patient = patient.with_sex(Sex::Male).with_weight(BodyWeight::kg(14.0));
        let err = compute_anthropometric_percentile(&patient, &height_table()).unwrap_err();
        assert_eq!(err, ClinicalError::MissingInput("height is required".into()));
    }

    #[test]
    fn test_sex_without_rows() {
        let patient = PatientMeasurement::new()
            .with_sex(Sex::Female)
            .with_age(PatientAge::Months(30.0))
            .with_height(Length::cm(90.0));
        let err = compute_anthropometric_percentile(&patient, &height_table()).unwrap_err();
        assert!(matches!(err, ClinicalError::MissingReferenceData(_)));
    }

    #[test]
    fn test_bmi_reports_weight_status() {
        let table = LmsTable::new(
            GrowthMeasure::BmiForAge,
            vec![
                ReferencePoint::new(Sex::Female, 96.0, -2.15, 15.7, 0.1185),
                ReferencePoint::new(Sex::Female, 108.0, -2.05, 16.2, 0.125),
            ],
        )
        .unwrap();
        let patient = PatientMeasurement::new()
            .with_sex(Sex::Female)
            .with_age(PatientAge::Months(102.0))
            .with_height(Length::cm(130.0))
            .with_weight(BodyWeight::kg(36.0));
        let result = compute_anthropometric_percentile(&patient, &table).unwrap();
        assert_eq!(result.reference_position, InterpolationPosition::Interpolated);
        assert!(result.value > 21.0);
        assert_eq!(result.weight_status, Some(WeightStatus::Obesity));
        assert_eq!(result.label(), "obesity");
    }
}
