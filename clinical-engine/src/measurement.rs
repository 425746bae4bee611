//! Transient patient inputs.

use crate::units::{BodyWeight, Length};
use error_common::{ClinicalError, Result};
use reference_data::Sex;
use serde::{Deserialize, Serialize};

/// Mean days per month over the Gregorian cycle
pub const DAYS_PER_MONTH: f64 = 30.4375;
const HOURS_PER_DAY: f64 = 24.0;

/// Postnatal age in the unit it was recorded in.
///
/// Serialized as `{"hours": 60}`, `{"months": 96}` or `{"years": 10}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatientAge {
    Hours(f64),
    Months(f64),
    Years(f64),
}

impl PatientAge {
    pub fn in_hours(self) -> f64 {
        match self {
            PatientAge::Hours(h) => h,
            PatientAge::Months(m) => m * DAYS_PER_MONTH * HOURS_PER_DAY,
            PatientAge::Years(y) => y * 12.0 * DAYS_PER_MONTH * HOURS_PER_DAY,
        }
    }

    pub fn in_months(self) -> f64 {
        match self {
            PatientAge::Hours(h) => h / (DAYS_PER_MONTH * HOURS_PER_DAY),
            PatientAge::Months(m) => m,
            PatientAge::Years(y) => y * 12.0,
        }
    }

    pub fn in_years(self) -> f64 {
        self.in_months() / 12.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientMeasurement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<PatientAge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Length>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<BodyWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_circumference: Option<Length>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systolic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diastolic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_bilirubin_mg_dl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gestational_age_weeks: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_risk_factors: Option<bool>,
}

fn missing(field: &str) -> ClinicalError {
    ClinicalError::MissingInput(format!("{field} is required"))
}

impl PatientMeasurement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = Some(sex);
        self
    }

    pub fn with_age(mut self, age: PatientAge) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_height(mut self, height: Length) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_weight(mut self, weight: BodyWeight) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_head_circumference(mut self, head: Length) -> Self {
        self.head_circumference = Some(head);
        self
    }

    pub fn with_blood_pressure(mut self, systolic: f64, diastolic: f64) -> Self {
        self.systolic = Some(systolic);
        self.diastolic = Some(diastolic);
        self
    }

    pub fn with_bilirubin(mut self, total_mg_dl: f64) -> Self {
        self.total_bilirubin_mg_dl = Some(total_mg_dl);
        self
    }

    pub fn with_gestation(mut self, weeks: f64, has_risk_factors: bool) -> Self {
        self.gestational_age_weeks = Some(weeks);
        self.has_risk_factors = Some(has_risk_factors);
        self
    }

    pub fn weight_kg(&self) -> Option<f64> {
        self.weight.map(BodyWeight::to_kg)
    }

    pub fn height_cm(&self) -> Option<f64> {
        self.height.map(Length::to_cm)
    }

    pub fn require_sex(&self) -> Result<Sex> {
        self.sex.ok_or_else(|| missing("sex"))
    }

    pub fn require_age(&self) -> Result<PatientAge> {
        self.age.ok_or_else(|| missing("age"))
    }

    pub fn require_weight_kg(&self) -> Result<f64> {
        self.weight_kg().ok_or_else(|| missing("weight"))
    }

    pub fn require_height_cm(&self) -> Result<f64> {
        self.height_cm().ok_or_else(|| missing("height"))
    }

    pub fn require_head_circumference_cm(&self) -> Result<f64> {
        self.head_circumference
            .map(Length::to_cm)
            .ok_or_else(|| missing("head circumference"))
    }

    /// Systolic and diastolic pressure, mmHg
    pub fn require_blood_pressure(&self) -> Result<(f64, f64)> {
        let systolic = self.systolic.ok_or_else(|| missing("systolic"))?;
        let diastolic = self.diastolic.ok_or_else(|| missing("diastolic"))?;
        Ok((systolic, diastolic))
    }

    pub fn require_total_bilirubin(&self) -> Result<f64> {
        self.total_bilirubin_mg_dl
            .ok_or_else(|| missing("total bilirubin"))
    }

    pub fn require_gestational_age_weeks(&self) -> Result<f64> {
        self.gestational_age_weeks
            .ok_or_else(|| missing("gestational age"))
    }
}
