//! Calculator facade over a loaded reference set.

use crate::bilirubin::{compute_bilirubin_risk, risk_category_for, BilirubinResult};
use crate::blood_pressure::{compute_blood_pressure_classification, height_percentile_from_lms, BpResult};
use crate::dosing::{compute_dose, BsaMode, DoseResult, Prescription};
use crate::growth::{compute_anthropometric_percentile, GrowthResult};
use crate::measurement::PatientMeasurement;
use crate::result::CalculationResult;
use error_common::Result;
use reference_data::{GrowthMeasure, ReferenceSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A calculation to run, tagged by kind.
///
/// ```json
/// { "type": "bilirubin", "patient": { "age": { "hours": 60 }, "totalBilirubinMgDl": 14.2,
///   "gestationalAgeWeeks": 39, "hasRiskFactors": false } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CalculationRequest {
    Growth {
        measure: GrowthMeasure,
        patient: PatientMeasurement,
    },
    /// Without a height percentile, it is derived from the patient's height
    BloodPressure {
        patient: PatientMeasurement,
        #[serde(default, rename = "heightPercentile", skip_serializing_if = "Option::is_none")]
        height_percentile: Option<f64>,
    },
    /// Without a risk category, it is derived from gestational age and risk factors
    Bilirubin {
        patient: PatientMeasurement,
        #[serde(default, rename = "riskCategory", skip_serializing_if = "Option::is_none")]
        risk_category: Option<String>,
    },
    Dose {
        prescription: Prescription,
        #[serde(default)]
        patient: PatientMeasurement,
    },
}

impl CalculationRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            CalculationRequest::Growth { .. } => "growth",
            CalculationRequest::BloodPressure { .. } => "bloodPressure",
            CalculationRequest::Bilirubin { .. } => "bilirubin",
            CalculationRequest::Dose { .. } => "dose",
        }
    }
}

/// Runs calculators against one reference set.
///
/// The engine holds no state besides the tables; every call is independent.
#[derive(Debug, Clone)]
pub struct ClinicalEngine {
    references: ReferenceSet,
    default_bsa_mode: BsaMode,
}

impl ClinicalEngine {
    pub fn new(references: ReferenceSet) -> Self {
        Self {
            references,
            default_bsa_mode: BsaMode::Measured,
        }
    }

    /// Dose BSA-based orders against 1.73 m² unless the order says otherwise
    pub fn with_normalized_bsa_default(mut self, normalized: bool) -> Self {
        self.default_bsa_mode = if normalized {
            BsaMode::Normalized
        } else {
            BsaMode::Measured
        };
        self
    }

    pub fn references(&self) -> &ReferenceSet {
        &self.references
    }

    pub fn growth(&self, measure: GrowthMeasure, patient: &PatientMeasurement) -> Result<GrowthResult> {
        compute_anthropometric_percentile(patient, self.references.lms(measure)?)
    }

    pub fn blood_pressure(
        &self,
        patient: &PatientMeasurement,
        height_percentile: Option<f64>,
    ) -> Result<BpResult> {
        let (systolic, diastolic) = patient.require_blood_pressure()?;
        let sex = patient.require_sex()?;
        let age_years = patient.require_age()?.in_years();
        let height_percentile = match height_percentile {
            Some(percentile) => percentile,
            None => {
                let percentile = height_percentile_from_lms(
                    patient,
                    self.references.lms(GrowthMeasure::HeightForAge)?,
                )?;
                debug!("Height percentile derived from the height-for-age table");
                percentile
            }
        };
        compute_blood_pressure_classification(
            systolic,
            diastolic,
            age_years,
            height_percentile,
            sex,
            self.references.blood_pressure()?,
        )
    }

    pub fn bilirubin(
        &self,
        patient: &PatientMeasurement,
        risk_category: Option<&str>,
    ) -> Result<BilirubinResult> {
        let age_hours = patient.require_age()?.in_hours();
        let total_bilirubin = patient.require_total_bilirubin()?;
        let category = match risk_category {
            Some(category) => category.to_string(),
            None => risk_category_for(
                patient.require_gestational_age_weeks()?,
                patient.has_risk_factors.unwrap_or(false),
            )?,
        };
        compute_bilirubin_risk(age_hours, total_bilirubin, &category, self.references.bilirubin()?)
    }

    /// Doses a prescription, reading its medication profile from the formulary
    /// when it names one.
    pub fn dose(&self, prescription: &Prescription, patient: &PatientMeasurement) -> Result<DoseResult> {
        let profile = prescription
            .medication_id
            .as_deref()
            .map(|id| self.references.medication(id))
            .transpose()?;

        if prescription.bsa_mode.is_some() {
            return compute_dose(prescription, patient, profile);
        }
        let prescription = prescription.clone().with_bsa_mode(self.default_bsa_mode);
        compute_dose(&prescription, patient, profile)
    }

    pub fn calculate(&self, request: &CalculationRequest) -> Result<CalculationResult> {
        Ok(match request {
            CalculationRequest::Growth { measure, patient } => self.growth(*measure, patient)?.into(),
            CalculationRequest::BloodPressure {
                patient,
                height_percentile,
            } => self.blood_pressure(patient, *height_percentile)?.into(),
            CalculationRequest::Bilirubin {
                patient,
                risk_category,
            } => self.bilirubin(patient, risk_category.as_deref())?.into(),
            CalculationRequest::Dose {
                prescription,
                patient,
            } => self.dose(prescription, patient)?.into(),
        })
    }
}
