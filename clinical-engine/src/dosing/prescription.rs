use super::bsa::BsaMode;
use super::caps::DoseCap;
use reference_data::{Concentration, DoseLimit, DosingType, MassUnit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A dosing order. Fields left empty fall back to the medication profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosing_type: Option<DosingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose_unit: Option<MassUnit>,
    pub frequency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concentration: Option<Concentration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_dose: Option<DoseLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_daily_dose: Option<DoseLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bsa_mode: Option<BsaMode>,
}

impl Prescription {
    /// Order for a formulary medication at its default dose.
    pub fn for_medication(medication_id: impl Into<String>, frequency: impl Into<String>) -> Self {
        Self {
            medication_id: Some(medication_id.into()),
            frequency: frequency.into(),
            ..Self::default()
        }
    }

    /// Ad-hoc order with no formulary profile behind it.
    pub fn ad_hoc(dosing_type: DosingType, dose_amount: f64, frequency: impl Into<String>) -> Self {
        Self {
            dosing_type: Some(dosing_type),
            dose_amount: Some(dose_amount),
            frequency: frequency.into(),
            ..Self::default()
        }
    }

    pub fn with_dose(mut self, amount: f64, unit: MassUnit) -> Self {
        self.dose_amount = Some(amount);
        self.dose_unit = Some(unit);
        self
    }

    pub fn with_concentration(mut self, concentration: Concentration) -> Self {
        self.concentration = Some(concentration);
        self
    }

    pub fn with_max_dose(mut self, limit: DoseLimit) -> Self {
        self.max_dose = Some(limit);
        self
    }

    pub fn with_max_daily_dose(mut self, limit: DoseLimit) -> Self {
        self.max_daily_dose = Some(limit);
        self
    }

    pub fn with_bsa_mode(mut self, mode: BsaMode) -> Self {
        self.bsa_mode = Some(mode);
        self
    }
}

/// The bracket a step-function dose was read from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedBracket {
    pub basis: BracketBasis,
    pub min: f64,
    pub max: f64,
    pub dose: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BracketBasis {
    WeightKg,
    AgeMonths,
}

/// Computed dose. All masses are in milligrams.
///
/// For a continuous infusion `per_dose_mg` and `volume_per_dose_ml` are
/// hourly rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medication_id: Option<String>,
    pub dosing_type: DosingType,
    pub frequency: String,
    pub times_per_day: f64,
    pub continuous: bool,
    pub daily_dose_mg: f64,
    pub per_dose_mg: f64,
    pub uncapped_daily_dose_mg: f64,
    pub uncapped_per_dose_mg: f64,
    pub dose_was_capped: bool,
    pub caps_applied: BTreeSet<DoseCap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bsa_m2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bracket: Option<AppliedBracket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concentration: Option<Concentration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_per_dose_ml: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_per_day_ml: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tablets_per_dose: Option<f64>,
}

impl DoseResult {
    pub fn label(&self) -> String {
        let cadence = if self.continuous {
            "per hour".to_string()
        } else {
            format!("{} times daily", self.times_per_day)
        };
        let mut label = format!("{:.1} mg {cadence} ({:.1} mg/day)", self.per_dose_mg, self.daily_dose_mg);
        if self.dose_was_capped {
            label.push_str(", capped at maximum");
        }
        label
    }
}
