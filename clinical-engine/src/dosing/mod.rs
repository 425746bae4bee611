//! Medication dose calculation.
//!
//! Every dosing model reduces to a daily amount and a per-dose amount in
//! milligrams. Safety caps run on those two figures, then the per-dose amount
//! is turned into a volume or tablet count when a strength is given.

pub mod bsa;
pub mod caps;
pub mod frequency;
pub mod prescription;

pub use bsa::{effective_bsa, mosteller, BsaMode, NORMALIZED_BSA_M2};
pub use caps::{apply_caps, CappedDose, DoseCap, DoseLimits};
pub use frequency::{resolve_frequency, Frequency};
pub use prescription::{AppliedBracket, BracketBasis, DoseResult, Prescription};

use crate::measurement::PatientMeasurement;
use error_common::{ClinicalError, Result};
use reference_data::{Concentration, DoseLimit, DosingType, MassUnit, MedicationProfile};
use tracing::{debug, debug_span};

fn missing_brackets(kind: &str) -> ClinicalError {
    ClinicalError::MissingReferenceData(format!(
        "{kind} bracket dosing needs a medication profile with {kind} brackets"
    ))
}

/// Milligrams per dose read from the profile's weight or age brackets.
fn bracket_dose(
    dosing_type: DosingType,
    unit: MassUnit,
    patient: &PatientMeasurement,
    profile: Option<&MedicationProfile>,
) -> Result<(f64, AppliedBracket)> {
    if dosing_type == DosingType::WeightBracket {
        let profile = profile
            .filter(|p| !p.weight_brackets.is_empty())
            .ok_or_else(|| missing_brackets("weight"))?;
        let weight_kg = patient.require_weight_kg()?;
        let bracket = profile
            .weight_bracket_for(weight_kg)
            .ok_or_else(|| ClinicalError::NoMatchingBracket {
                basis: "weight_kg".to_string(),
                value: weight_kg,
            })?;
        debug!(min = bracket.min_weight, max = bracket.max_weight, "Weight bracket selected");
        Ok((
            unit.to_mg(bracket.dose),
            AppliedBracket {
                basis: BracketBasis::WeightKg,
                min: bracket.min_weight,
                max: bracket.max_weight,
                dose: bracket.dose,
            },
        ))
    } else {
        let profile = profile
            .filter(|p| !p.age_brackets.is_empty())
            .ok_or_else(|| missing_brackets("age"))?;
        let age_months = patient.require_age()?.in_months();
        let bracket = profile
            .age_bracket_for(age_months)
            .ok_or_else(|| ClinicalError::NoMatchingBracket {
                basis: "age_months".to_string(),
                value: age_months,
            })?;
        debug!(min = bracket.min_age_months, max = bracket.max_age_months, "Age bracket selected");
        Ok((
            unit.to_mg(bracket.dose),
            AppliedBracket {
                basis: BracketBasis::AgeMonths,
                min: bracket.min_age_months,
                max: bracket.max_age_months,
                dose: bracket.dose,
            },
        ))
    }
}

fn resolve_limit(limit: Option<DoseLimit>, weight_kg: Option<f64>, name: &str) -> Option<f64> {
    let limit = limit?;
    let resolved = limit.resolve_mg(weight_kg);
    if resolved.is_none() {
        debug!(limit = name, "Weight-relative limit skipped without a weight");
    }
    resolved
}

/// Computes a dose from a prescription, the patient and an optional profile.
///
/// For continuous frequencies the per-dose figure is an hourly rate, and a
/// `max_dose` limit caps that hourly rate.
///
/// # Errors
///
/// - `MissingInput` when the model needs a weight, height, age or dose amount
///   that neither the prescription nor the profile supplies
/// - `OutOfDomain` for a concentration with a non-positive amount or volume
/// - `MissingReferenceData` for an unknown frequency or bracket dosing without
///   brackets
/// - `NoMatchingBracket` when no bracket holds the patient's weight or age
pub fn compute_dose(
    prescription: &Prescription,
    patient: &PatientMeasurement,
    profile: Option<&MedicationProfile>,
) -> Result<DoseResult> {
    let _span = debug_span!(
        "compute_dose",
        medication = profile.map(|p| p.id.as_str()).unwrap_or("ad-hoc")
    )
    .entered();

    let dosing_type = prescription
        .dosing_type
        .or(profile.map(|p| p.dosing_type))
        .ok_or_else(|| ClinicalError::MissingInput("dosing type is required".to_string()))?;
    let concentration: Option<Concentration> = prescription.concentration;
    if let Some(strength) = concentration {
        strength
            .validate()
            .map_err(|e| ClinicalError::OutOfDomain(format!("concentration {strength}: {e}")))?;
    }
    let frequency = resolve_frequency(&prescription.frequency, profile)?;
    let times_per_day = frequency.times_per_day;
    let unit = prescription
        .dose_unit
        .or(profile.map(|p| p.dose_unit))
        .unwrap_or_default();
    let weight_kg = patient.weight_kg();

    let mut bsa_m2 = None;
    let mut bracket = None;
    let (daily_mg, per_dose_mg) = if dosing_type.is_bracket() {
        let (per_dose, applied) = bracket_dose(dosing_type, unit, patient, profile)?;
        bracket = Some(applied);
        (per_dose * times_per_day, per_dose)
    } else {
        let amount = prescription
            .dose_amount
            .or(profile.and_then(|p| p.dose_default))
            .ok_or_else(|| ClinicalError::MissingInput("dose amount is required".to_string()))?;
        let dose_mg = unit.to_mg(amount);

        match dosing_type {
            DosingType::MgPerKgPerDay => {
                let daily = dose_mg * patient.require_weight_kg()?;
                (daily, daily / times_per_day)
            }
            DosingType::MgPerKgPerDose => {
                let per_dose = dose_mg * patient.require_weight_kg()?;
                (per_dose * times_per_day, per_dose)
            }
            DosingType::FlatPerDay => (dose_mg, dose_mg / times_per_day),
            DosingType::BsaPerM2 => {
                let mode = prescription.bsa_mode.unwrap_or_default();
                let bsa = effective_bsa(mode, patient)?;
                bsa_m2 = Some(bsa);
                let daily = dose_mg * bsa;
                (daily, daily / times_per_day)
            }
            DosingType::FlatPerDose | DosingType::WeightBracket | DosingType::AgeBracket => {
                (dose_mg * times_per_day, dose_mg)
            }
        }
    };

    let limits = DoseLimits {
        max_daily_mg: resolve_limit(
            prescription.max_daily_dose.or(profile.and_then(|p| p.max_daily_dose)),
            weight_kg,
            "max_daily_dose",
        ),
        max_per_dose_mg: resolve_limit(
            prescription.max_dose.or(profile.and_then(|p| p.max_dose)),
            weight_kg,
            "max_dose",
        ),
    };
    let capped = apply_caps(daily_mg, per_dose_mg, times_per_day, limits);

    let volume_per_dose_ml = concentration
        .and_then(|c| c.mg_per_ml())
        .map(|mg_per_ml| capped.per_dose_mg / mg_per_ml);
    let volume_per_day_ml = concentration
        .and_then(|c| c.mg_per_ml())
        .map(|mg_per_ml| capped.daily_mg / mg_per_ml);
    let tablets_per_dose = concentration
        .and_then(|c| c.mg_per_tablet())
        .map(|mg_per_tablet| (capped.per_dose_mg / mg_per_tablet).ceil());

    Ok(DoseResult {
        medication_id: prescription
            .medication_id
            .clone()
            .or(profile.map(|p| p.id.clone())),
        dosing_type,
        frequency: frequency.code,
        times_per_day,
        continuous: frequency.continuous,
        daily_dose_mg: capped.daily_mg,
        per_dose_mg: capped.per_dose_mg,
        uncapped_daily_dose_mg: daily_mg,
        uncapped_per_dose_mg: per_dose_mg,
        dose_was_capped: capped.was_capped(),
        caps_applied: capped.caps_applied,
        bsa_m2,
        bracket,
        concentration,
        volume_per_dose_ml,
        volume_per_day_ml,
        tablets_per_dose,
    })
}
