//! Body surface area.

use crate::measurement::PatientMeasurement;
use error_common::Result;
use serde::{Deserialize, Serialize};

/// Adult reference body surface area used for normalized dosing (m²)
pub const NORMALIZED_BSA_M2: f64 = 1.73;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BsaMode {
    /// Mosteller BSA from the patient's height and weight
    #[default]
    Measured,
    /// Fixed 1.73 m²
    Normalized,
}

/// Mosteller formula: `sqrt(height_cm × weight_kg / 3600)`.
pub fn mosteller(height_cm: f64, weight_kg: f64) -> f64 {
    (height_cm * weight_kg / 3600.0).sqrt()
}

/// BSA to dose against; measured mode needs height and weight.
pub fn effective_bsa(mode: BsaMode, patient: &PatientMeasurement) -> Result<f64> {
    match mode {
        BsaMode::Normalized => Ok(NORMALIZED_BSA_M2),
        BsaMode::Measured => {
            let height_cm = patient.require_height_cm()?;
            let weight_kg = patient.require_weight_kg()?;
            Ok(mosteller(height_cm, weight_kg))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{BodyWeight, Length};
    use error_common::ClinicalError;

    #[test]
    fn test_mosteller() {
        assert!((mosteller(120.0, 25.0) - 0.912870929).abs() < 1e-9);
        assert!((mosteller(180.0, 72.0) - 1.897366596).abs() < 1e-9);
    }

    #[test]
    fn test_measured_mode_needs_height() {
        let patient = PatientMeasurement::new().with_weight(BodyWeight::kg(25.0));
        let err = effective_bsa(BsaMode::Measured, &patient).unwrap_err();
        assert_eq!(err, ClinicalError::MissingInput("height is required".into()));
        assert_eq!(effective_bsa(BsaMode::Normalized, &patient).unwrap(), 1.73);
    }

    #[test]
    fn test_measured_mode_uses_imperial_inputs() {
        let patient = PatientMeasurement::new()
            .with_height(Length::inches(120.0 / 2.54))
            .with_weight(BodyWeight::kg(25.0));
        assert!((effective_bsa(BsaMode::Measured, &patient).unwrap() - 0.912870929).abs() < 1e-9);
    }
}
