//! Administration frequency codes.

use error_common::{ClinicalError, Result};
use reference_data::MedicationProfile;
use serde::{Deserialize, Serialize};

/// Doses per day of a continuous infusion expressed as an hourly rate
pub const HOURS_PER_DAY: f64 = 24.0;
pub const CONTINUOUS: &str = "continuous";

const STANDARD_FREQUENCIES: [(&str, f64); 13] = [
    ("qd", 1.0),
    ("daily", 1.0),
    ("bid", 2.0),
    ("tid", 3.0),
    ("qid", 4.0),
    ("q4h", 6.0),
    ("q6h", 4.0),
    ("q8h", 3.0),
    ("q12h", 2.0),
    ("q24h", 1.0),
    ("qod", 0.5),
    ("weekly", 1.0 / 7.0),
    ("once", 1.0),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frequency {
    pub code: String,
    pub times_per_day: f64,
    pub continuous: bool,
}

impl Frequency {
    fn continuous(code: &str) -> Self {
        Self {
            code: code.to_string(),
            times_per_day: HOURS_PER_DAY,
            continuous: true,
        }
    }
}

/// Resolves a frequency code, preferring the medication profile's own list.
///
/// A continuous infusion always divides the daily amount into 24 hourly
/// portions, whatever the profile lists for it.
pub fn resolve_frequency(code: &str, profile: Option<&MedicationProfile>) -> Result<Frequency> {
    let normalized = code.trim().to_lowercase();

    if let Some(option) = profile.and_then(|p| p.frequency(&normalized)) {
        if option.continuous || normalized == CONTINUOUS {
            return Ok(Frequency::continuous(&normalized));
        }
        return Ok(Frequency {
            code: normalized,
            times_per_day: option.times_per_day,
            continuous: false,
        });
    }

    if normalized == CONTINUOUS {
        return Ok(Frequency::continuous(&normalized));
    }

    STANDARD_FREQUENCIES
        .iter()
        .find(|(standard, _)| *standard == normalized)
        .map(|(_, times_per_day)| Frequency {
            code: normalized.clone(),
            times_per_day: *times_per_day,
            continuous: false,
        })
        .ok_or_else(|| ClinicalError::MissingReferenceData(format!("unknown frequency '{code}'")))
}
