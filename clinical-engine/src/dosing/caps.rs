//! Maximum-dose safety caps.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Relative slack before a dose counts as over a limit
const CAP_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DoseCap {
    MaxDailyDose,
    MaxDose,
}

/// Limits resolved to milligrams for one patient
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseLimits {
    pub max_daily_mg: Option<f64>,
    pub max_per_dose_mg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CappedDose {
    pub daily_mg: f64,
    pub per_dose_mg: f64,
    pub caps_applied: BTreeSet<DoseCap>,
}

impl CappedDose {
    pub fn was_capped(&self) -> bool {
        !self.caps_applied.is_empty()
    }
}

fn exceeds(value: f64, limit: f64) -> bool {
    value > limit * (1.0 + CAP_TOLERANCE)
}

/// Applies the daily cap, then the per-dose cap.
///
/// Each cap recomputes the other figure so `per_dose × times_per_day` stays
/// equal to the daily amount. Running the caps again on their own output
/// changes nothing.
pub fn apply_caps(daily_mg: f64, per_dose_mg: f64, times_per_day: f64, limits: DoseLimits) -> CappedDose {
    let mut capped = CappedDose {
        daily_mg,
        per_dose_mg,
        caps_applied: BTreeSet::new(),
    };

    if let Some(max_daily) = limits.max_daily_mg {
        if exceeds(capped.daily_mg, max_daily) {
            debug!(limit = "max_daily_dose", "Daily dose capped");
            capped.daily_mg = max_daily;
            capped.per_dose_mg = max_daily / times_per_day;
            capped.caps_applied.insert(DoseCap::MaxDailyDose);
        }
    }

    if let Some(max_dose) = limits.max_per_dose_mg {
        if exceeds(capped.per_dose_mg, max_dose) {
            debug!(limit = "max_dose", "Per-dose amount capped");
            capped.per_dose_mg = max_dose;
            capped.daily_mg = max_dose * times_per_day;
            capped.caps_applied.insert(DoseCap::MaxDose);
        }
    }

    capped
}
