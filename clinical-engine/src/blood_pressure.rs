//! Pediatric blood pressure classification.
//!
//! Children under 13 are classified against the percentile table row for their
//! sex, age and height bucket; from 13 the fixed adult-style cut points apply.
//! Low readings are graded at every age with an approximation of the 3rd, 5th
//! and 10th percentiles back-computed from the tabulated 50th, 90th and 95th.
//! That approximation is not a published reference and is not authoritative.

use crate::classification::{BpCategory, Bound, RuleSet};
use crate::growth::compute_anthropometric_percentile;
use crate::interpolation::{nearest_bucket, BucketMatch, BucketStatus};
use crate::measurement::PatientMeasurement;
use error_common::{ClinicalError, Result};
use reference_data::{BpPercentiles, BpReferenceTable, LmsTable, Sex, MAX_AGE_YEARS, MIN_AGE_YEARS};
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, warn};

/// Age from which the fixed cut points replace the percentile ones
pub const ADOLESCENT_AGE_YEARS: u8 = 13;

pub const SYSTOLIC_RANGE: (f64, f64) = (50.0, 250.0);
pub const DIASTOLIC_RANGE: (f64, f64) = (30.0, 150.0);

const Z_90: f64 = 1.281_551_565_5;
const Z_95: f64 = 1.644_853_627_0;
const Z_97: f64 = 1.880_793_608_2;

/// Stage 2 starts this far above the 95th percentile (mmHg)
const STAGE_2_MARGIN_MMHG: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BpComponent {
    Systolic,
    Diastolic,
}

/// Cut points a single reading was compared against (mmHg)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BpCutPoints {
    pub p3: f64,
    pub p5: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub elevated: Option<f64>,
    pub stage1: f64,
    pub stage2: f64,
}

impl BpCutPoints {
    fn new(component: BpComponent, age_years: u8, reference: BpPercentiles) -> Self {
        let sd = (reference.p95 - reference.p90) / (Z_95 - Z_90);
        let (elevated, stage1, stage2) = if age_years >= ADOLESCENT_AGE_YEARS {
            match component {
                BpComponent::Systolic => (Some(120.0), 130.0, 140.0),
                BpComponent::Diastolic => (None, 80.0, 90.0),
            }
        } else {
            (
                Some(reference.p90),
                reference.p95,
                reference.p95 + STAGE_2_MARGIN_MMHG,
            )
        };

        Self {
            p3: reference.p50 - Z_97 * sd,
            p5: reference.p50 - Z_95 * sd,
            p10: reference.p50 - Z_90 * sd,
            p50: reference.p50,
            p90: reference.p90,
            p95: reference.p95,
            elevated,
            stage1,
            stage2,
        }
    }

    pub fn rules(&self) -> RuleSet<BpCategory> {
        let mut rules = RuleSet::new(BpCategory::Normal)
            .rule(BpCategory::Stage2Hypertension, Bound::AtLeast(self.stage2))
            .rule(BpCategory::Stage1Hypertension, Bound::AtLeast(self.stage1));
        if let Some(elevated) = self.elevated {
            rules = rules.rule(BpCategory::Elevated, Bound::AtLeast(elevated));
        }
        rules
            .rule(BpCategory::Hypotension, Bound::Below(self.p5))
            .rule(BpCategory::LowNormal, Bound::Below(self.p10))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BpComponentResult {
    pub value: f64,
    pub category: BpCategory,
    pub cut_points: BpCutPoints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BpResult {
    pub sex: Sex,
    pub age_years: u8,
    pub height_percentile: f64,
    pub height_bucket: BucketMatch<u8>,
    pub fixed_cut_points: bool,
    pub systolic: BpComponentResult,
    pub diastolic: BpComponentResult,
    /// The more severe of the two component categories
    pub category: BpCategory,
}

impl BpResult {
    pub fn label(&self) -> String {
        self.category.to_string()
    }
}

fn check_range(field: &str, value: f64, (min, max): (f64, f64)) -> Result<()> {
    if value < min || value > max {
        return Err(ClinicalError::out_of_range(field, value, min, max));
    }
    Ok(())
}

fn completed_years(age_years: f64) -> Result<u8> {
    let (min, max) = (MIN_AGE_YEARS, MAX_AGE_YEARS);
    (min..=max)
        .rev()
        .find(|year| f64::from(*year) <= age_years)
        .filter(|_| age_years < f64::from(max) + 1.0)
        .ok_or_else(|| {
            ClinicalError::out_of_range("age_years", age_years, f64::from(min), f64::from(max))
        })
}

fn classify(component: BpComponent, value: f64, age_years: u8, reference: BpPercentiles) -> BpComponentResult {
    let cut_points = BpCutPoints::new(component, age_years, reference);
    BpComponentResult {
        value,
        category: cut_points.rules().classify(value),
        cut_points,
    }
}

/// Classifies a blood pressure reading.
///
/// Age is truncated to completed years before the domain check and the table
/// lookup, so any age from 17.0 up to but not including 18.0 is read as 17 and
/// accepted, while 18.0 and above is `OutOfDomain`. The reading's height
/// percentile is matched to the nearest tabulated bucket.
pub fn compute_blood_pressure_classification(
    systolic: f64,
    diastolic: f64,
    age_years: f64,
    height_percentile: f64,
    sex: Sex,
    table: &BpReferenceTable,
) -> Result<BpResult> {
    let _span = debug_span!("blood_pressure", %sex).entered();

    let age = completed_years(age_years)?;
    check_range("systolic", systolic, SYSTOLIC_RANGE)?;
    check_range("diastolic", diastolic, DIASTOLIC_RANGE)?;
    if diastolic >= systolic {
        return Err(ClinicalError::OutOfDomain(format!(
            "diastolic {diastolic} must be below systolic {systolic}"
        )));
    }
    check_range("height_percentile", height_percentile, (0.0, 100.0))?;

    let buckets = table.height_buckets(sex, age);
    let bucket = nearest_bucket(&buckets, height_percentile).ok_or_else(|| {
        ClinicalError::MissingReferenceData(format!("no blood pressure rows for {sex} age {age}"))
    })?;
    match bucket.status {
        BucketStatus::Exact => {}
        BucketStatus::Nearest => debug!(bucket = bucket.key, "Nearest height bucket used"),
        BucketStatus::BelowRange | BucketStatus::AboveRange => {
            warn!(bucket = bucket.key, status = ?bucket.status, "Height percentile outside tabulated buckets")
        }
    }
    let row = table.row(sex, age, bucket.key).ok_or_else(|| {
        ClinicalError::MissingReferenceData(format!(
            "no blood pressure row for {sex} age {age} height p{}",
            bucket.key
        ))
    })?;

    let systolic = classify(BpComponent::Systolic, systolic, age, row.systolic);
    let diastolic = classify(BpComponent::Diastolic, diastolic, age, row.diastolic);

    Ok(BpResult {
        sex,
        age_years: age,
        height_percentile,
        height_bucket: bucket,
        fixed_cut_points: age >= ADOLESCENT_AGE_YEARS,
        category: systolic.category.max(diastolic.category),
        systolic,
        diastolic,
    })
}

/// Height percentile of the patient against a height-for-age table.
pub fn height_percentile_from_lms(patient: &PatientMeasurement, height_table: &LmsTable) -> Result<f64> {
    compute_anthropometric_percentile(patient, height_table).map(|growth| growth.percentile)
}
