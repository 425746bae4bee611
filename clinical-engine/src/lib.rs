//! # Clinical Engine
//!
//! Pure pediatric calculators over typed reference tables:
//!
//! - **Growth**: LMS z-scores and percentiles for height, weight, BMI and head
//!   circumference for age
//! - **Blood pressure**: classification by age, sex and height percentile
//! - **Bilirubin**: neonatal treatment thresholds by age in hours and risk category
//! - **Dosing**: per-weight, per-BSA, flat and bracket doses with safety caps
//!
//! Every calculator takes its inputs and the table it needs, returns a result
//! record or a [`ClinicalError`](error_common::ClinicalError), and keeps no
//! state between calls.
//!
//! ## Example
//!
//! ```rust
//! use clinical_engine::{compute_dose, PatientMeasurement, Prescription, BodyWeight};
//! use reference_data::{DoseLimit, DosingType};
//!
//! let patient = PatientMeasurement::new().with_weight(BodyWeight::kg(20.0));
//! let prescription = Prescription::ad_hoc(DosingType::MgPerKgPerDay, 40.0, "bid")
//!     .with_max_daily_dose(DoseLimit::MgPerKg(30.0));
//!
//! let dose = compute_dose(&prescription, &patient, None)?;
//! assert!(dose.dose_was_capped);
//! assert!((dose.per_dose_mg - 300.0).abs() < 1e-9);
//! # Ok::<(), error_common::ClinicalError>(())
//! ```

pub mod bilirubin;
pub mod blood_pressure;
pub mod classification;
pub mod dosing;
pub mod engine;
pub mod growth;
pub mod interpolation;
pub mod measurement;
pub mod percentile;
pub mod result;
pub mod units;

pub use bilirubin::{compute_bilirubin_risk, risk_category_for, BilirubinCutPoints, BilirubinResult};
pub use blood_pressure::{
    compute_blood_pressure_classification, height_percentile_from_lms, BpComponent,
    BpComponentResult, BpCutPoints, BpResult,
};
pub use classification::*;
pub use dosing::{
    apply_caps, compute_dose, effective_bsa, mosteller, resolve_frequency, AppliedBracket,
    BracketBasis, BsaMode, CappedDose, DoseCap, DoseLimits, DoseResult, Frequency, Prescription,
};
pub use engine::{CalculationRequest, ClinicalEngine};
pub use growth::{bmi, compute_anthropometric_percentile, GrowthResult};
pub use interpolation::{
    interpolate, lerp, lookup, nearest_bucket, BucketMatch, BucketStatus, InterpolationPosition,
    ThresholdLookup,
};
pub use measurement::{PatientAge, PatientMeasurement};
pub use percentile::{
    interpolate_reference, normal_cdf, percentile_from_z, value_from_z, z_from_percentile, z_score,
    InterpolatedLms,
};
pub use result::CalculationResult;
pub use units::{BodyWeight, Length, LengthUnit, WeightUnit};
