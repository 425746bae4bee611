//! Typed, validated clinical reference tables for the PedCalc engine.
//!
//! Reference data is loaded once by the host and shared read-only with the
//! calculators:
//! - **LMS tables**: height, weight, BMI and head circumference for age
//! - **Blood pressure**: pediatric percentiles by sex, age and height percentile
//! - **Bilirubin**: phototherapy and exchange transfusion threshold curves
//! - **Medications**: dosing profiles with limits, frequencies and strengths
//!
//! Every table is validated when it is built, so a malformed document fails
//! the load rather than a later calculation.
//!
//! # Example
//!
//! ```rust
//! use reference_data::{GrowthMeasure, ReferenceSet};
//!
//! let set = ReferenceSet::bundled()?;
//! let bmi = set.lms(GrowthMeasure::BmiForAge)?;
//! assert!(!bmi.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod blood_pressure;
pub mod error;
pub mod lms;
pub mod medication;
pub mod providers;
pub mod set;
pub mod settings;
pub mod threshold;

pub use blood_pressure::*;
pub use error::{ReferenceError, Result};
pub use lms::*;
pub use medication::*;
pub use providers::*;
pub use set::*;
pub use settings::*;
pub use threshold::*;
