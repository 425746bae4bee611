//! Common error handling utilities for the PedCalc clinical engine
//!
//! Every calculator reports failures through a single taxonomy so callers
//! (form layer, CLI, API adapters) can map them uniformly.
//!
//! # Error Categories
//!
//! - **OutOfDomain**: inputs outside the range covered by the reference
//!   tables, or invalid combinations such as diastolic ≥ systolic
//! - **MissingInput**: a calculator needs a measurement that was not given
//! - **MissingReferenceData / MissingCategory**: a requested table key is absent
//! - **NoMatchingBracket**: bracket dosing found no matching bracket
//! - **InvalidReferenceData**: a table failed validation at load time
//!
//! None of these are ever silently defaulted or clamped.
//!
//! # Example
//!
//! ```rust
//! use error_common::{ClinicalError, Result};
//!
//! fn check_age_hours(age_hours: f64) -> Result<f64> {
//!     if !(12.0..=336.0).contains(&age_hours) {
//!         return Err(ClinicalError::out_of_range("age_hours", age_hours, 12.0, 336.0));
//!     }
//!     Ok(age_hours)
//! }
//!
//! let err = check_age_hours(6.0).unwrap_err();
//! assert_eq!(err.code(), error_common::codes::domain::OUT_OF_DOMAIN);
//! ```

pub mod codes;
pub mod reporting;
pub mod types;

pub use reporting::*;
pub use types::*;
