use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codes;

/// Error taxonomy shared by every calculator in the engine.
///
/// Dose capping is not an error: a capped dose is a flagged result.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClinicalError {
    /// Input outside the range the reference tables cover, or an invalid
    /// combination of individually plausible inputs.
    #[error("Input out of clinical domain: {0}")]
    OutOfDomain(String),

    /// A required measurement or prescription field was not supplied
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// A requested key has no entry in the reference data
    #[error("Missing reference data: {0}")]
    MissingReferenceData(String),

    /// Primary key of a threshold table is absent
    #[error("Unknown threshold category: {0}")]
    MissingCategory(String),

    /// Bracket-based dosing found no bracket containing the patient value
    #[error("No dosing bracket matches {basis} = {value}")]
    NoMatchingBracket { basis: String, value: f64 },

    /// Reference table failed validation while being built
    #[error("Invalid reference data: {0}")]
    InvalidReferenceData(String),
}

impl ClinicalError {
    /// Builds an `OutOfDomain` error for a value outside an inclusive range.
    pub fn out_of_range(field: &str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfDomain(format!(
            "{field} = {value} is outside the supported range {min}..={max}"
        ))
    }

    /// Stable error code, suitable for API responses and log correlation.
    pub fn code(&self) -> &'static str {
        match self {
            Self::OutOfDomain(_) => codes::domain::OUT_OF_DOMAIN,
            Self::MissingInput(_) => codes::domain::MISSING_INPUT,
            Self::MissingReferenceData(_) => codes::reference::MISSING_REFERENCE_DATA,
            Self::MissingCategory(_) => codes::reference::MISSING_CATEGORY,
            Self::InvalidReferenceData(_) => codes::reference::INVALID_REFERENCE_DATA,
            Self::NoMatchingBracket { .. } => codes::dosing::NO_MATCHING_BRACKET,
        }
    }

    /// Short category name used as a structured logging field.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::OutOfDomain(_) => "out_of_domain",
            Self::MissingInput(_) => "missing_input",
            Self::MissingReferenceData(_) => "missing_reference_data",
            Self::MissingCategory(_) => "missing_category",
            Self::InvalidReferenceData(_) => "invalid_reference_data",
            Self::NoMatchingBracket { .. } => "no_matching_bracket",
        }
    }
}

/// Result type alias for clinical engine operations
pub type Result<T> = std::result::Result<T, ClinicalError>;
