// Error reporting utilities
// Emits one structured event per surfaced error. Only the error category,
// code and message are recorded; callers must not attach patient values.

use crate::types::ClinicalError;

/// Log a clinical error with its stable code.
pub fn log_error(context: &str, error: &ClinicalError) {
    match error {
        ClinicalError::InvalidReferenceData(_) => tracing::error!(
            context = context,
            error_code = error.code(),
            error_type = error.error_type(),
            "{}",
            error
        ),
        _ => tracing::warn!(
            context = context,
            error_code = error.code(),
            error_type = error.error_type(),
            "{}",
            error
        ),
    }
}
