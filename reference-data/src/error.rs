use error_common::ClinicalError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Reference source not found: {0}")]
    SourceNotFound(String),

    #[error("Reference data parsing failed: {0}")]
    ParseError(String),

    #[error("Reference data validation failed: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Settings error: {0}")]
    SettingsError(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, ReferenceError>;

impl From<ReferenceError> for ClinicalError {
    fn from(err: ReferenceError) -> Self {
        ClinicalError::InvalidReferenceData(err.to_string())
    }
}

pub(crate) fn invalid(message: impl Into<String>) -> ReferenceError {
    ReferenceError::ValidationError(message.into())
}
