//! Engine settings: defaults, optional settings file, then `PEDCALC_*` environment.

use crate::error::{ReferenceError, Result};
use crate::providers::{BundledSource, DirectorySource, ReferenceSource};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_PREFIX: &str = "PEDCALC";
/// Settings file looked up in the working directory (`pedcalc.toml`, `.yaml`, `.json`)
pub const DEFAULT_SETTINGS_FILE: &str = "pedcalc";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ReferenceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ReferenceError::ParseError(format!(
                "Unknown log format: {s}. Valid options: pretty, json"
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Directory of reference documents; bundled sample data when unset
    #[serde(default)]
    pub reference_dir: Option<PathBuf>,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Use the normalized 1.73 m² body surface area unless told otherwise
    pub bsa_normalized_default: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            reference_dir: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            bsa_normalized_default: false,
        }
    }
}

impl EngineSettings {
    /// Layers defaults, the settings file and the environment.
    ///
    /// An explicit `path` must exist; the default `pedcalc.*` file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };

        let settings = Config::builder()
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", defaults.log_format.to_string())?
            .set_default("bsa_normalized_default", defaults.bsa_normalized_default)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Source the reference tables are loaded from.
    pub fn reference_source(&self) -> Result<Box<dyn ReferenceSource>> {
        match &self.reference_dir {
            Some(dir) => Ok(Box::new(DirectorySource::new(dir)?)),
            None => Ok(Box::new(BundledSource)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pedcalc.toml");
        fs::write(&path, "log_format = \"json\"\nbsa_normalized_default = true\n").unwrap();

        let settings = EngineSettings::load(Some(&path)).unwrap();
        assert_eq!(settings.log_format, LogFormat::Json);
        assert!(settings.bsa_normalized_default);
        assert_eq!(settings.log_level, "info");
        assert!(settings.reference_dir.is_none());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = EngineSettings::load(Some(Path::new("/no/such/pedcalc.toml"))).unwrap_err();
        assert!(matches!(err, ReferenceError::SettingsError(_)));
    }

    #[test]
    fn test_reference_source_defaults_to_bundled() {
        let source = EngineSettings::default().reference_source().unwrap();
        assert_eq!(source.describe(), "bundled sample data");
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
