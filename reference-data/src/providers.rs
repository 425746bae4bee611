//! Where reference documents come from.

use crate::error::{ReferenceError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A store of named reference documents.
///
/// `read` returns `Ok(None)` when the document simply is not present so the
/// loader can skip optional tables; malformed content is an error.
pub trait ReferenceSource {
    fn read(&self, name: &str) -> Result<Option<serde_json::Value>>;

    fn describe(&self) -> String;
}

/// Reads `<name>.json`, `<name>.yaml` or `<name>.yml` from a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ReferenceError::SourceNotFound(format!(
                "reference directory {} does not exist",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ReferenceSource for DirectorySource {
    fn read(&self, name: &str) -> Result<Option<serde_json::Value>> {
        for extension in ["json", "yaml", "yml"] {
            let path = self.root.join(format!("{name}.{extension}"));
            if !path.is_file() {
                continue;
            }
            debug!(path = %path.display(), "Reading reference document");
            let text = fs::read_to_string(&path)?;
            let value: serde_json::Value = if extension == "json" {
                serde_json::from_str(&text)?
            } else {
                serde_yaml::from_str(&text)?
            };
            return Ok(Some(value));
        }
        Ok(None)
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

const BUNDLED: [(&str, &str); 6] = [
    ("lms_height_for_age", include_str!("../data/lms_height_for_age.json")),
    ("lms_weight_for_age", include_str!("../data/lms_weight_for_age.json")),
    ("lms_bmi_for_age", include_str!("../data/lms_bmi_for_age.json")),
    ("bp_reference", include_str!("../data/bp_reference.json")),
    ("bilirubin_thresholds", include_str!("../data/bilirubin_thresholds.json")),
    ("medications", include_str!("../data/medications.json")),
];

/// Sample reference documents compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledSource;

impl BundledSource {
    pub fn names() -> impl Iterator<Item = &'static str> {
        BUNDLED.iter().map(|(name, _)| *name)
    }
}

impl ReferenceSource for BundledSource {
    fn read(&self, name: &str) -> Result<Option<serde_json::Value>> {
        BUNDLED
            .iter()
            .find(|(bundled, _)| *bundled == name)
            .map(|(_, text)| serde_json::from_str(text).map_err(ReferenceError::from))
            .transpose()
    }

    fn describe(&self) -> String {
        "bundled sample data".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_source_has_every_document() {
        for name in BundledSource::names() {
            assert!(BundledSource.read(name).unwrap().is_some(), "{name} missing");
        }
        assert!(BundledSource.read("lms_head_circumference_for_age").unwrap().is_none());
    }

    #[test]
    fn test_directory_source_reads_yaml() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("medications.yaml"), "medications: []\n").unwrap();

        let source = DirectorySource::new(dir.path()).unwrap();
        let value = source.read("medications").unwrap().unwrap();
        assert!(value["medications"].as_array().unwrap().is_empty());
        assert!(source.read("bp_reference").unwrap().is_none());
    }

    #[test]
    fn test_directory_source_reports_bad_json() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bp_reference.json"), "{ not json").unwrap();

        let err = DirectorySource::new(dir.path()).unwrap().read("bp_reference").unwrap_err();
        assert!(matches!(err, ReferenceError::JsonError(_)));
    }

    #[test]
    fn test_missing_directory_is_rejected() {
        let err = DirectorySource::new("/definitely/not/a/pedcalc/dir").unwrap_err();
        assert!(matches!(err, ReferenceError::SourceNotFound(_)));
    }
}
