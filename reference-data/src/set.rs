//! The full set of reference tables an engine runs against.

use crate::blood_pressure::BpReferenceTable;
use crate::error::{ReferenceError, Result};
use crate::lms::{GrowthMeasure, LmsTable, Sex};
use crate::medication::{MedicationFormulary, MedicationProfile};
use crate::providers::{BundledSource, ReferenceSource};
use crate::threshold::BilirubinThresholds;
use error_common::ClinicalError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub const BP_REFERENCE: &str = "bp_reference";
pub const BILIRUBIN_THRESHOLDS: &str = "bilirubin_thresholds";
pub const MEDICATIONS: &str = "medications";

/// Immutable reference tables, loaded once and shared read-only.
///
/// Every table is optional; calculators asking for one that was not loaded
/// get `ClinicalError::MissingReferenceData`.
#[derive(Debug, Clone)]
pub struct ReferenceSet {
    source: String,
    growth: BTreeMap<GrowthMeasure, LmsTable>,
    blood_pressure: Option<BpReferenceTable>,
    bilirubin: Option<BilirubinThresholds>,
    formulary: Option<MedicationFormulary>,
}

impl Default for ReferenceSet {
    fn default() -> Self {
        Self::empty()
    }
}

fn parse<T: DeserializeOwned>(name: &str, value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| ReferenceError::ParseError(format!("{name}: {e}")))
}

impl ReferenceSet {
    pub fn empty() -> Self {
        Self {
            source: "in-memory".to_string(),
            growth: BTreeMap::new(),
            blood_pressure: None,
            bilirubin: None,
            formulary: None,
        }
    }

    /// Loads and validates every document the source holds.
    ///
    /// Absent documents are skipped; a malformed one fails the whole load.
    pub fn load(source: &dyn ReferenceSource) -> Result<Self> {
        let mut set = Self::empty();
        set.source = source.describe();

        for measure in GrowthMeasure::ALL {
            let name = measure.source_name();
            if let Some(value) = source.read(name)? {
                let table: LmsTable = parse(name, value)?;
                if table.measure() != measure {
                    return Err(ReferenceError::ValidationError(format!(
                        "{name} declares measure {} instead of {measure}",
                        table.measure()
                    )));
                }
                set.growth.insert(measure, table);
            }
        }
        if let Some(value) = source.read(BP_REFERENCE)? {
            set.blood_pressure = Some(parse(BP_REFERENCE, value)?);
        }
        if let Some(value) = source.read(BILIRUBIN_THRESHOLDS)? {
            set.bilirubin = Some(parse(BILIRUBIN_THRESHOLDS, value)?);
        }
        if let Some(value) = source.read(MEDICATIONS)? {
            set.formulary = Some(parse(MEDICATIONS, value)?);
        }

        let summary = set.summary();
        if summary.is_empty() {
            warn!(source = %set.source, "No reference tables found");
        } else {
            info!(
                source = %set.source,
                growth_tables = summary.growth_tables.len(),
                bp_rows = summary.bp_rows.unwrap_or(0),
                bilirubin_categories = summary.bilirubin_categories.len(),
                medications = summary.medications.len(),
                "Reference data loaded"
            );
        }
        Ok(set)
    }

    pub fn bundled() -> Result<Self> {
        Self::load(&BundledSource)
    }

    pub fn with_lms(mut self, table: LmsTable) -> Self {
        self.growth.insert(table.measure(), table);
        self
    }

    pub fn with_blood_pressure(mut self, table: BpReferenceTable) -> Self {
        self.blood_pressure = Some(table);
        self
    }

    pub fn with_bilirubin(mut self, thresholds: BilirubinThresholds) -> Self {
        self.bilirubin = Some(thresholds);
        self
    }

    pub fn with_formulary(mut self, formulary: MedicationFormulary) -> Self {
        self.formulary = Some(formulary);
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn lms(&self, measure: GrowthMeasure) -> error_common::Result<&LmsTable> {
        self.growth.get(&measure).ok_or_else(|| {
            ClinicalError::MissingReferenceData(format!("no {measure} table loaded"))
        })
    }

    pub fn blood_pressure(&self) -> error_common::Result<&BpReferenceTable> {
        self.blood_pressure.as_ref().ok_or_else(|| {
            ClinicalError::MissingReferenceData("no blood pressure table loaded".to_string())
        })
    }

    pub fn bilirubin(&self) -> error_common::Result<&BilirubinThresholds> {
        self.bilirubin.as_ref().ok_or_else(|| {
            ClinicalError::MissingReferenceData("no bilirubin thresholds loaded".to_string())
        })
    }

    pub fn formulary(&self) -> error_common::Result<&MedicationFormulary> {
        self.formulary.as_ref().ok_or_else(|| {
            ClinicalError::MissingReferenceData("no medication formulary loaded".to_string())
        })
    }

    pub fn medication(&self, id: &str) -> error_common::Result<&MedicationProfile> {
        self.formulary()?.get(id).ok_or_else(|| {
            ClinicalError::MissingReferenceData(format!("unknown medication '{id}'"))
        })
    }

    pub fn summary(&self) -> ReferenceSummary {
        ReferenceSummary {
            source: self.source.clone(),
            growth_tables: self
                .growth
                .values()
                .map(|table| GrowthTableSummary {
                    measure: table.measure(),
                    rows: table.len(),
                    male_age_months: table.age_range(Sex::Male),
                    female_age_months: table.age_range(Sex::Female),
                })
                .collect(),
            bp_rows: self.blood_pressure.as_ref().map(|t| t.rows().len()),
            bilirubin_categories: self
                .bilirubin
                .as_ref()
                .map(|b| b.phototherapy().categories().map(str::to_string).collect())
                .unwrap_or_default(),
            medications: self
                .formulary
                .as_ref()
                .map(|f| f.iter().map(|m| m.id.clone()).collect())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthTableSummary {
    pub measure: GrowthMeasure,
    pub rows: usize,
    pub male_age_months: Option<(f64, f64)>,
    pub female_age_months: Option<(f64, f64)>,
}

/// What a loaded reference set contains
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSummary {
    pub source: String,
    pub growth_tables: Vec<GrowthTableSummary>,
    pub bp_rows: Option<usize>,
    pub bilirubin_categories: Vec<String>,
    pub medications: Vec<String>,
}

impl ReferenceSummary {
    pub fn is_empty(&self) -> bool {
        self.growth_tables.is_empty()
            && self.bp_rows.is_none()
            && self.bilirubin_categories.is_empty()
            && self.medications.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lms::ReferencePoint;

    struct FixedSource(Vec<(&'static str, serde_json::Value)>);

    impl ReferenceSource for FixedSource {
        fn read(&self, name: &str) -> Result<Option<serde_json::Value>> {
            Ok(self
                .0
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v.clone()))
        }

        fn describe(&self) -> String {
            "fixture".to_string()
        }
    }

    #[test]
    fn test_missing_tables_are_reported_on_access() {
        let set = ReferenceSet::load(&FixedSource(vec![])).unwrap();
        assert!(set.summary().is_empty());
        assert!(matches!(
            set.lms(GrowthMeasure::BmiForAge),
            Err(ClinicalError::MissingReferenceData(_))
        ));
        assert!(matches!(set.bilirubin(), Err(ClinicalError::MissingReferenceData(_))));
    }

    #[test]
    fn test_mismatched_measure_fails_load() {
        let source = FixedSource(vec![(
            "lms_bmi_for_age",
            serde_json::json!({
                "measure": "weightForAge",
                "points": [{ "sex": "male", "ageMonths": 24, "L": 1, "M": 12, "S": 0.1 }]
            }),
        )]);
        let err = ReferenceSet::load(&source).unwrap_err();
        assert!(err.to_string().contains("declares measure"));
    }

    #[test]
    fn test_malformed_table_names_document() {
        let source = FixedSource(vec![("medications", serde_json::json!({ "medications": 3 }))]);
        let err = ReferenceSet::load(&source).unwrap_err();
        assert!(err.to_string().starts_with("Reference data parsing failed: medications"));
    }

    #[test]
    fn test_builder_replaces_table_for_measure() {
        let table = LmsTable::new(
            GrowthMeasure::HeightForAge,
            vec![ReferencePoint::new(Sex::Female, 60.0, 1.0, 108.0, 0.04)],
        )
        .unwrap();
        let set = ReferenceSet::empty().with_lms(table);
        assert_eq!(set.lms(GrowthMeasure::HeightForAge).unwrap().len(), 1);
        assert_eq!(set.summary().growth_tables.len(), 1);
    }
}
