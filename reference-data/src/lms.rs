//! LMS anthropometric reference tables.

use crate::error::{invalid, ReferenceError, Result};
use error_common::ClinicalError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Biological sex used to select a reference population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl FromStr for Sex {
    type Err = ReferenceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "boy" => Ok(Sex::Male),
            "female" | "f" | "girl" => Ok(Sex::Female),
            _ => Err(ReferenceError::ParseError(format!(
                "Unknown sex: {s}. Valid options: male, female"
            ))),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}

/// Anthropometric quantity an LMS table describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GrowthMeasure {
    HeightForAge,
    WeightForAge,
    BmiForAge,
    HeadCircumferenceForAge,
}

impl GrowthMeasure {
    pub const ALL: [GrowthMeasure; 4] = [
        GrowthMeasure::HeightForAge,
        GrowthMeasure::WeightForAge,
        GrowthMeasure::BmiForAge,
        GrowthMeasure::HeadCircumferenceForAge,
    ];

    /// Name of the reference document holding this table
    pub fn source_name(self) -> &'static str {
        match self {
            GrowthMeasure::HeightForAge => "lms_height_for_age",
            GrowthMeasure::WeightForAge => "lms_weight_for_age",
            GrowthMeasure::BmiForAge => "lms_bmi_for_age",
            GrowthMeasure::HeadCircumferenceForAge => "lms_head_circumference_for_age",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            GrowthMeasure::HeightForAge | GrowthMeasure::HeadCircumferenceForAge => "cm",
            GrowthMeasure::WeightForAge => "kg",
            GrowthMeasure::BmiForAge => "kg/m²",
        }
    }
}

impl FromStr for GrowthMeasure {
    type Err = ReferenceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "height" | "stature" | "length" | "height-for-age" | "heightforage" => {
                Ok(GrowthMeasure::HeightForAge)
            }
            "weight" | "weight-for-age" | "weightforage" => Ok(GrowthMeasure::WeightForAge),
            "bmi" | "bmi-for-age" | "bmiforage" => Ok(GrowthMeasure::BmiForAge),
            "head" | "hc" | "head-circumference" | "head-circumference-for-age"
            | "headcircumferenceforage" => Ok(GrowthMeasure::HeadCircumferenceForAge),
            _ => Err(ReferenceError::ParseError(format!(
                "Unknown growth measure: {s}. Valid options: height, weight, bmi, head"
            ))),
        }
    }
}

impl fmt::Display for GrowthMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GrowthMeasure::HeightForAge => "height-for-age",
            GrowthMeasure::WeightForAge => "weight-for-age",
            GrowthMeasure::BmiForAge => "BMI-for-age",
            GrowthMeasure::HeadCircumferenceForAge => "head-circumference-for-age",
        };
        write!(f, "{name}")
    }
}

/// One row of an LMS table: Box-Cox power (L), median (M) and coefficient
/// of variation (S) at a given age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferencePoint {
    pub sex: Sex,
    pub age_months: f64,
    #[serde(rename = "L", alias = "l")]
    pub l: f64,
    #[serde(rename = "M", alias = "m")]
    pub m: f64,
    #[serde(rename = "S", alias = "s")]
    pub s: f64,
    /// Optional tabulated percentile values keyed by label ("P5", "P50", ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub percentiles: BTreeMap<String, f64>,
}

impl ReferencePoint {
    pub fn new(sex: Sex, age_months: f64, l: f64, m: f64, s: f64) -> Self {
        Self {
            sex,
            age_months,
            l,
            m,
            s,
            percentiles: BTreeMap::new(),
        }
    }

    fn validate(&self) -> Result<()> {
        let values = [self.age_months, self.l, self.m, self.s];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(invalid(format!(
                "non-finite LMS row for {} at {} months",
                self.sex, self.age_months
            )));
        }
        if self.age_months < 0.0 {
            return Err(invalid(format!("negative age {} months", self.age_months)));
        }
        if self.m <= 0.0 || self.s <= 0.0 {
            return Err(invalid(format!(
                "M and S must be positive ({} at {} months: M={}, S={})",
                self.sex, self.age_months, self.m, self.s
            )));
        }
        if let Some((label, _)) = self.percentiles.iter().find(|(_, v)| !v.is_finite() || **v <= 0.0) {
            return Err(invalid(format!(
                "percentile {label} must be positive ({} at {} months)",
                self.sex, self.age_months
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLmsTable {
    #[serde(default)]
    description: Option<String>,
    measure: GrowthMeasure,
    points: Vec<ReferencePoint>,
}

/// Validated LMS table, rows sorted by age within each sex.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawLmsTable")]
pub struct LmsTable {
    measure: GrowthMeasure,
    description: Option<String>,
    male: Vec<ReferencePoint>,
    female: Vec<ReferencePoint>,
}

impl TryFrom<RawLmsTable> for LmsTable {
    type Error = ReferenceError;

    fn try_from(raw: RawLmsTable) -> Result<Self> {
        let mut table = Self::new(raw.measure, raw.points)?;
        table.description = raw.description;
        Ok(table)
    }
}

impl LmsTable {
    /// Builds a table, rejecting malformed rows and duplicate ages.
    pub fn new(measure: GrowthMeasure, points: Vec<ReferencePoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(invalid(format!("{measure} table has no rows")));
        }
        for point in &points {
            point.validate()?;
        }

        let (mut male, mut female): (Vec<_>, Vec<_>) =
            points.into_iter().partition(|p| p.sex == Sex::Male);
        for rows in [&mut male, &mut female] {
            rows.sort_by(|a, b| a.age_months.total_cmp(&b.age_months));
            if let Some((a, _)) = rows
                .iter()
                .tuple_windows()
                .find(|(a, b)| a.age_months == b.age_months)
            {
                return Err(invalid(format!(
                    "{measure} table has duplicate rows for {} at {} months",
                    a.sex, a.age_months
                )));
            }
        }

        Ok(Self {
            measure,
            description: None,
            male,
            female,
        })
    }

    pub fn measure(&self) -> GrowthMeasure {
        self.measure
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Rows for one sex, sorted ascending by age.
    pub fn points_for(&self, sex: Sex) -> error_common::Result<&[ReferencePoint]> {
        let rows = match sex {
            Sex::Male => &self.male,
            Sex::Female => &self.female,
        };
        if rows.is_empty() {
            return Err(ClinicalError::MissingReferenceData(format!(
                "{} table has no rows for {sex}",
                self.measure
            )));
        }
        Ok(rows)
    }

    /// Inclusive age range (months) covered for one sex.
    pub fn age_range(&self, sex: Sex) -> Option<(f64, f64)> {
        let rows = self.points_for(sex).ok()?;
        Some((rows.first()?.age_months, rows.last()?.age_months))
    }

    pub fn len(&self) -> usize {
        self.male.len() + self.female.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sex: Sex, age: f64, m: f64) -> ReferencePoint {
        ReferencePoint::new(sex, age, 1.0, m, 0.05)
    }

    #[test]
    fn test_rows_are_sorted_per_sex() {
        let table = LmsTable::new(
            GrowthMeasure::HeightForAge,
            vec![
                row(Sex::Male, 36.0, 95.0),
                row(Sex::Female, 24.0, 85.0),
                row(Sex::Male, 24.0, 86.0),
            ],
        )
        .unwrap();

        let ages: Vec<f64> = table
            .points_for(Sex::Male)
            .unwrap()
            .iter()
            .map(|p| p.age_months)
            .collect();
        assert_eq!(ages, vec![24.0, 36.0]);
        assert_eq!(table.age_range(Sex::Female), Some((24.0, 24.0)));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_rejects_duplicate_age() {
        let err = LmsTable::new(
            GrowthMeasure::WeightForAge,
            vec![row(Sex::Male, 24.0, 12.0), row(Sex::Male, 24.0, 12.5)],
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_rejects_non_positive_median() {
        let err = LmsTable::new(GrowthMeasure::BmiForAge, vec![row(Sex::Female, 24.0, 0.0)])
            .unwrap_err();
        assert!(matches!(err, ReferenceError::ValidationError(_)));
    }

    #[test]
    fn test_missing_sex_is_reported() {
        let table =
            LmsTable::new(GrowthMeasure::HeightForAge, vec![row(Sex::Male, 24.0, 86.0)]).unwrap();
        let err = table.points_for(Sex::Female).unwrap_err();
        assert!(matches!(err, ClinicalError::MissingReferenceData(_)));
    }

    #[test]
    fn test_deserializes_uppercase_lms_keys() {
        let json = serde_json::json!({
            "measure": "heightForAge",
            "points": [
                { "sex": "male", "ageMonths": 24.0, "L": 0.94, "M": 86.45, "S": 0.0403,
                  "percentiles": { "P50": 86.45 } }
            ]
        });
        let table: LmsTable = serde_json::from_value(json).unwrap();
        let point = &table.points_for(Sex::Male).unwrap()[0];
        assert_eq!(point.m, 86.45);
        assert_eq!(point.percentiles.get("P50"), Some(&86.45));
    }

    #[test]
    fn test_parse_measure_aliases() {
        assert_eq!("bmi".parse::<GrowthMeasure>().unwrap(), GrowthMeasure::BmiForAge);
        assert_eq!("stature".parse::<GrowthMeasure>().unwrap(), GrowthMeasure::HeightForAge);
        assert!("shoe-size".parse::<GrowthMeasure>().is_err());
    }
}
