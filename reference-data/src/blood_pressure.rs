//! Pediatric blood-pressure percentile tables (sex × age × height percentile).

use crate::error::{invalid, ReferenceError, Result};
use crate::lms::Sex;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Height percentile buckets used by the published pediatric BP tables
pub const HEIGHT_PERCENTILE_BUCKETS: [u8; 7] = [5, 10, 25, 50, 75, 90, 95];

/// Youngest and oldest age (completed years) the pediatric tables cover
pub const MIN_AGE_YEARS: u8 = 1;
pub const MAX_AGE_YEARS: u8 = 17;

/// Blood pressure values at the 50th, 90th and 95th percentile (mmHg)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BpPercentiles {
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
}

impl BpPercentiles {
    fn is_ordered(&self) -> bool {
        [self.p50, self.p90, self.p95].iter().all(|v| v.is_finite() && *v > 0.0)
            && self.p50 <= self.p90
            && self.p90 <= self.p95
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BpReferenceRow {
    pub sex: Sex,
    pub age_years: u8,
    pub height_percentile: u8,
    pub systolic: BpPercentiles,
    pub diastolic: BpPercentiles,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBpTable {
    #[serde(default)]
    description: Option<String>,
    rows: Vec<BpReferenceRow>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawBpTable")]
pub struct BpReferenceTable {
    description: Option<String>,
    rows: Vec<BpReferenceRow>,
}

impl TryFrom<RawBpTable> for BpReferenceTable {
    type Error = ReferenceError;

    fn try_from(raw: RawBpTable) -> Result<Self> {
        let mut table = Self::new(raw.rows)?;
        table.description = raw.description;
        Ok(table)
    }
}

impl BpReferenceTable {
    pub fn new(mut rows: Vec<BpReferenceRow>) -> Result<Self> {
        if rows.is_empty() {
            return Err(invalid("blood pressure table has no rows"));
        }
        for row in &rows {
            if !(MIN_AGE_YEARS..=MAX_AGE_YEARS).contains(&row.age_years) {
                return Err(invalid(format!(
                    "blood pressure row age {} outside {MIN_AGE_YEARS}..={MAX_AGE_YEARS}",
                    row.age_years
                )));
            }
            if row.height_percentile == 0 || row.height_percentile >= 100 {
                return Err(invalid(format!(
                    "height percentile {} must be within 1..=99",
                    row.height_percentile
                )));
            }
            if !row.systolic.is_ordered() || !row.diastolic.is_ordered() {
                return Err(invalid(format!(
                    "{} age {} height p{}: percentiles must satisfy p50 <= p90 <= p95",
                    row.sex, row.age_years, row.height_percentile
                )));
            }
        }

        rows.sort_by_key(|r| (r.sex, r.age_years, r.height_percentile));
        if let Some((row, _)) = rows.iter().tuple_windows().find(|(a, b)| {
            (a.sex, a.age_years, a.height_percentile) == (b.sex, b.age_years, b.height_percentile)
        }) {
            return Err(invalid(format!(
                "duplicate blood pressure row for {} age {} height p{}",
                row.sex, row.age_years, row.height_percentile
            )));
        }

        Ok(Self {
            description: None,
            rows,
        })
    }

    /// Height percentile buckets tabulated for a sex and age, ascending.
    pub fn height_buckets(&self, sex: Sex, age_years: u8) -> Vec<u8> {
        self.rows
            .iter()
            .filter(|r| r.sex == sex && r.age_years == age_years)
            .map(|r| r.height_percentile)
            .collect()
    }

    pub fn row(&self, sex: Sex, age_years: u8, height_percentile: u8) -> Option<&BpReferenceRow> {
        self.rows.iter().find(|r| {
            r.sex == sex && r.age_years == age_years && r.height_percentile == height_percentile
        })
    }

    pub fn rows(&self) -> &[BpReferenceRow] {
        &self.rows
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
