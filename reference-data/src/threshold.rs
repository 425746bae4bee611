//! Sparse two-level threshold tables (category → curve of key → value).

use crate::error::{invalid, ReferenceError, Result};
use itertools::Itertools;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Bilirubin escalation-of-care curve sits this far below exchange transfusion
pub const DEFAULT_ESCALATION_OFFSET_MG_DL: f64 = 2.0;
/// Transcutaneous readings within this distance of phototherapy need a serum level
pub const DEFAULT_CONFIRM_OFFSET_MG_DL: f64 = 3.0;

/// Curve of `(secondary key, threshold)` pairs with strictly ascending keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdCurve {
    points: Vec<(f64, f64)>,
}

impl ThresholdCurve {
    pub fn new(mut points: Vec<(f64, f64)>) -> Result<Self> {
        if points.is_empty() {
            return Err(invalid("threshold curve has no points"));
        }
        if let Some((key, value)) = points
            .iter()
            .find(|(k, v)| !k.is_finite() || !v.is_finite() || *v < 0.0)
        {
            return Err(invalid(format!(
                "threshold point ({key}, {value}) must be finite and non-negative"
            )));
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        if let Some(((key, _), _)) = points.iter().tuple_windows().find(|(a, b)| a.0 == b.0) {
            return Err(invalid(format!("threshold curve repeats key {key}")));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn keys(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(k, _)| *k)
    }

    /// Smallest and largest secondary key.
    pub fn key_range(&self) -> Option<(f64, f64)> {
        Some((self.points.first()?.0, self.points.last()?.0))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawThresholdTable {
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_unit")]
    unit: String,
    curves: BTreeMap<String, BTreeMap<String, f64>>,
}

fn default_unit() -> String {
    "mg/dL".to_string()
}

/// Threshold table keyed by a discrete category, each category holding a
/// curve over a numeric secondary key.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawThresholdTable")]
pub struct ThresholdTable {
    description: Option<String>,
    unit: String,
    curves: BTreeMap<String, ThresholdCurve>,
}

impl TryFrom<RawThresholdTable> for ThresholdTable {
    type Error = ReferenceError;

    fn try_from(raw: RawThresholdTable) -> Result<Self> {
        let mut curves = BTreeMap::new();
        for (category, points) in raw.curves {
            let parsed = points
                .into_iter()
                .map(|(key, value)| {
                    key.trim()
                        .parse::<f64>()
                        .map(|k| (k, value))
                        .map_err(|_| {
                            invalid(format!("curve '{category}' has non-numeric key '{key}'"))
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            curves.insert(category, parsed);
        }
        let mut table = Self::from_curves(raw.unit, curves)?;
        table.description = raw.description;
        Ok(table)
    }
}

impl ThresholdTable {
    pub fn from_curves(
        unit: impl Into<String>,
        curves: BTreeMap<String, Vec<(f64, f64)>>,
    ) -> Result<Self> {
        if curves.is_empty() {
            return Err(invalid("threshold table has no categories"));
        }
        let curves = curves
            .into_iter()
            .map(|(category, points)| {
                ThresholdCurve::new(points)
                    .map(|curve| (category.clone(), curve))
                    .map_err(|e| invalid(format!("category '{category}': {e}")))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Self {
            description: None,
            unit: unit.into(),
            curves,
        })
    }

    pub fn curve(&self, category: &str) -> Option<&ThresholdCurve> {
        self.curves.get(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.curves.keys().map(String::as_str)
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBilirubinThresholds {
    #[serde(default)]
    description: Option<String>,
    phototherapy: ThresholdTable,
    exchange_transfusion: ThresholdTable,
    #[serde(default = "default_escalation_offset")]
    escalation_offset: f64,
    #[serde(default = "default_confirm_offset")]
    confirm_offset: f64,
}

fn default_escalation_offset() -> f64 {
    DEFAULT_ESCALATION_OFFSET_MG_DL
}

fn default_confirm_offset() -> f64 {
    DEFAULT_CONFIRM_OFFSET_MG_DL
}

/// Neonatal hyperbilirubinemia treatment thresholds.
///
/// Only the phototherapy and exchange transfusion curves are stored; the
/// escalation-of-care and confirm-with-serum curves are offsets below them and
/// are derived on demand.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawBilirubinThresholds")]
pub struct BilirubinThresholds {
    description: Option<String>,
    phototherapy: ThresholdTable,
    exchange_transfusion: ThresholdTable,
    escalation_offset: f64,
    confirm_offset: f64,
}

impl TryFrom<RawBilirubinThresholds> for BilirubinThresholds {
    type Error = ReferenceError;

    fn try_from(raw: RawBilirubinThresholds) -> Result<Self> {
        let mut thresholds = Self::new(
            raw.phototherapy,
            raw.exchange_transfusion,
            raw.escalation_offset,
            raw.confirm_offset,
        )?;
        thresholds.description = raw.description;
        Ok(thresholds)
    }
}

impl BilirubinThresholds {
    pub fn new(
        phototherapy: ThresholdTable,
        exchange_transfusion: ThresholdTable,
        escalation_offset: f64,
        confirm_offset: f64,
    ) -> Result<Self> {
        for (name, offset) in [("escalation", escalation_offset), ("confirm", confirm_offset)] {
            if !offset.is_finite() || offset < 0.0 {
                return Err(invalid(format!("{name} offset must be finite and non-negative")));
            }
        }
        let photo: Vec<&str> = phototherapy.categories().collect();
        let exchange: Vec<&str> = exchange_transfusion.categories().collect();
        if photo != exchange {
            return Err(invalid(
                "phototherapy and exchange transfusion tables must share the same categories",
            ));
        }
        Ok(Self {
            description: None,
            phototherapy,
            exchange_transfusion,
            escalation_offset,
            confirm_offset,
        })
    }

    pub fn phototherapy(&self) -> &ThresholdTable {
        &self.phototherapy
    }

    pub fn exchange_transfusion(&self) -> &ThresholdTable {
        &self.exchange_transfusion
    }

    pub fn escalation_offset(&self) -> f64 {
        self.escalation_offset
    }

    pub fn confirm_offset(&self) -> f64 {
        self.confirm_offset
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
