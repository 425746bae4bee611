//! Unit normalization for patient measurements.

use error_common::{ClinicalError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const KG_PER_LB: f64 = 0.453592;
pub const CM_PER_IN: f64 = 2.54;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Cm,
    #[serde(alias = "inch", alias = "inches")]
    In,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    #[serde(alias = "lbs")]
    Lb,
}

impl FromStr for LengthUnit {
    type Err = ClinicalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cm" => Ok(LengthUnit::Cm),
            "in" | "inch" | "inches" => Ok(LengthUnit::In),
            _ => Err(ClinicalError::OutOfDomain(format!(
                "unknown length unit '{s}' (expected cm or in)"
            ))),
        }
    }
}

impl FromStr for WeightUnit {
    type Err = ClinicalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "kg" => Ok(WeightUnit::Kg),
            "lb" | "lbs" => Ok(WeightUnit::Lb),
            _ => Err(ClinicalError::OutOfDomain(format!(
                "unknown weight unit '{s}' (expected kg or lb)"
            ))),
        }
    }
}

/// A length (height, head circumference) in the unit it was measured in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Length {
    pub value: f64,
    #[serde(default)]
    pub unit: LengthUnit,
}

impl Length {
    pub fn cm(value: f64) -> Self {
        Self { value, unit: LengthUnit::Cm }
    }

    pub fn inches(value: f64) -> Self {
        Self { value, unit: LengthUnit::In }
    }

    pub fn to_cm(self) -> f64 {
        match self.unit {
            LengthUnit::Cm => self.value,
            LengthUnit::In => self.value * CM_PER_IN,
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            LengthUnit::Cm => write!(f, "{} cm", self.value),
            LengthUnit::In => write!(f, "{} in", self.value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyWeight {
    pub value: f64,
    #[serde(default)]
    pub unit: WeightUnit,
}

impl BodyWeight {
    pub fn kg(value: f64) -> Self {
        Self { value, unit: WeightUnit::Kg }
    }

    pub fn lb(value: f64) -> Self {
        Self { value, unit: WeightUnit::Lb }
    }

    pub fn to_kg(self) -> f64 {
        match self.unit {
            WeightUnit::Kg => self.value,
            WeightUnit::Lb => self.value * KG_PER_LB,
        }
    }
}

impl fmt::Display for BodyWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            WeightUnit::Kg => write!(f, "{} kg", self.value),
            WeightUnit::Lb => write!(f, "{} lb", self.value),
        }
    }
}
