//! Medication dosing profiles.

use crate::error::{invalid, ReferenceError, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prescription model a dose amount is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DosingType {
    #[serde(alias = "mg/kg/day")]
    MgPerKgPerDay,
    #[serde(alias = "mg/kg/dose")]
    MgPerKgPerDose,
    #[serde(alias = "flat/day")]
    FlatPerDay,
    #[serde(alias = "flat/dose", alias = "flat")]
    FlatPerDose,
    #[serde(alias = "mg/m2", alias = "bsa")]
    BsaPerM2,
    #[serde(alias = "weightBrackets", alias = "weight_brackets")]
    WeightBracket,
    #[serde(alias = "ageBrackets", alias = "age_brackets")]
    AgeBracket,
}

impl DosingType {
    /// Weight must be known to turn the dose amount into milligrams.
    pub fn requires_weight(self) -> bool {
        matches!(
            self,
            DosingType::MgPerKgPerDay | DosingType::MgPerKgPerDose | DosingType::WeightBracket
        )
    }

    pub fn is_bracket(self) -> bool {
        matches!(self, DosingType::WeightBracket | DosingType::AgeBracket)
    }
}

impl FromStr for DosingType {
    type Err = ReferenceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], "");
        match normalized.as_str() {
            "mgperkgperday" | "mg/kg/day" => Ok(DosingType::MgPerKgPerDay),
            "mgperkgperdose" | "mg/kg/dose" | "mg/kg" => Ok(DosingType::MgPerKgPerDose),
            "flatperday" | "flat/day" => Ok(DosingType::FlatPerDay),
            "flatperdose" | "flat/dose" | "flat" => Ok(DosingType::FlatPerDose),
            "bsaperm2" | "mg/m2" | "bsa" => Ok(DosingType::BsaPerM2),
            "weightbracket" | "weightbrackets" => Ok(DosingType::WeightBracket),
            "agebracket" | "agebrackets" => Ok(DosingType::AgeBracket),
            _ => Err(ReferenceError::ParseError(format!(
                "Unknown dosing type: {s}. Valid options: mg/kg/day, mg/kg/dose, flat/day, \
                 flat/dose, mg/m2, weight-bracket, age-bracket"
            ))),
        }
    }
}

impl fmt::Display for DosingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DosingType::MgPerKgPerDay => "mg/kg/day",
            DosingType::MgPerKgPerDose => "mg/kg/dose",
            DosingType::FlatPerDay => "flat/day",
            DosingType::FlatPerDose => "flat/dose",
            DosingType::BsaPerM2 => "mg/m²",
            DosingType::WeightBracket => "weight bracket",
            DosingType::AgeBracket => "age bracket",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MassUnit {
    #[serde(alias = "µg", alias = "ug")]
    Mcg,
    #[default]
    Mg,
    G,
}

impl MassUnit {
    pub fn to_mg(self, amount: f64) -> f64 {
        match self {
            MassUnit::Mcg => amount / 1000.0,
            MassUnit::Mg => amount,
            MassUnit::G => amount * 1000.0,
        }
    }
}

impl FromStr for MassUnit {
    type Err = ReferenceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mcg" | "ug" | "µg" | "microgram" | "micrograms" => Ok(MassUnit::Mcg),
            "mg" | "milligram" | "milligrams" => Ok(MassUnit::Mg),
            "g" | "gram" | "grams" => Ok(MassUnit::G),
            _ => Err(ReferenceError::ParseError(format!(
                "Unknown mass unit: {s}. Valid options: mcg, mg, g"
            ))),
        }
    }
}

impl fmt::Display for MassUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MassUnit::Mcg => write!(f, "mcg"),
            MassUnit::Mg => write!(f, "mg"),
            MassUnit::G => write!(f, "g"),
        }
    }
}

/// What one `amount` of drug is dispensed in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConcentrationBasis {
    #[serde(rename = "mL", alias = "ml")]
    Milliliters(f64),
    #[serde(rename = "tablet", alias = "tab")]
    Tablet,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concentration {
    pub amount: f64,
    #[serde(default)]
    pub amount_unit: MassUnit,
    pub per: ConcentrationBasis,
}

impl Concentration {
    pub fn per_ml(amount: f64, amount_unit: MassUnit, ml: f64) -> Self {
        Self {
            amount,
            amount_unit,
            per: ConcentrationBasis::Milliliters(ml),
        }
    }

    pub fn per_tablet(amount: f64, amount_unit: MassUnit) -> Self {
        Self {
            amount,
            amount_unit,
            per: ConcentrationBasis::Tablet,
        }
    }

    pub fn amount_mg(&self) -> f64 {
        self.amount_unit.to_mg(self.amount)
    }

    /// Liquid strength in mg/mL; `None` for tablets.
    pub fn mg_per_ml(&self) -> Option<f64> {
        match self.per {
            ConcentrationBasis::Milliliters(ml) => Some(self.amount_mg() / ml),
            ConcentrationBasis::Tablet => None,
        }
    }

    pub fn mg_per_tablet(&self) -> Option<f64> {
        match self.per {
            ConcentrationBasis::Tablet => Some(self.amount_mg()),
            ConcentrationBasis::Milliliters(_) => None,
        }
    }

    /// Rejects non-positive or non-finite amounts and volumes.
    ///
    /// # Errors
    ///
    /// `ValidationError` naming the offending figure.
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(invalid(format!("concentration amount {} must be positive", self.amount)));
        }
        if let ConcentrationBasis::Milliliters(ml) = self.per {
            if !ml.is_finite() || ml <= 0.0 {
                return Err(invalid(format!("concentration volume {ml} mL must be positive")));
            }
        }
        Ok(())
    }
}

/// Splits a leading decimal number from the unit text that follows it.
fn split_quantity(text: &str) -> (Option<f64>, &str) {
    let text = text.trim();
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(end);
    (number.parse().ok(), unit.trim())
}

impl FromStr for Concentration {
    type Err = ReferenceError;

    /// Parses strengths such as `125mg/5mL`, `250 mg/tab` or `100mcg/mL`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parse_error = || {
            ReferenceError::ParseError(format!(
                "Invalid concentration: {s}. Expected forms like 125mg/5mL or 250mg/tab"
            ))
        };
        let (mass, basis) = s.split_once('/').ok_or_else(parse_error)?;

        let (amount, unit) = split_quantity(mass);
        let amount = amount.ok_or_else(parse_error)?;
        let amount_unit: MassUnit = unit.parse()?;

        let (count, basis_unit) = split_quantity(basis);
        let per = match basis_unit.to_lowercase().as_str() {
            "ml" => ConcentrationBasis::Milliliters(count.unwrap_or(1.0)),
            "tab" | "tabs" | "tablet" | "tablets" if count.map_or(true, |c| c == 1.0) => {
                ConcentrationBasis::Tablet
            }
            _ => return Err(parse_error()),
        };

        let concentration = Self {
            amount,
            amount_unit,
            per,
        };
        concentration
            .validate()
            .map_err(|e| ReferenceError::ParseError(e.to_string()))?;
        Ok(concentration)
    }
}

impl fmt::Display for Concentration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.per {
            ConcentrationBasis::Milliliters(ml) => {
                write!(f, "{}{}/{}mL", self.amount, self.amount_unit, ml)
            }
            ConcentrationBasis::Tablet => write!(f, "{}{}/tablet", self.amount, self.amount_unit),
        }
    }
}

/// Administration frequency offered by a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyOption {
    pub value: String,
    pub times_per_day: f64,
    #[serde(default)]
    pub continuous: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightBracket {
    pub min_weight: f64,
    pub max_weight: f64,
    pub dose: f64,
}

impl WeightBracket {
    pub fn contains(&self, weight_kg: f64) -> bool {
        self.min_weight <= weight_kg && weight_kg <= self.max_weight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeBracket {
    pub min_age_months: f64,
    pub max_age_months: f64,
    pub dose: f64,
}

impl AgeBracket {
    pub fn contains(&self, age_months: f64) -> bool {
        self.min_age_months <= age_months && age_months <= self.max_age_months
    }
}

/// Maximum dose, absolute or relative to body weight.
///
/// Serialized as `{"mg": 400}` or `{"mgPerKg": 40}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DoseLimit {
    Mg(f64),
    MgPerKg(f64),
}

impl DoseLimit {
    /// Limit in mg for a patient; weight-relative limits need the weight.
    pub fn resolve_mg(&self, weight_kg: Option<f64>) -> Option<f64> {
        match *self {
            DoseLimit::Mg(mg) => Some(mg),
            DoseLimit::MgPerKg(per_kg) => weight_kg.map(|kg| per_kg * kg),
        }
    }

    fn amount(&self) -> f64 {
        match *self {
            DoseLimit::Mg(v) | DoseLimit::MgPerKg(v) => v,
        }
    }
}

impl fmt::Display for DoseLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoseLimit::Mg(mg) => write!(f, "{mg} mg"),
            DoseLimit::MgPerKg(per_kg) => write!(f, "{per_kg} mg/kg"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationProfile {
    pub id: String,
    pub name: String,
    pub dosing_type: DosingType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose_default: Option<f64>,
    #[serde(default)]
    pub dose_unit: MassUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_dose: Option<DoseLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_daily_dose: Option<DoseLimit>,
    #[serde(default)]
    pub frequencies: Vec<FrequencyOption>,
    #[serde(default)]
    pub concentrations: Vec<Concentration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weight_brackets: Vec<WeightBracket>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub age_brackets: Vec<AgeBracket>,
}

impl MedicationProfile {
    /// Frequency offered by this profile, matched case-insensitively.
    pub fn frequency(&self, code: &str) -> Option<&FrequencyOption> {
        let code = code.trim();
        self.frequencies
            .iter()
            .find(|f| f.value.eq_ignore_ascii_case(code))
    }

    /// First weight bracket whose inclusive range holds the weight.
    pub fn weight_bracket_for(&self, weight_kg: f64) -> Option<&WeightBracket> {
        self.weight_brackets.iter().find(|b| b.contains(weight_kg))
    }

    pub fn age_bracket_for(&self, age_months: f64) -> Option<&AgeBracket> {
        self.age_brackets.iter().find(|b| b.contains(age_months))
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| invalid(format!("medication '{}': {msg}", self.id));

        if self.id.trim().is_empty() {
            return Err(invalid("medication id must not be empty"));
        }
        if let Some(dose) = self.dose_default {
            if !dose.is_finite() || dose <= 0.0 {
                return Err(fail(format!("doseDefault {dose} must be positive")));
            }
        }
        for (label, limit) in [("maxDose", self.max_dose), ("maxDailyDose", self.max_daily_dose)] {
            if let Some(limit) = limit {
                if !limit.amount().is_finite() || limit.amount() <= 0.0 {
                    return Err(fail(format!("{label} {limit} must be positive")));
                }
            }
        }
        if let Some(freq) = self
            .frequencies
            .iter()
            .find(|f| !f.times_per_day.is_finite() || f.times_per_day <= 0.0)
        {
            return Err(fail(format!(
                "frequency '{}' has non-positive timesPerDay",
                freq.value
            )));
        }
        for concentration in &self.concentrations {
            concentration.validate().map_err(|e| fail(e.to_string()))?;
        }

        match self.dosing_type {
            DosingType::WeightBracket if self.weight_brackets.is_empty() => {
                return Err(fail("weight bracket dosing without weightBrackets".into()));
            }
            DosingType::AgeBracket if self.age_brackets.is_empty() => {
                return Err(fail("age bracket dosing without ageBrackets".into()));
            }
            _ => {}
        }
        let bracket_ranges = self
            .weight_brackets
            .iter()
            .map(|b| (b.min_weight, b.max_weight, b.dose))
            .chain(
                self.age_brackets
                    .iter()
                    .map(|b| (b.min_age_months, b.max_age_months, b.dose)),
            );
        for (min, max, dose) in bracket_ranges {
            if !(min.is_finite() && max.is_finite() && min <= max) {
                return Err(fail(format!("bracket {min}..={max} is not a valid range")));
            }
            if !dose.is_finite() || dose < 0.0 {
                return Err(fail(format!("bracket dose {dose} must be non-negative")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RawFormulary {
    #[serde(default)]
    description: Option<String>,
    medications: Vec<MedicationProfile>,
}

/// Validated collection of medication profiles, looked up by id.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawFormulary")]
pub struct MedicationFormulary {
    description: Option<String>,
    medications: Vec<MedicationProfile>,
}

impl TryFrom<RawFormulary> for MedicationFormulary {
    type Error = ReferenceError;

    fn try_from(raw: RawFormulary) -> Result<Self> {
        let mut formulary = Self::new(raw.medications)?;
        formulary.description = raw.description;
        Ok(formulary)
    }
}

impl MedicationFormulary {
    pub fn new(medications: Vec<MedicationProfile>) -> Result<Self> {
        for profile in &medications {
            profile.validate()?;
        }
        if let Some(id) = medications
            .iter()
            .map(|m| m.id.to_lowercase())
            .duplicates()
            .next()
        {
            return Err(invalid(format!("duplicate medication id '{id}'")));
        }
        Ok(Self {
            description: None,
            medications,
        })
    }

    pub fn get(&self, id: &str) -> Option<&MedicationProfile> {
        let id = id.trim();
        self.medications.iter().find(|m| m.id.eq_ignore_ascii_case(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MedicationProfile> {
        self.medications.iter()
    }

    pub fn len(&self) -> usize {
        self.medications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.medications.is_empty()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(dosing_type: DosingType) -> MedicationProfile {
        MedicationProfile {
            id: "test-drug".into(),
            name: "Test drug".into(),
            dosing_type,
            dose_default: Some(10.0),
            dose_unit: MassUnit::Mg,
            max_dose: None,
            max_daily_dose: None,
            frequencies: vec![FrequencyOption {
                value: "BID".into(),
                times_per_day: 2.0,
                continuous: false,
            }],
            concentrations: vec![],
            weight_brackets: vec![],
            age_brackets: vec![],
        }
    }

    #[test]
    fn test_parse_liquid_concentration() {
        let c: Concentration = "125mg/5mL".parse().unwrap();
        assert_eq!(c.per, ConcentrationBasis::Milliliters(5.0));
        assert_eq!(c.mg_per_ml(), Some(25.0));
        assert_eq!(c.mg_per_tablet(), None);
    }

    #[test]
    fn test_parse_tablet_and_microgram_concentrations() {
        let tab: Concentration = "250 mg/tab".parse().unwrap();
        assert_eq!(tab.mg_per_tablet(), Some(250.0));

        let drops: Concentration = "100mcg/mL".parse().unwrap();
        assert_eq!(drops.amount_unit, MassUnit::Mcg);
        assert!((drops.mg_per_ml().unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_parse_rejects_malformed_concentration() {
        assert!("125mg".parse::<Concentration>().is_err());
        assert!("mg/5mL".parse::<Concentration>().is_err());
        assert!("125mg/5L".parse::<Concentration>().is_err());
        assert!("125mg/0mL".parse::<Concentration>().is_err());
        assert!("125mg/2tab".parse::<Concentration>().is_err());
    }

    #[test]
    fn test_concentration_json_forms() {
        let liquid: Concentration =
            serde_json::from_value(serde_json::json!({"amount": 400, "amountUnit": "mg", "per": {"mL": 5}}))
                .unwrap();
        assert_eq!(liquid.mg_per_ml(), Some(80.0));
        let tablet: Concentration =
            serde_json::from_value(serde_json::json!({"amount": 0.5, "amountUnit": "g", "per": "tablet"}))
                .unwrap();
        assert_eq!(tablet.mg_per_tablet(), Some(500.0));
    }

    #[test]
    fn test_concentration_from_json_can_be_checked() {
        let zero_volume: Concentration =
            serde_json::from_value(serde_json::json!({"amount": 125, "per": {"mL": 0}})).unwrap();
        assert!(zero_volume.validate().is_err());
        assert!(Concentration::per_tablet(-5.0, MassUnit::Mg).validate().is_err());
        assert!(Concentration::per_ml(125.0, MassUnit::Mg, 5.0).validate().is_ok());
    }

    #[test]
    fn test_dose_limit_forms() {
        let absolute: DoseLimit = serde_json::from_value(serde_json::json!({"mg": 400})).unwrap();
        let relative: DoseLimit = serde_json::from_value(serde_json::json!({"mgPerKg": 40})).unwrap();
        assert_eq!(absolute.resolve_mg(None), Some(400.0));
        assert_eq!(relative.resolve_mg(Some(20.0)), Some(800.0));
        assert_eq!(relative.resolve_mg(None), None);
    }

    #[test]
    fn test_dosing_type_aliases() {
        let parsed: DosingType = serde_json::from_value(serde_json::json!("mg/kg/day")).unwrap();
        assert_eq!(parsed, DosingType::MgPerKgPerDay);
        assert_eq!("weight-bracket".parse::<DosingType>().unwrap(), DosingType::WeightBracket);
        assert_eq!("mg/m2".parse::<DosingType>().unwrap(), DosingType::BsaPerM2);
        assert!("per-hour".parse::<DosingType>().is_err());
    }

    #[test]
    fn test_frequency_lookup_ignores_case() {
        let p = profile(DosingType::MgPerKgPerDay);
        assert_eq!(p.frequency("bid").map(|f| f.times_per_day), Some(2.0));
        assert!(p.frequency("tid").is_none());
    }

    #[test]
    fn test_first_matching_bracket_wins() {
        let mut p = profile(DosingType::WeightBracket);
        p.weight_brackets = vec![
            WeightBracket { min_weight: 5.0, max_weight: 10.0, dose: 80.0 },
            WeightBracket { min_weight: 10.0, max_weight: 15.0, dose: 120.0 },
        ];
        assert_eq!(p.weight_bracket_for(10.0).map(|b| b.dose), Some(80.0));
        assert_eq!(p.weight_bracket_for(12.0).map(|b| b.dose), Some(120.0));
        assert!(p.weight_bracket_for(16.0).is_none());
    }

    #[test]
    fn test_bracket_profile_requires_brackets() {
        assert!(profile(DosingType::AgeBracket).validate().is_err());
        assert!(profile(DosingType::MgPerKgPerDose).validate().is_ok());
    }

    #[test]
    fn test_formulary_rejects_duplicate_ids() {
        let err = MedicationFormulary::new(vec![
            profile(DosingType::FlatPerDay),
            profile(DosingType::FlatPerDose),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate medication id"));
    }
}
