//! Ordered-rule classification of computed values.
//!
//! A [`RuleSet`] holds rules from most to least severe plus a fallback. The
//! first rule whose bound the value satisfies decides the category.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Bound {
    /// `value >= threshold`
    AtLeast(f64),
    /// `value < threshold`
    Below(f64),
}

impl Bound {
    pub fn matches(self, value: f64) -> bool {
        match self {
            Bound::AtLeast(threshold) => value >= threshold,
            Bound::Below(threshold) => value < threshold,
        }
    }

    pub fn threshold(self) -> f64 {
        match self {
            Bound::AtLeast(t) | Bound::Below(t) => t,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule<C> {
    pub category: C,
    pub bound: Bound,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSet<C> {
    rules: Vec<Rule<C>>,
    fallback: C,
}

impl<C: Copy> RuleSet<C> {
    pub fn new(fallback: C) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// Appends a rule below every rule added so far.
    pub fn rule(mut self, category: C, bound: Bound) -> Self {
        self.rules.push(Rule { category, bound });
        self
    }

    pub fn classify(&self, value: f64) -> C {
        self.rules
            .iter()
            .find(|rule| rule.bound.matches(value))
            .map_or(self.fallback, |rule| rule.category)
    }

    pub fn rules(&self) -> &[Rule<C>] {
        &self.rules
    }

    pub fn fallback(&self) -> C {
        self.fallback
    }
}

/// Position of a percentile among the standard growth chart lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PercentileBand {
    BelowFifth,
    FifthToTenth,
    TenthToTwentyFifth,
    TwentyFifthToFiftieth,
    FiftiethToSeventyFifth,
    SeventyFifthToNinetieth,
    NinetiethToNinetyFifth,
    AboveNinetyFifth,
}

impl PercentileBand {
    pub fn rules() -> RuleSet<Self> {
        RuleSet::new(PercentileBand::BelowFifth)
            .rule(PercentileBand::AboveNinetyFifth, Bound::AtLeast(95.0))
            .rule(PercentileBand::NinetiethToNinetyFifth, Bound::AtLeast(90.0))
            .rule(PercentileBand::SeventyFifthToNinetieth, Bound::AtLeast(75.0))
            .rule(PercentileBand::FiftiethToSeventyFifth, Bound::AtLeast(50.0))
            .rule(PercentileBand::TwentyFifthToFiftieth, Bound::AtLeast(25.0))
            .rule(PercentileBand::TenthToTwentyFifth, Bound::AtLeast(10.0))
            .rule(PercentileBand::FifthToTenth, Bound::AtLeast(5.0))
    }

    pub fn from_percentile(percentile: f64) -> Self {
        Self::rules().classify(percentile)
    }
}

impl fmt::Display for PercentileBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PercentileBand::BelowFifth => "below 5th percentile",
            PercentileBand::FifthToTenth => "5th to 10th percentile",
            PercentileBand::TenthToTwentyFifth => "10th to 25th percentile",
            PercentileBand::TwentyFifthToFiftieth => "25th to 50th percentile",
            PercentileBand::FiftiethToSeventyFifth => "50th to 75th percentile",
            PercentileBand::SeventyFifthToNinetieth => "75th to 90th percentile",
            PercentileBand::NinetiethToNinetyFifth => "90th to 95th percentile",
            PercentileBand::AboveNinetyFifth => "at or above 95th percentile",
        };
        write!(f, "{label}")
    }
}

/// BMI-for-age weight status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeightStatus {
    Underweight,
    HealthyWeight,
    Overweight,
    Obesity,
}

impl WeightStatus {
    pub fn rules() -> RuleSet<Self> {
        RuleSet::new(WeightStatus::HealthyWeight)
            .rule(WeightStatus::Obesity, Bound::AtLeast(95.0))
            .rule(WeightStatus::Overweight, Bound::AtLeast(85.0))
            .rule(WeightStatus::Underweight, Bound::Below(5.0))
    }

    pub fn from_percentile(percentile: f64) -> Self {
        Self::rules().classify(percentile)
    }
}

impl fmt::Display for WeightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WeightStatus::Underweight => "underweight",
            WeightStatus::HealthyWeight => "healthy weight",
            WeightStatus::Overweight => "overweight",
            WeightStatus::Obesity => "obesity",
        };
        write!(f, "{label}")
    }
}

/// Neonatal hyperbilirubinemia action level, least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BilirubinRiskLevel {
    Routine,
    ConfirmWithTsb,
    Phototherapy,
    EscalationOfCare,
    ExchangeTransfusion,
}

impl fmt::Display for BilirubinRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BilirubinRiskLevel::Routine => "below phototherapy threshold",
            BilirubinRiskLevel::ConfirmWithTsb => "near phototherapy threshold, confirm with serum bilirubin",
            BilirubinRiskLevel::Phototherapy => "phototherapy indicated",
            BilirubinRiskLevel::EscalationOfCare => "escalation of care",
            BilirubinRiskLevel::ExchangeTransfusion => "exchange transfusion threshold",
        };
        write!(f, "{label}")
    }
}

/// Blood pressure category, least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BpCategory {
    Normal,
    LowNormal,
    Hypotension,
    Elevated,
    Stage1Hypertension,
    Stage2Hypertension,
}

impl fmt::Display for BpCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BpCategory::Normal => "normal",
            BpCategory::LowNormal => "low normal",
            BpCategory::Hypotension => "hypotension",
            BpCategory::Elevated => "elevated",
            BpCategory::Stage1Hypertension => "stage 1 hypertension",
            BpCategory::Stage2Hypertension => "stage 2 hypertension",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = RuleSet::new("normal")
            .rule("high", Bound::AtLeast(100.0))
            .rule("raised", Bound::AtLeast(90.0))
            .rule("low", Bound::Below(10.0));
        assert_eq!(rules.classify(150.0), "high");
        assert_eq!(rules.classify(90.0), "raised");
        assert_eq!(rules.classify(50.0), "normal");
        assert_eq!(rules.classify(9.99), "low");
        assert_eq!(rules.rules().len(), 3);
    }

    #[test]
    fn test_percentile_band_edges() {
        assert_eq!(PercentileBand::from_percentile(4.99), PercentileBand::BelowFifth);
        assert_eq!(PercentileBand::from_percentile(5.0), PercentileBand::FifthToTenth);
        assert_eq!(PercentileBand::from_percentile(84.13), PercentileBand::SeventyFifthToNinetieth);
        assert_eq!(PercentileBand::from_percentile(95.0), PercentileBand::AboveNinetyFifth);
    }

    #[test]
    fn test_weight_status_cutoffs() {
        assert_eq!(WeightStatus::from_percentile(3.0), WeightStatus::Underweight);
        assert_eq!(WeightStatus::from_percentile(50.0), WeightStatus::HealthyWeight);
        assert_eq!(WeightStatus::from_percentile(85.0), WeightStatus::Overweight);
        assert_eq!(WeightStatus::from_percentile(97.0), WeightStatus::Obesity);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(BpCategory::Stage2Hypertension > BpCategory::Stage1Hypertension);
        assert!(BpCategory::Elevated > BpCategory::Hypotension);
        assert!(BpCategory::Hypotension > BpCategory::LowNormal);
        assert!(BilirubinRiskLevel::ExchangeTransfusion > BilirubinRiskLevel::Phototherapy);
    }

    #[test]
    fn test_labels_serialize_camel_case() {
        let json = serde_json::to_value(BpCategory::Stage1Hypertension).unwrap();
        assert_eq!(json, "stage1Hypertension");
        let json = serde_json::to_value(BilirubinRiskLevel::ConfirmWithTsb).unwrap();
        assert_eq!(json, "confirmWithTsb");
    }
}
