use crate::bilirubin::BilirubinResult;
use crate::blood_pressure::BpResult;
use crate::dosing::DoseResult;
use crate::growth::GrowthResult;
use serde::{Deserialize, Serialize};

/// Output of any calculator, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CalculationResult {
    Growth(GrowthResult),
    BloodPressure(BpResult),
    Bilirubin(BilirubinResult),
    Dose(DoseResult),
}

impl CalculationResult {
    /// Short human-readable interpretation
    pub fn label(&self) -> String {
        match self {
            CalculationResult::Growth(result) => result.label(),
            CalculationResult::BloodPressure(result) => result.label(),
            CalculationResult::Bilirubin(result) => result.label(),
            CalculationResult::Dose(result) => result.label(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CalculationResult::Growth(_) => "growth",
            CalculationResult::BloodPressure(_) => "bloodPressure",
            CalculationResult::Bilirubin(_) => "bilirubin",
            CalculationResult::Dose(_) => "dose",
        }
    }
}

impl From<GrowthResult> for CalculationResult {
    fn from(result: GrowthResult) -> Self {
        CalculationResult::Growth(result)
    }
}

impl From<BpResult> for CalculationResult {
    fn from(result: BpResult) -> Self {
        CalculationResult::BloodPressure(result)
    }
}

impl From<BilirubinResult> for CalculationResult {
    fn from(result: BilirubinResult) -> Self {
        CalculationResult::Bilirubin(result)
    }
}

impl From<DoseResult> for CalculationResult {
    fn from(result: DoseResult) -> Self {
        CalculationResult::Dose(result)
    }
}
