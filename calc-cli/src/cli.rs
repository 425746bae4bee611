//! Command-line arguments and their translation into calculation requests.

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use clinical_engine::{
    BodyWeight, BsaMode, CalculationRequest, Length, LengthUnit, PatientAge, PatientMeasurement,
    Prescription, WeightUnit,
};
use reference_data::{Concentration, DoseLimit, DosingType, GrowthMeasure, MassUnit, Sex};
use std::path::PathBuf;

/// Pediatric clinical calculators
#[derive(Parser, Debug)]
#[command(name = "pedcalc", version)]
#[command(about = "Pediatric growth, blood pressure, bilirubin and medication dose calculators")]
pub struct Cli {
    /// Settings file (defaults to pedcalc.toml, .yaml or .json when present)
    #[arg(short, long, global = true, env = "PEDCALC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Growth percentile and z-score for age
    Growth(GrowthArgs),
    /// Blood pressure classification
    Bp(BpArgs),
    /// Neonatal bilirubin risk
    Bilirubin(BilirubinArgs),
    /// Medication dose
    Dose(DoseArgs),
    /// List and validate the loaded reference tables
    Tables,
    /// Run a JSON calculation request read from a file, or stdin when omitted
    Run {
        path: Option<PathBuf>,
    },
}

/// Height and weight with their units
#[derive(Args, Debug, Default)]
pub struct BodyArgs {
    /// Height or length
    #[arg(long)]
    pub height: Option<f64>,

    #[arg(long, default_value = "cm")]
    pub height_unit: LengthUnit,

    /// Body weight
    #[arg(long)]
    pub weight: Option<f64>,

    #[arg(long, default_value = "kg")]
    pub weight_unit: WeightUnit,
}

impl BodyArgs {
    fn apply(&self, mut patient: PatientMeasurement) -> PatientMeasurement {
        if let Some(value) = self.height {
            patient = patient.with_height(Length { value, unit: self.height_unit });
        }
        if let Some(value) = self.weight {
            patient = patient.with_weight(BodyWeight { value, unit: self.weight_unit });
        }
        patient
    }
}

#[derive(Args, Debug)]
pub struct GrowthArgs {
    /// height, weight, bmi or head
    #[arg(long)]
    pub measure: GrowthMeasure,

    #[arg(long)]
    pub sex: Sex,

    #[arg(long, conflicts_with = "age_years", required_unless_present = "age_years")]
    pub age_months: Option<f64>,

    #[arg(long)]
    pub age_years: Option<f64>,

    /// Head circumference, in the height unit
    #[arg(long)]
    pub head_circumference: Option<f64>,

    #[command(flatten)]
    pub body: BodyArgs,
}

#[derive(Args, Debug)]
pub struct BpArgs {
    #[arg(long)]
    pub systolic: f64,

    #[arg(long)]
    pub diastolic: f64,

    #[arg(long)]
    pub age_years: f64,

    #[arg(long)]
    pub sex: Sex,

    /// Height percentile; derived from --height when omitted
    #[arg(long, required_unless_present = "height")]
    pub height_percentile: Option<f64>,

    #[command(flatten)]
    pub body: BodyArgs,
}

#[derive(Args, Debug)]
pub struct BilirubinArgs {
    /// Postnatal age in hours
    #[arg(long)]
    pub age_hours: f64,

    /// Total serum bilirubin, mg/dL
    #[arg(long)]
    pub tsb: f64,

    /// Gestational age in weeks
    #[arg(long, required_unless_present = "risk_category")]
    pub gestational_age: Option<f64>,

    /// Neurotoxicity risk factors present
    #[arg(long)]
    pub risk_factors: bool,

    /// Threshold table key such as 38_withRisk; overrides gestational age
    #[arg(long)]
    pub risk_category: Option<String>,
}

#[derive(Args, Debug)]
pub struct DoseArgs {
    /// Formulary medication id
    #[arg(long, required_unless_present = "dosing_type")]
    pub medication: Option<String>,

    /// Dosing model for an order without a formulary profile (mg/kg/day, mg/m2, ...)
    #[arg(long)]
    pub dosing_type: Option<DosingType>,

    /// Dose amount, overriding the profile default
    #[arg(long)]
    pub dose: Option<f64>,

    #[arg(long)]
    pub dose_unit: Option<MassUnit>,

    /// Frequency code such as bid, q6h or continuous
    #[arg(long)]
    pub frequency: String,

    /// Strength such as 125mg/5mL or 250mg/tab
    #[arg(long)]
    pub concentration: Option<Concentration>,

    /// Maximum single dose
    #[arg(long)]
    pub max_dose: Option<f64>,

    /// Maximum daily dose
    #[arg(long)]
    pub max_daily_dose: Option<f64>,

    /// Read --max-dose and --max-daily-dose as mg/kg
    #[arg(long)]
    pub limits_per_kg: bool,

    /// Dose BSA orders against 1.73 m²
    #[arg(long, conflicts_with = "measured_bsa")]
    pub normalized_bsa: bool,

    /// Dose BSA orders against the measured Mosteller BSA
    #[arg(long)]
    pub measured_bsa: bool,

    /// Age in months, for age-bracket dosing
    #[arg(long)]
    pub age_months: Option<f64>,

    #[command(flatten)]
    pub body: BodyArgs,
}

impl GrowthArgs {
    pub fn into_request(self) -> Result<CalculationRequest> {
        let age = match (self.age_months, self.age_years) {
            (Some(months), _) => PatientAge::Months(months),
            (None, Some(years)) => PatientAge::Years(years),
            (None, None) => bail!("either --age-months or --age-years is required"),
        };
        let mut patient = self
            .body
            .apply(PatientMeasurement::new().with_sex(self.sex).with_age(age));
        if let Some(value) = self.head_circumference {
            patient = patient.with_head_circumference(Length { value, unit: self.body.height_unit });
        }
        Ok(CalculationRequest::Growth {
            measure: self.measure,
            patient,
        })
    }
}

impl BpArgs {
    pub fn into_request(self) -> CalculationRequest {
        let patient = self.body.apply(
            PatientMeasurement::new()
                .with_sex(self.sex)
                .with_age(PatientAge::Years(self.age_years))
                .with_blood_pressure(self.systolic, self.diastolic),
        );
        CalculationRequest::BloodPressure {
            patient,
            height_percentile: self.height_percentile,
        }
    }
}

impl BilirubinArgs {
    pub fn into_request(self) -> CalculationRequest {
        let mut patient = PatientMeasurement::new()
            .with_age(PatientAge::Hours(self.age_hours))
            .with_bilirubin(self.tsb);
        if let Some(weeks) = self.gestational_age {
            patient = patient.with_gestation(weeks, self.risk_factors);
        }
        CalculationRequest::Bilirubin {
            patient,
            risk_category: self.risk_category,
        }
    }
}

impl DoseArgs {
    fn limit(&self, mg: f64) -> DoseLimit {
        if self.limits_per_kg {
            DoseLimit::MgPerKg(mg)
        } else {
            DoseLimit::Mg(mg)
        }
    }

    pub fn into_request(self) -> CalculationRequest {
        let mut prescription = Prescription {
            medication_id: self.medication.clone(),
            dosing_type: self.dosing_type,
            dose_amount: self.dose,
            dose_unit: self.dose_unit,
            frequency: self.frequency.clone(),
            concentration: self.concentration,
            ..Prescription::default()
        };
        if let Some(mg) = self.max_dose {
            prescription = prescription.with_max_dose(self.limit(mg));
        }
        if let Some(mg) = self.max_daily_dose {
            prescription = prescription.with_max_daily_dose(self.limit(mg));
        }
        if self.normalized_bsa {
            prescription = prescription.with_bsa_mode(BsaMode::Normalized);
        } else if self.measured_bsa {
            prescription = prescription.with_bsa_mode(BsaMode::Measured);
        }

        let mut patient = self.body.apply(PatientMeasurement::new());
        if let Some(months) = self.age_months {
            patient = patient.with_age(PatientAge::Months(months));
        }
        CalculationRequest::Dose {
            prescription,
            patient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pedcalc").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_growth_request() {
        let cli = parse(&[
            "growth", "--measure", "bmi", "--sex", "female", "--age-months", "96", "--height",
            "128", "--weight", "26",
        ]);
        let Command::Growth(args) = cli.command else {
            panic!("expected growth");
        };
        let CalculationRequest::Growth { measure, patient } = args.into_request().unwrap() else {
            panic!("expected growth request");
        };
        assert_eq!(measure, GrowthMeasure::BmiForAge);
        assert_eq!(patient.age, Some(PatientAge::Months(96.0)));
        assert_eq!(patient.height_cm(), Some(128.0));
    }

    #[test]
    fn test_growth_needs_an_age() {
        let result = Cli::try_parse_from(["pedcalc", "growth", "--measure", "height", "--sex", "m"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_imperial_units() {
        let cli = parse(&[
            "bp", "--systolic", "118", "--diastolic", "70", "--age-years", "10", "--sex", "male",
            "--height", "54", "--height-unit", "in",
        ]);
        let Command::Bp(args) = cli.command else {
            panic!("expected bp");
        };
        let CalculationRequest::BloodPressure { patient, height_percentile } = args.into_request() else {
            panic!("expected blood pressure request");
        };
        assert!(height_percentile.is_none());
        assert!((patient.height_cm().unwrap() - 137.16).abs() < 1e-9);
    }

    #[test]
    fn test_ad_hoc_dose_with_per_kg_cap() {
        let cli = parse(&[
            "--json", "dose", "--dosing-type", "mg/kg/day", "--dose", "40", "--frequency", "bid",
            "--weight", "10", "--max-daily-dose", "30", "--limits-per-kg", "--concentration",
            "125mg/5mL",
        ]);
        assert!(cli.json);
        let Command::Dose(args) = cli.command else {
            panic!("expected dose");
        };
        let CalculationRequest::Dose { prescription, patient } = args.into_request() else {
            panic!("expected dose request");
        };
        assert_eq!(prescription.dosing_type, Some(DosingType::MgPerKgPerDay));
        assert_eq!(prescription.max_daily_dose, Some(DoseLimit::MgPerKg(30.0)));
        assert!(prescription.bsa_mode.is_none());
        assert_eq!(patient.weight_kg(), Some(10.0));
    }

    #[test]
    fn test_bilirubin_category_override() {
        let cli = parse(&[
            "bilirubin", "--age-hours", "60", "--tsb", "14.2", "--risk-category", "38_withRisk",
        ]);
        let Command::Bilirubin(args) = cli.command else {
            panic!("expected bilirubin");
        };
        let CalculationRequest::Bilirubin { patient, risk_category } = args.into_request() else {
            panic!("expected bilirubin request");
        };
        assert_eq!(risk_category.as_deref(), Some("38_withRisk"));
        assert!(patient.gestational_age_weeks.is_none());
    }
}
