//! Result rendering: pretty JSON or colored text.

use anyhow::{Context, Result};
use clinical_engine::{
    BilirubinResult, BpCategory, BpComponentResult, BpResult, CalculationResult, DoseResult,
    GrowthResult, InterpolationPosition,
};
use colored::{ColoredString, Colorize};
use reference_data::ReferenceSummary;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{text}");
    Ok(())
}

fn heading(text: &str) {
    println!("{}", text.bright_cyan().bold());
}

fn field(name: &str, value: impl std::fmt::Display) {
    println!("  {:<24} {}", name.bright_black(), value);
}

fn position_note(position: InterpolationPosition) -> Option<ColoredString> {
    match position {
        InterpolationPosition::Exact | InterpolationPosition::Interpolated => None,
        InterpolationPosition::ClampedBelow => Some("clamped to first tabulated point".yellow()),
        InterpolationPosition::ClampedAbove => Some("clamped to last tabulated point".yellow()),
    }
}

pub fn print_result(result: &CalculationResult) {
    match result {
        CalculationResult::Growth(growth) => print_growth(growth),
        CalculationResult::BloodPressure(bp) => print_blood_pressure(bp),
        CalculationResult::Bilirubin(bilirubin) => print_bilirubin(bilirubin),
        CalculationResult::Dose(dose) => print_dose(dose),
    }
}

fn print_growth(result: &GrowthResult) {
    heading(&format!("{} ({})", result.measure, result.sex));
    field("age", format!("{:.1} months", result.age_months));
    field("value", format!("{:.2} {}", result.value, result.unit));
    field("z-score", format!("{:+.2}", result.z_score));
    field("percentile", format!("{:.1}", result.percentile).bright_white().bold());
    field("band", result.band);
    if let Some(status) = result.weight_status {
        field("weight status", status.to_string().bright_yellow());
    }
    field("LMS", format!("L={:.4} M={:.4} S={:.5}", result.l, result.m, result.s));
    if let Some(note) = position_note(result.reference_position) {
        field("reference", note);
    }
    let curves = result
        .reference_curves
        .iter()
        .map(|(label, value)| format!("{label}={value:.1}"))
        .collect::<Vec<_>>()
        .join(" ");
    field("reference curves", curves);
}

fn category_color(category: BpCategory) -> ColoredString {
    let label = category.to_string();
    match category {
        BpCategory::Normal | BpCategory::LowNormal => label.green(),
        BpCategory::Elevated => label.yellow(),
        BpCategory::Hypotension | BpCategory::Stage1Hypertension => label.bright_red(),
        BpCategory::Stage2Hypertension => label.red().bold(),
    }
}

fn component_line(name: &str, component: &BpComponentResult) {
    let cut = &component.cut_points;
    field(
        name,
        format!(
            "{:.0} mmHg  {}  (p50 {:.0}, p90 {:.0}, p95 {:.0})",
            component.value,
            category_color(component.category),
            cut.p50,
            cut.p90,
            cut.p95
        ),
    );
}

fn print_blood_pressure(result: &BpResult) {
    heading(&format!("Blood pressure ({}, {} years)", result.sex, result.age_years));
    field(
        "height percentile",
        format!("{:.1} (table column p{})", result.height_percentile, result.height_bucket.key),
    );
    component_line("systolic", &result.systolic);
    component_line("diastolic", &result.diastolic);
    if result.fixed_cut_points {
        field("cut points", "fixed adolescent thresholds");
    }
    field("category", category_color(result.category).bold());
}

fn print_bilirubin(result: &BilirubinResult) {
    let t = &result.thresholds;
    heading(&format!("Bilirubin ({})", result.risk_category));
    field("age", format!("{:.0} hours", result.age_hours));
    field("total bilirubin", format!("{:.1} mg/dL", result.total_bilirubin_mg_dl));
    field("confirm with TSB", format!("{:.1}", t.confirm_with_tsb));
    field("phototherapy", format!("{:.1}", t.phototherapy));
    field("escalation of care", format!("{:.1}", t.escalation_of_care));
    field("exchange transfusion", format!("{:.1}", t.exchange_transfusion));
    field("margin to phototherapy", format!("{:+.1} mg/dL", result.phototherapy_margin));
    if let Some(note) = position_note(result.position) {
        field("reference", note);
    }
    field("level", result.level.to_string().bright_white().bold());
}

fn print_dose(result: &DoseResult) {
    heading(&format!(
        "Dose ({})",
        result.medication_id.as_deref().unwrap_or("ad-hoc order")
    ));
    field("dosing type", result.dosing_type);
    if let Some(bsa) = result.bsa_m2 {
        field("BSA", format!("{bsa:.4} m²"));
    }
    if let Some(bracket) = result.bracket {
        field("bracket", format!("{} to {} ({:?})", bracket.min, bracket.max, bracket.basis));
    }
    let per_dose_label = if result.continuous { "hourly rate" } else { "per dose" };
    field(per_dose_label, format!("{:.2} mg", result.per_dose_mg).bright_white().bold());
    field("daily", format!("{:.2} mg ({} × {})", result.daily_dose_mg, result.frequency, result.times_per_day));
    if let Some(volume) = result.volume_per_dose_ml {
        field("volume per dose", format!("{volume:.2} mL"));
    }
    if let Some(volume) = result.volume_per_day_ml {
        field("volume per day", format!("{volume:.2} mL"));
    }
    if let Some(tablets) = result.tablets_per_dose {
        field("tablets per dose", tablets);
    }
    if result.dose_was_capped {
        let caps = result
            .caps_applied
            .iter()
            .map(|cap| format!("{cap:?}"))
            .collect::<Vec<_>>()
            .join(", ");
        field(
            "capped",
            format!(
                "{} (uncapped {:.2} mg/day)",
                caps, result.uncapped_daily_dose_mg
            )
            .bright_red(),
        );
    }
}

pub fn print_summary(summary: &ReferenceSummary) {
    heading(&format!("Reference data: {}", summary.source));
    if summary.is_empty() {
        println!("  {}", "no tables loaded".yellow());
        return;
    }
    let range = |r: Option<(f64, f64)>| {
        r.map_or_else(|| "-".to_string(), |(min, max)| format!("{min}-{max} mo"))
    };
    for table in &summary.growth_tables {
        field(
            &table.measure.to_string(),
            format!(
                "{} rows, male {}, female {}",
                table.rows,
                range(table.male_age_months),
                range(table.female_age_months)
            ),
        );
    }
    if let Some(rows) = summary.bp_rows {
        field("blood pressure", format!("{rows} rows"));
    }
    if !summary.bilirubin_categories.is_empty() {
        field("bilirubin categories", summary.bilirubin_categories.join(", "));
    }
    if !summary.medications.is_empty() {
        field("medications", summary.medications.join(", "));
    }
    println!("  {}", "all tables valid".green());
}
