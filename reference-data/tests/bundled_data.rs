//! Tests for the bundled sample reference data
//!
//! Every document compiled into the binary must load and validate, and the
//! tables must cover the ranges the calculators rely on.

use proptest::prelude::*;
use reference_data::{
    BundledSource, Concentration, DosingType, GrowthMeasure, ReferenceSet, ReferenceSource, Sex,
    HEIGHT_PERCENTILE_BUCKETS,
};

// =============================================================================
// LOADING
// =============================================================================

#[test]
fn test_bundled_set_loads_every_document() {
    let set = ReferenceSet::bundled().unwrap();
    let summary = set.summary();

    assert_eq!(summary.source, "bundled sample data");
    assert_eq!(summary.growth_tables.len(), 3);
    assert!(summary.bp_rows.unwrap() > 0);
    assert_eq!(summary.bilirubin_categories.len(), 12);
    assert!(summary.medications.contains(&"amoxicillin".to_string()));
}

#[test]
fn test_bundled_documents_are_labelled_as_samples() {
    for name in BundledSource::names() {
        let value = BundledSource.read(name).unwrap().unwrap();
        let description = value["description"].as_str().unwrap_or_default();
        assert!(
            description.to_lowercase().contains("sample"),
            "{name} must say it is sample data"
        );
    }
}

// =============================================================================
// COVERAGE
// =============================================================================

#[test]
fn test_growth_tables_cover_both_sexes() {
    let set = ReferenceSet::bundled().unwrap();
    for measure in [
        GrowthMeasure::HeightForAge,
        GrowthMeasure::WeightForAge,
        GrowthMeasure::BmiForAge,
    ] {
        let table = set.lms(measure).unwrap();
        for sex in [Sex::Male, Sex::Female] {
            let (min, max) = table.age_range(sex).unwrap();
            assert!(min <= 24.0 && max >= 216.0, "{measure} {sex} covers {min}..{max}");
        }
    }
    assert!(set.lms(GrowthMeasure::HeadCircumferenceForAge).is_err());
}

#[test]
fn test_bp_table_has_every_height_bucket() {
    let set = ReferenceSet::bundled().unwrap();
    let bp = set.blood_pressure().unwrap();
    for sex in [Sex::Male, Sex::Female] {
        for age in 1..=17 {
            assert_eq!(bp.height_buckets(sex, age), HEIGHT_PERCENTILE_BUCKETS.to_vec());
        }
    }
}

#[test]
fn test_bilirubin_curves_span_first_two_weeks() {
    let set = ReferenceSet::bundled().unwrap();
    let thresholds = set.bilirubin().unwrap();
    for category in thresholds.phototherapy().categories() {
        let photo = thresholds.phototherapy().curve(category).unwrap();
        let exchange = thresholds.exchange_transfusion().curve(category).unwrap();
        assert_eq!(photo.key_range(), Some((12.0, 336.0)));
        for ((hour, photo_value), (_, exchange_value)) in
            photo.points().iter().zip(exchange.points())
        {
            assert!(photo_value < exchange_value, "{category} at {hour}h");
        }
    }
}

#[test]
fn test_bracket_profiles_have_brackets() {
    let set = ReferenceSet::bundled().unwrap();
    let formulary = set.formulary().unwrap();
    let cetirizine = formulary.get("Cetirizine").unwrap();
    assert_eq!(cetirizine.dosing_type, DosingType::AgeBracket);
    assert_eq!(cetirizine.age_bracket_for(30.0).map(|b| b.dose), Some(5.0));

    let otc = formulary.get("acetaminophen-otc").unwrap();
    assert_eq!(otc.weight_bracket_for(12.0).map(|b| b.dose), Some(160.0));
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    #[test]
    fn prop_liquid_strength_is_amount_over_volume(amount in 1u32..2000, ml in 1u32..50) {
        let parsed: Concentration = format!("{amount}mg/{ml}mL").parse().unwrap();
        let expected = f64::from(amount) / f64::from(ml);
        prop_assert!((parsed.mg_per_ml().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn prop_microgram_strength_is_thousandth(amount in 1u32..5000) {
        let mcg: Concentration = format!("{amount}mcg/tab").parse().unwrap();
        let mg: Concentration = format!("{amount}mg/tab").parse().unwrap();
        prop_assert!((mcg.mg_per_tablet().unwrap() * 1000.0 - mg.mg_per_tablet().unwrap()).abs() < 1e-9);
    }
}
