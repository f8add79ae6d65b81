//! Property tests for derived patient fields and validation bounds.

use health_census_core::models::{age_bracket, bmi, AgeBracket};
use health_census_core::validation::validate_age;
use proptest::prelude::*;

proptest! {
    #[test]
    fn bmi_matches_formula(weight in 1.0f64..400.0, height in 30.0f64..250.0) {
        let expected = (weight / ((height / 100.0) * (height / 100.0)) * 10.0).round() / 10.0;
        prop_assert_eq!(bmi(Some(weight), Some(height)), Some(expected));
        prop_assert!(expected > 0.0);
    }

    #[test]
    fn bmi_absent_without_both_inputs(value in 1.0f64..400.0) {
        prop_assert_eq!(bmi(Some(value), None), None);
        prop_assert_eq!(bmi(None, Some(value)), None);
    }

    #[test]
    fn age_bracket_follows_band_edges(age in 0u8..=120) {
        let expected = if age < 18 {
            AgeBracket::Minor
        } else if age < 30 {
            AgeBracket::YoungAdult
        } else if age < 50 {
            AgeBracket::Adult
        } else if age < 65 {
            AgeBracket::OlderAdult
        } else {
            AgeBracket::Senior
        };
        prop_assert_eq!(age_bracket(age), expected);
    }

    #[test]
    fn validate_age_accepts_exactly_the_range(age in -500i64..500) {
        let accepted = validate_age(&age.to_string()).is_ok();
        prop_assert_eq!(accepted, (0..=120).contains(&age));
    }
}
