//! Patient lookup.
//!
//! Criteria compose with AND; an absent criterion imposes no constraint.

use serde::{Deserialize, Serialize};

use crate::models::{non_blank, Condition, Patient};

/// Search criteria. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCriteria {
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    /// Case-insensitive match against the resolved condition. Condition
    /// codes in either language match the stored code.
    pub condition: Option<String>,
    /// Inclusive lower age bound
    pub min_age: Option<u32>,
    /// Inclusive upper age bound
    pub max_age: Option<u32>,
}

impl SearchCriteria {
    /// Build criteria from the raw text of a search form.
    ///
    /// Blank text and ages that do not parse are treated as absent.
    pub fn from_form(name: &str, condition: &str, min_age: &str, max_age: &str) -> Self {
        Self {
            name: non_blank(name),
            condition: non_blank(condition),
            min_age: parse_age_bound(min_age),
            max_age: parse_age_bound(max_age),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_age_range(mut self, min_age: Option<u32>, max_age: Option<u32>) -> Self {
        self.min_age = min_age;
        self.max_age = max_age;
        self
    }

    /// Whether a single record satisfies every active criterion.
    pub fn matches(&self, patient: &Patient) -> bool {
        if let Some(name) = self.name.as_deref().and_then(non_blank) {
            if !patient.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }

        if let Some(condition) = self.condition.as_deref().and_then(non_blank) {
            if patient.resolved_condition().to_lowercase() != condition_key(&condition) {
                return false;
            }
        }

        let age = u32::from(patient.age);
        if self.min_age.is_some_and(|min| age < min) {
            return false;
        }
        if self.max_age.is_some_and(|max| age > max) {
            return false;
        }

        true
    }
}

/// Known condition codes (in either language) normalize to the stored code;
/// anything else is compared as free text.
fn condition_key(condition: &str) -> String {
    match condition.parse::<Condition>() {
        Ok(known) if known != Condition::Other => known.code().to_string(),
        _ => condition.to_lowercase(),
    }
}

fn parse_age_bound(value: &str) -> Option<u32> {
    value.trim().parse().ok()
}

/// Records matching the criteria, in registration order.
pub fn search<'a>(patients: &'a [Patient], criteria: &SearchCriteria) -> Vec<&'a Patient> {
    patients.iter().filter(|p| criteria.matches(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{sample_draft, Gender};
    use chrono::Utc;

    fn patients() -> Vec<Patient> {
        let mut other = sample_draft("Luis Gómez", 70, Gender::Male, Condition::Other);
        other.other_condition = Some("Migraine".into());
        vec![
            Patient::new(1, sample_draft("Ana", 28, Gender::Female, Condition::Healthy), Utc::now()),
            Patient::new(2, sample_draft("Juan", 32, Gender::Male, Condition::Diabetes), Utc::now()),
            Patient::new(3, other, Utc::now()),
        ]
    }

    fn ids(found: &[&Patient]) -> Vec<u64> {
        found.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_min_age() {
        let patients = patients();
        let criteria = SearchCriteria::default().with_age_range(Some(30), None);
        assert_eq!(ids(&search(&patients[..2], &criteria)), vec![2]);
    }

    #[test]
    fn test_empty_criteria_returns_all_in_order() {
        let patients = patients();
        let criteria = SearchCriteria::from_form("", "", "", "");
        assert_eq!(criteria, SearchCriteria::default());
        assert_eq!(ids(&search(&patients, &criteria)), vec![1, 2, 3]);
    }

    #[test]
    fn test_name_substring_is_case_insensitive() {
        let patients = patients();
        let criteria = SearchCriteria::default().with_name("GÓM");
        assert_eq!(ids(&search(&patients, &criteria)), vec![3]);
    }

    #[test]
    fn test_condition_matches_resolved_label() {
        let patients = patients();
        let criteria = SearchCriteria::default().with_condition("migraine");
        assert_eq!(ids(&search(&patients, &criteria)), vec![3]);

        let criteria = SearchCriteria::default().with_condition("DIABETES");
        assert_eq!(ids(&search(&patients, &criteria)), vec![2]);
    }

    #[test]
    fn test_condition_accepts_spanish_codes() {
        let mut patients = patients();
        patients.push(Patient::new(
            4,
            sample_draft("Eva", 55, Gender::Female, Condition::Hypertension),
            Utc::now(),
        ));

        let criteria = SearchCriteria::default().with_condition("hipertension");
        assert_eq!(ids(&search(&patients, &criteria)), vec![4]);

        let criteria = SearchCriteria::from_form("", "Saludable", "", "");
        assert_eq!(ids(&search(&patients, &criteria)), vec![1]);

        // "other" names no record on its own; free text is what matches.
        let criteria = SearchCriteria::default().with_condition("otra");
        assert!(search(&patients, &criteria).is_empty());
    }

    #[test]
    fn test_unparsable_ages_are_ignored() {
        let criteria = SearchCriteria::from_form("", "", "abc", "  ");
        assert_eq!(criteria.min_age, None);
        assert_eq!(criteria.max_age, None);

        let criteria = SearchCriteria::from_form("", "", "0", "30");
        assert_eq!(criteria.min_age, Some(0));
        assert_eq!(criteria.max_age, Some(30));
    }

    #[test]
    fn test_criteria_compose() {
        let patients = patients();
        let criteria = SearchCriteria::default()
            .with_name("a")
            .with_age_range(Some(20), Some(40));
        assert_eq!(ids(&search(&patients, &criteria)), vec![1, 2]);
    }

    #[test]
    fn test_repeated_search_is_stable() {
        let patients = patients();
        let criteria = SearchCriteria::default().with_age_range(None, Some(50));
        assert_eq!(search(&patients, &criteria), search(&patients, &criteria));
    }

    #[test]
    fn test_no_match() {
        let patients = patients();
        let criteria = SearchCriteria::default().with_name("zzz");
        assert!(search(&patients, &criteria).is_empty());
    }
}
