//! Aggregation over the patient collection.
//!
//! Groupings keep their buckets in first-seen order, so ties and display
//! order follow registration order.

mod charts;
mod reports;

pub use charts::*;
pub use reports::*;

use serde::Serialize;

use crate::models::{round_one_decimal, Patient};

/// Display label of the bucket for records with no value for the grouped
/// attribute.
pub const UNSPECIFIED: &str = "unspecified";

/// One bucket of a grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub count: usize,
    /// False for the bucket of records without a value. A record whose
    /// value is literally "unspecified" lands in a separate bucket.
    pub specified: bool,
}

/// Bucket with its share of the grouping total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub label: String,
    pub count: usize,
    /// Percentage, one decimal
    pub percent: f64,
    pub specified: bool,
}

/// Label → count mapping in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Grouping {
    buckets: Vec<Bucket>,
}

impl Grouping {
    /// Count one occurrence of `label`.
    pub fn add(&mut self, label: &str) {
        self.increment(label, true);
    }

    /// Count one record with no value.
    pub fn add_unspecified(&mut self) {
        self.increment(UNSPECIFIED, false);
    }

    fn increment(&mut self, label: &str, specified: bool) {
        match self
            .buckets
            .iter_mut()
            .find(|b| b.specified == specified && b.label == label)
        {
            Some(bucket) => bucket.count += 1,
            None => self.buckets.push(Bucket {
                label: label.to_string(),
                count: 1,
                specified,
            }),
        }
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn count(&self, label: &str) -> usize {
        self.buckets
            .iter()
            .find(|b| b.specified && b.label == label)
            .map_or(0, |b| b.count)
    }

    pub fn unspecified_count(&self) -> usize {
        self.buckets
            .iter()
            .find(|b| !b.specified)
            .map_or(0, |b| b.count)
    }

    /// Records that contributed to this grouping.
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Shares of the total, or `None` when there is no data.
    pub fn shares(&self) -> Option<Vec<Share>> {
        let total = self.total();
        self.buckets
            .iter()
            .map(|b| {
                percentage(b.count, total).map(|percent| Share {
                    label: b.label.clone(),
                    count: b.count,
                    percent,
                    specified: b.specified,
                })
            })
            .collect::<Option<Vec<_>>>()
            .filter(|shares| !shares.is_empty())
    }

    /// Largest bucket; the earliest one wins ties.
    pub fn most_common(&self) -> Option<&Bucket> {
        self.buckets.iter().fold(None, |best: Option<&Bucket>, b| match best {
            Some(current) if current.count >= b.count => Some(current),
            _ => Some(b),
        })
    }
}

/// Group records by an extracted label. `None` and blank labels fall into
/// the unspecified bucket.
pub fn group_by<F>(patients: &[Patient], label_of: F) -> Grouping
where
    F: Fn(&Patient) -> Option<String>,
{
    let mut grouping = Grouping::default();
    for patient in patients {
        match label_of(patient).filter(|l| !l.trim().is_empty()) {
            Some(label) => grouping.add(&label),
            None => grouping.add_unspecified(),
        }
    }
    grouping
}

pub fn group_by_gender(patients: &[Patient]) -> Grouping {
    group_by(patients, |p| Some(p.gender.code().to_string()))
}

pub fn group_by_age_bracket(patients: &[Patient]) -> Grouping {
    group_by(patients, |p| Some(p.age_bracket().label().to_string()))
}

pub fn group_by_condition(patients: &[Patient]) -> Grouping {
    group_by(patients, |p| Some(p.resolved_condition().to_string()))
}

pub fn group_by_severity(patients: &[Patient]) -> Grouping {
    group_by(patients, |p| p.severity.clone())
}

/// `count / total * 100` to one decimal; `None` when `total` is zero.
pub fn percentage(count: usize, total: usize) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(round_one_decimal(count as f64 / total as f64 * 100.0))
}

/// Mean age to one decimal; `None` for an empty slice.
pub fn average_age<'a, I>(patients: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a Patient>,
{
    let (sum, n) = patients
        .into_iter()
        .fold((0u64, 0usize), |(sum, n), p| (sum + u64::from(p.age), n + 1));
    if n == 0 {
        return None;
    }
    Some(round_one_decimal(sum as f64 / n as f64))
}

/// Headline figures for the statistics view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Summary {
    NoData,
    Populated {
        total: usize,
        average_age: f64,
        most_common_condition: String,
    },
}

pub fn summarize(patients: &[Patient]) -> Summary {
    let Some(average_age) = average_age(patients) else {
        return Summary::NoData;
    };
    let conditions = group_by_condition(patients);
    match conditions.most_common() {
        Some(bucket) => Summary::Populated {
            total: patients.len(),
            average_age,
            most_common_condition: bucket.label.clone(),
        },
        None => Summary::NoData,
    }
}

/// One titled distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatSection {
    pub title: String,
    pub shares: Vec<Share>,
}

/// Distributions by gender, age bracket, condition and severity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedStatistics {
    pub sections: Vec<StatSection>,
}

/// Detailed distributions, or `None` with no records.
pub fn detailed_statistics(patients: &[Patient]) -> Option<DetailedStatistics> {
    let groupings = [
        ("Distribution by gender", group_by_gender(patients)),
        ("Distribution by age bracket", group_by_age_bracket(patients)),
        ("Distribution by condition", group_by_condition(patients)),
        ("Distribution by severity", group_by_severity(patients)),
    ];

    let sections = groupings
        .into_iter()
        .map(|(title, grouping)| {
            grouping.shares().map(|shares| StatSection {
                title: title.to_string(),
                shares,
            })
        })
        .collect::<Option<Vec<_>>>()?;

    Some(DetailedStatistics { sections })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;

    use crate::models::{sample_draft, Condition, Gender, Patient};

    pub fn patient(id: u64, name: &str, age: u8, gender: Gender, condition: Condition) -> Patient {
        Patient::new(id, sample_draft(name, age, gender, condition), Utc::now())
    }

    /// Three records: two female, one male.
    pub fn three() -> Vec<Patient> {
        let mut first = sample_draft("María", 45, Gender::Female, Condition::Diabetes);
        first.severity = Some("moderate".into());
        first.weight_kg = Some(68.0);
        first.height_cm = Some(165.0);
        let mut second = sample_draft("Juan", 32, Gender::Male, Condition::Hypertension);
        second.severity = Some("mild".into());
        second.weight_kg = Some(75.0);
        second.height_cm = Some(178.0);
        let third = sample_draft("Ana", 28, Gender::Female, Condition::Diabetes);
        vec![
            Patient::new(1, first, Utc::now()),
            Patient::new(2, second, Utc::now()),
            Patient::new(3, third, Utc::now()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::{Condition, Gender};

    #[test]
    fn test_group_by_gender() {
        let grouping = group_by_gender(&three());
        assert_eq!(grouping.count("female"), 2);
        assert_eq!(grouping.count("male"), 1);
        assert_eq!(grouping.total(), 3);

        let shares = grouping.shares().unwrap();
        assert_eq!(shares[0].label, "female");
        assert_eq!(shares[0].percent, 66.7);
        assert_eq!(shares[1].percent, 33.3);
    }

    #[test]
    fn test_severity_unspecified_bucket() {
        let grouping = group_by_severity(&three());
        let labels: Vec<&str> = grouping.buckets().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["moderate", "mild", UNSPECIFIED]);
        assert_eq!(grouping.unspecified_count(), 1);
        assert_eq!(grouping.count(UNSPECIFIED), 0);
    }

    #[test]
    fn test_literal_unspecified_severity_kept_apart() {
        let mut patients = three();
        patients[0].severity = Some("unspecified".into());

        let grouping = group_by_severity(&patients);
        assert_eq!(grouping.count("unspecified"), 1);
        assert_eq!(grouping.unspecified_count(), 1);
        assert_eq!(grouping.buckets().len(), 3);
        assert!(grouping.buckets()[0].specified);
        assert!(!grouping.buckets()[2].specified);
    }

    #[test]
    fn test_percentage_guards_zero_total() {
        assert_eq!(percentage(0, 0), None);
        assert_eq!(percentage(1, 3), Some(33.3));
        assert_eq!(Grouping::default().shares(), None);
    }

    #[test]
    fn test_most_common_tie_keeps_first_seen() {
        let patients = vec![
            patient(1, "Ana", 28, Gender::Female, Condition::Asthma),
            patient(2, "Juan", 32, Gender::Male, Condition::Diabetes),
            patient(3, "Luis", 40, Gender::Male, Condition::Diabetes),
            patient(4, "Eva", 50, Gender::Female, Condition::Asthma),
        ];
        let grouping = group_by_condition(&patients);
        assert_eq!(grouping.most_common().unwrap().label, "asthma");
    }

    #[test]
    fn test_summary() {
        match summarize(&three()) {
            Summary::Populated {
                total,
                average_age,
                most_common_condition,
            } => {
                assert_eq!(total, 3);
                assert_eq!(average_age, 35.0);
                assert_eq!(most_common_condition, "diabetes");
            }
            Summary::NoData => panic!("expected data"),
        }
    }

    #[test]
    fn test_empty_collection_has_no_data() {
        assert_eq!(summarize(&[]), Summary::NoData);
        assert_eq!(detailed_statistics(&[]), None);
        assert_eq!(average_age(&[]), None);
        assert!(group_by_condition(&[]).most_common().is_none());
    }

    #[test]
    fn test_detailed_statistics_sections() {
        let stats = detailed_statistics(&three()).unwrap();
        assert_eq!(stats.sections.len(), 4);
        assert_eq!(stats.sections[1].shares[0].label, "adult");
        assert_eq!(stats.sections[1].shares[0].count, 2);
    }
}
