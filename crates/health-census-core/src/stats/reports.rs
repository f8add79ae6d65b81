//! Report generation.
//!
//! Each report kind has its own body type so consumers know the structure
//! without inspecting it. Rendering is left to the caller.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::{average_age, group_by_gender, percentage, Share};
use crate::models::{AgeBracket, Gender, Patient, UnknownCode};

/// Selectable report kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    General,
    ByCondition,
    ByAge,
    ByGender,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::General,
        ReportKind::ByCondition,
        ReportKind::ByAge,
        ReportKind::ByGender,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ReportKind::General => "general",
            ReportKind::ByCondition => "by-condition",
            ReportKind::ByAge => "by-age",
            ReportKind::ByGender => "by-gender",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ReportKind {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" => Ok(ReportKind::General),
            "by-condition" | "por-condicion" => Ok(ReportKind::ByCondition),
            "by-age" | "por-edad" => Ok(ReportKind::ByAge),
            "by-gender" | "por-genero" => Ok(ReportKind::ByGender),
            other => Err(UnknownCode(other.to_string())),
        }
    }
}

/// Totals for the general report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralReport {
    pub total: usize,
    pub average_age: f64,
    /// Every gender, including those with no records
    pub genders: Vec<Share>,
}

/// One row of the by-condition report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionRow {
    pub name: String,
    pub age: u8,
    pub gender: Gender,
    pub severity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionGroup {
    pub condition: String,
    pub patients: Vec<ConditionRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeBracketGroup {
    pub bracket: AgeBracket,
    pub count: usize,
    pub average_age: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenderGroup {
    pub gender: Gender,
    pub count: usize,
    pub average_age: f64,
}

/// A generated report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "body", rename_all = "kebab-case")]
pub enum Report {
    /// `None` when no patients are registered
    General(Option<GeneralReport>),
    ByCondition(Vec<ConditionGroup>),
    ByAge(Vec<AgeBracketGroup>),
    ByGender(Vec<GenderGroup>),
    /// The requested key names no report
    Unavailable,
}

impl Report {
    pub fn title(&self) -> &'static str {
        match self {
            Report::General(_) => "General report",
            Report::ByCondition(_) => "Report by health condition",
            Report::ByAge(_) => "Report by age bracket",
            Report::ByGender(_) => "Report by gender",
            Report::Unavailable => "Report not available",
        }
    }

    pub fn has_data(&self) -> bool {
        match self {
            Report::General(body) => body.is_some(),
            Report::ByCondition(groups) => !groups.is_empty(),
            Report::ByAge(groups) => !groups.is_empty(),
            Report::ByGender(groups) => !groups.is_empty(),
            Report::Unavailable => false,
        }
    }
}

/// Generate the report named by `key`. Unknown keys yield
/// [`Report::Unavailable`].
pub fn generate_report(key: &str, patients: &[Patient]) -> Report {
    match key.parse::<ReportKind>() {
        Ok(kind) => build_report(kind, patients),
        Err(_) => Report::Unavailable,
    }
}

pub fn build_report(kind: ReportKind, patients: &[Patient]) -> Report {
    match kind {
        ReportKind::General => Report::General(general_report(patients)),
        ReportKind::ByCondition => Report::ByCondition(condition_groups(patients)),
        ReportKind::ByAge => Report::ByAge(age_bracket_groups(patients)),
        ReportKind::ByGender => Report::ByGender(gender_groups(patients)),
    }
}

fn general_report(patients: &[Patient]) -> Option<GeneralReport> {
    let average_age = average_age(patients)?;
    let total = patients.len();
    let observed = group_by_gender(patients);
    let genders = Gender::ALL
        .iter()
        .map(|gender| {
            let count = observed.count(gender.code());
            percentage(count, total).map(|percent| Share {
                label: gender.code().to_string(),
                count,
                percent,
                specified: true,
            })
        })
        .collect::<Option<Vec<_>>>()?;

    Some(GeneralReport {
        total,
        average_age,
        genders,
    })
}

/// Partition in first-seen order of the key.
fn partition<'a, K, F>(patients: &'a [Patient], key_of: F) -> Vec<(K, Vec<&'a Patient>)>
where
    K: PartialEq,
    F: Fn(&Patient) -> K,
{
    let mut groups: Vec<(K, Vec<&'a Patient>)> = Vec::new();
    for patient in patients {
        let key = key_of(patient);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(patient),
            None => groups.push((key, vec![patient])),
        }
    }
    groups
}

fn condition_groups(patients: &[Patient]) -> Vec<ConditionGroup> {
    partition(patients, |p| p.resolved_condition().to_string())
        .into_iter()
        .map(|(condition, members)| ConditionGroup {
            condition,
            patients: members
                .into_iter()
                .map(|p| ConditionRow {
                    name: p.name.clone(),
                    age: p.age,
                    gender: p.gender,
                    severity: p.severity.clone(),
                })
                .collect(),
        })
        .collect()
}

fn age_bracket_groups(patients: &[Patient]) -> Vec<AgeBracketGroup> {
    partition(patients, Patient::age_bracket)
        .into_iter()
        .filter_map(|(bracket, members)| {
            Some(AgeBracketGroup {
                bracket,
                count: members.len(),
                average_age: average_age(members)?,
            })
        })
        .collect()
}

fn gender_groups(patients: &[Patient]) -> Vec<GenderGroup> {
    partition(patients, |p| p.gender)
        .into_iter()
        .filter_map(|(gender, members)| {
            Some(GenderGroup {
                gender,
                count: members.len(),
                average_age: average_age(members)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::models::Condition;

    #[test]
    fn test_report_kind_keys() {
        assert_eq!("general".parse::<ReportKind>(), Ok(ReportKind::General));
        assert_eq!("por-edad".parse::<ReportKind>(), Ok(ReportKind::ByAge));
        assert_eq!("BY-GENDER".parse::<ReportKind>(), Ok(ReportKind::ByGender));
        for kind in ReportKind::ALL {
            assert_eq!(kind.key().parse::<ReportKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_key_is_unavailable() {
        let report = generate_report("by-planet", &three());
        assert_eq!(report, Report::Unavailable);
        assert_eq!(report.title(), "Report not available");
        assert!(!report.has_data());
    }

    #[test]
    fn test_general_report() {
        let Report::General(Some(body)) = generate_report("general", &three()) else {
            panic!("expected general report body");
        };
        assert_eq!(body.total, 3);
        assert_eq!(body.average_age, 35.0);

        let percents: Vec<(&str, f64)> = body
            .genders
            .iter()
            .map(|s| (s.label.as_str(), s.percent))
            .collect();
        assert_eq!(percents, vec![("male", 33.3), ("female", 66.7), ("other", 0.0)]);
    }

    #[test]
    fn test_general_report_without_patients() {
        let report = generate_report("general", &[]);
        assert_eq!(report, Report::General(None));
        assert!(!report.has_data());
    }

    #[test]
    fn test_condition_report_lists_members() {
        let Report::ByCondition(groups) = build_report(ReportKind::ByCondition, &three()) else {
            panic!("expected condition groups");
        };
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].condition, "diabetes");
        assert_eq!(groups[0].patients.len(), 2);
        assert_eq!(groups[0].patients[0].name, "María");
        assert_eq!(groups[0].patients[0].severity.as_deref(), Some("moderate"));
        assert_eq!(groups[0].patients[1].severity, None);
        assert_eq!(groups[1].condition, "hypertension");
    }

    #[test]
    fn test_age_report_averages() {
        let Report::ByAge(groups) = build_report(ReportKind::ByAge, &three()) else {
            panic!("expected age groups");
        };
        assert_eq!(groups[0].bracket, AgeBracket::Adult);
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].average_age, 38.5);
        assert_eq!(groups[1].bracket, AgeBracket::YoungAdult);
        assert_eq!(groups[1].average_age, 28.0);
    }

    #[test]
    fn test_gender_report_averages() {
        let mut patients = three();
        patients.push(patient(4, "Sam", 51, Gender::Other, Condition::Asthma));
        let Report::ByGender(groups) = build_report(ReportKind::ByGender, &patients) else {
            panic!("expected gender groups");
        };
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].gender, Gender::Female);
        assert_eq!(groups[0].average_age, 36.5);
        assert_eq!(groups[2].gender, Gender::Other);
        assert_eq!(groups[2].count, 1);
    }

    #[test]
    fn test_report_serializes_tagged() {
        let json = serde_json::to_value(generate_report("by-gender", &three())).unwrap();
        assert_eq!(json["kind"], "by-gender");
        assert_eq!(json["body"][0]["gender"], "female");
    }
}
