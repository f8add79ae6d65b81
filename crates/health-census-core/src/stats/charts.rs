//! Pre-aggregated series for chart rendering.

use serde::Serialize;

use super::{group_by_age_bracket, group_by_condition, group_by_gender, Grouping};
use crate::models::{round_one_decimal, Patient};

/// Parallel label/value lists, ready for a chart widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn push(&mut self, label: impl Into<String>, value: f64) {
        self.labels.push(label.into());
        self.values.push(value);
    }
}

impl From<&Grouping> for ChartSeries {
    fn from(grouping: &Grouping) -> Self {
        let mut series = ChartSeries::default();
        for bucket in grouping.buckets() {
            series.push(bucket.label.clone(), bucket.count as f64);
        }
        series
    }
}

/// Every series the statistics view draws.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub conditions: ChartSeries,
    pub genders: ChartSeries,
    pub age_brackets: ChartSeries,
    pub bmi_by_condition: ChartSeries,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

pub fn chart_data(patients: &[Patient]) -> ChartData {
    ChartData {
        conditions: ChartSeries::from(&group_by_condition(patients)),
        genders: ChartSeries::from(&group_by_gender(patients)),
        age_brackets: ChartSeries::from(&group_by_age_bracket(patients)),
        bmi_by_condition: bmi_by_condition(patients),
    }
}

/// Mean BMI per resolved condition. Records without a BMI are skipped.
pub fn bmi_by_condition(patients: &[Patient]) -> ChartSeries {
    let mut sums: Vec<(String, f64, usize)> = Vec::new();
    for patient in patients {
        let Some(bmi) = patient.bmi else { continue };
        let condition = patient.resolved_condition();
        match sums.iter_mut().find(|(label, _, _)| label.as_str() == condition) {
            Some((_, sum, n)) => {
                *sum += bmi;
                *n += 1;
            }
            None => sums.push((condition.to_string(), bmi, 1)),
        }
    }

    let mut series = ChartSeries::default();
    for (label, sum, n) in sums {
        series.push(label, round_one_decimal(sum / n as f64));
    }
    series
}
