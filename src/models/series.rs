use std::collections::BTreeMap;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use crate::models::variable::Variable;

/// One aggregated month. A variable missing from `values` is missing for the month.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MonthlyRow {
    pub month: NaiveDate,
    pub values: BTreeMap<Variable, f64>,
}

impl MonthlyRow {
    /// Returns a new row keyed by the first day of the month of the given date
    ///
    /// # Arguments
    ///
    /// * 'date' - any date within the month
    /// * 'values' - aggregated values for the month
    pub fn new(date: NaiveDate, values: BTreeMap<Variable, f64>) -> MonthlyRow {
        MonthlyRow { month: first_of_month(date), values }
    }

    pub fn get(&self, variable: Variable) -> Option<f64> {
        self.values.get(&variable).copied()
    }
}

/// Aggregated monthly history for a region.
///
/// Construction sorts rows by month, keeps the last row written for any duplicated month and
/// carries the last observed value of every variable forward into later months missing it.
/// The series is read-only afterwards.
#[derive(Serialize, Debug, Clone, Default)]
pub struct MonthlySeries {
    rows: Vec<MonthlyRow>,
}

impl MonthlySeries {
    /// Builds a series from rows in any order
    ///
    /// # Arguments
    ///
    /// * 'rows' - monthly rows, later duplicates of a month replace earlier ones
    pub fn new(rows: Vec<MonthlyRow>) -> MonthlySeries {
        let mut by_month: BTreeMap<NaiveDate, BTreeMap<Variable, f64>> = BTreeMap::new();
        for row in rows {
            by_month.insert(row.month, row.values);
        }

        let mut last_seen: BTreeMap<Variable, f64> = BTreeMap::new();
        let mut rows: Vec<MonthlyRow> = Vec::with_capacity(by_month.len());
        for (month, mut values) in by_month {
            values.retain(|_, v| v.is_finite());
            for (variable, value) in &last_seen {
                values.entry(*variable).or_insert(*value);
            }
            last_seen.extend(values.iter().map(|(k, v)| (*k, *v)));
            rows.push(MonthlyRow { month, values });
        }

        MonthlySeries { rows }
    }

    pub fn rows(&self) -> &[MonthlyRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the last historical month, or None if empty
    pub fn last_month(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.month)
    }

    /// Returns true if the variable has a value in at least one month
    ///
    /// # Arguments
    ///
    /// * 'variable' - the variable to look for
    pub fn has_variable(&self, variable: Variable) -> bool {
        self.rows.iter().any(|r| r.values.contains_key(&variable))
    }

    /// Returns all (month, value) pairs where the variable is present
    ///
    /// # Arguments
    ///
    /// * 'variable' - the variable to collect
    pub fn observed(&self, variable: Variable) -> Vec<(NaiveDate, f64)> {
        self.rows
            .iter()
            .filter_map(|r| r.get(variable).map(|v| (r.month, v)))
            .collect()
    }

    /// Mean of the variable over the last `months` rows, ignoring months where it is missing
    ///
    /// # Arguments
    ///
    /// * 'variable' - the variable to average
    /// * 'months' - number of trailing rows to include
    pub fn trailing_mean(&self, variable: Variable, months: usize) -> Option<f64> {
        let start = self.rows.len().saturating_sub(months);
        mean(self.rows[start..].iter().filter_map(|r| r.get(variable)))
    }
}

/// Returns the first day of the month of the given date
///
/// # Arguments
///
/// * 'date' - the date to normalize
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(date.day0() as i64)
}

/// Number of whole calendar months from `from` to `to`
///
/// # Arguments
///
/// * 'from' - start date
/// * 'to' - end date
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}

/// Arithmetic mean, None for an empty iterator
///
/// # Arguments
///
/// * 'values' - values to average
pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values.into_iter().fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { None } else { Some(sum / count as f64) }
}
