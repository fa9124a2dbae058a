use chrono::{Datelike, NaiveDate};
use crate::models::series::{mean, MonthlySeries};
use crate::models::variable::Variable;

/// Number of trailing months averaged when the calendar month has no history
const TRAILING_MONTHS: usize = 12;

/// Synthesizes the value of a regressor for a month beyond the history.
///
/// Uses the climatology of the same calendar month if there is any, otherwise the mean of the
/// last twelve months. The series carries the last observed value forward, so the final row
/// holds the variable whenever it was observed at all and the trailing mean always exists
/// then. Returns None only if the variable was never observed.
///
/// # Arguments
///
/// * 'series' - the historical series
/// * 'variable' - the regressor
/// * 'month' - the future month to synthesize for
pub fn synthesize(series: &MonthlySeries, variable: Variable, month: NaiveDate) -> Option<f64> {
    let climatology = mean(
        series.rows()
            .iter()
            .filter(|r| r.month.month() == month.month())
            .filter_map(|r| r.get(variable))
    );

    climatology.or_else(|| series.trailing_mean(variable, TRAILING_MONTHS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use crate::models::series::MonthlyRow;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn series(points: &[(i32, u32, Option<f64>)]) -> MonthlySeries {
        MonthlySeries::new(points.iter().map(|(y, m, v)| {
            let mut values = BTreeMap::new();
            if let Some(v) = v {
                values.insert(Variable::Humidity, *v);
            }
            values.insert(Variable::WindSpeed, 1.0);
            MonthlyRow::new(date(*y, *m), values)
        }).collect())
    }

    #[test]
    fn test_same_calendar_month_mean() {
        let s = series(&[(2020, 6, Some(60.0)), (2020, 7, Some(10.0)), (2021, 6, Some(70.0)), (2021, 7, Some(20.0))]);
        assert_eq!(synthesize(&s, Variable::Humidity, date(2025, 6)), Some(65.0));
    }

    #[test]
    fn test_falls_back_to_trailing_mean() {
        let points: Vec<(i32, u32, Option<f64>)> = (1..=5).map(|m| (2020, m, Some(m as f64 * 10.0))).collect();
        let s = series(&points);
        assert_eq!(synthesize(&s, Variable::Humidity, date(2025, 11)), Some(30.0));
    }

    #[test]
    fn test_single_late_observation() {
        let mut points: Vec<(i32, u32, Option<f64>)> = (0..19).map(|i| (2020 + i / 12, (i % 12) as u32 + 1, None)).collect();
        points.push((2021, 8, Some(55.0)));
        let s = series(&points);

        assert_eq!(s.len(), 20);
        assert_eq!(synthesize(&s, Variable::Humidity, date(2025, 3)), Some(55.0));
    }

    #[test]
    fn test_never_observed_is_none() {
        let s = series(&[(2020, 1, None), (2020, 2, None)]);
        assert_eq!(synthesize(&s, Variable::Humidity, date(2025, 1)), None);
    }
}
