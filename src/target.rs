use chrono::NaiveDate;
use crate::errors::ForecastError;
use crate::models::forecast::{ForecastPoint, ProjectedRow, ProjectedSeries};
use crate::models::series::{first_of_month, months_between};

/// Returns the first day of the month of the given date
///
/// # Arguments
///
/// * 'date' - any date
pub fn normalize_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
}

/// Number of months from the last historical month to the target month
///
/// # Arguments
///
/// * 'last_month' - last month of the history
/// * 'target' - target date, any day of the month
pub fn horizon_months(last_month: NaiveDate, target: NaiveDate) -> i32 {
    months_between(normalize_month(last_month), normalize_month(target))
}

/// Picks the forecast for the target month out of a projection.
///
/// A target not after the last historical month is rejected rather than answered with a
/// fitted historical value. Otherwise the row of the target month is used, or failing that
/// the row closest in days.
///
/// # Arguments
///
/// * 'projected' - projection of one variable
/// * 'last_month' - last month of the history
/// * 'target_date' - the requested date
pub fn extract(projected: &ProjectedSeries, last_month: NaiveDate, target_date: NaiveDate) -> Result<ForecastPoint, ForecastError> {
    let variable = projected.variable;

    if horizon_months(last_month, target_date) <= 0 {
        return Err(ForecastError::InvalidTargetDate {
            variable,
            target: target_date,
            last_month: normalize_month(last_month),
        });
    }

    let target = normalize_month(target_date);
    let row = select_row(&projected.rows, target)
        .ok_or(ForecastError::UnresolvedTarget { variable, target })?;

    Ok(ForecastPoint::from_row(variable, row))
}

/// Row of the target month, otherwise the first row with the smallest day distance
///
/// # Arguments
///
/// * 'rows' - projected rows
/// * 'target' - normalized target month
fn select_row(rows: &[ProjectedRow], target: NaiveDate) -> Option<&ProjectedRow> {
    rows.iter()
        .find(|r| r.month == target)
        .or_else(|| rows.iter().min_by_key(|r| (r.month - target).num_days().abs()))
}
