use std::collections::BTreeMap;
use chrono::NaiveDate;
use serde::Serialize;
use crate::models::variable::Variable;

/// One projected month, `lower <= point <= upper`
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct ProjectedRow {
    pub month: NaiveDate,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Output of a fitted variable model, covering the fitted history and the future horizon
#[derive(Serialize, Debug, Clone)]
pub struct ProjectedSeries {
    pub variable: Variable,
    pub rows: Vec<ProjectedRow>,
}

/// Forecast of one variable for the target month
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub variable: Variable,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ForecastPoint {
    /// Returns a forecast point copied from a projected row
    ///
    /// # Arguments
    ///
    /// * 'variable' - the variable the row belongs to
    /// * 'row' - the selected projected row
    pub fn from_row(variable: Variable, row: &ProjectedRow) -> ForecastPoint {
        ForecastPoint { variable, value: row.point, lower: row.lower, upper: row.upper }
    }
}

/// Forecasts per variable. A variable without forecast is absent, never zero.
pub type ForecastMap = BTreeMap<Variable, ForecastPoint>;
