pub mod design;
pub mod regressors;

use chrono::{Months, NaiveDate};
use log::debug;
use statrs::distribution::{ContinuousCDF, StudentsT};
use crate::config::ForecastParameters;
use crate::errors::ForecastError;
use crate::models::forecast::{ProjectedRow, ProjectedSeries};
use crate::models::series::{months_between, MonthlyRow, MonthlySeries};
use crate::models::variable::Variable;

/// A regression needs at least this many points whatever the configuration says
const MIN_FIT_POINTS: usize = 3;

/// Training months needed before the seasonal amplitude may follow the trend
const MODULATION_MONTHS: usize = 36;

/// Spread below which a column is considered constant
const CONSTANT_EPS: f64 = 1e-9;

/// Fits one model per variable and projects it over history and a future horizon
pub struct ForecastEngine {
    params: ForecastParameters,
}

/// Standardization of an external regressor
#[derive(Debug, Clone)]
struct RegressorFit {
    variable: Variable,
    mean: f64,
    std: f64,
}

impl RegressorFit {
    fn standardize(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }
}

/// Regressor values of one training month, in the order of the model's regressors
#[derive(Debug, Clone)]
struct TrainingMonth {
    month: NaiveDate,
    regressors: Vec<f64>,
}

/// A fitted model of one variable.
///
/// The point forecast is `m + k*t + sum_j (a_j + b_j*t) * f_j(month) + regressor effects`,
/// where `t` is months since the first training month scaled to [0, 1] and `f_j` are the
/// yearly Fourier terms. The `b_j` terms, fitted only with at least three years of history,
/// let the seasonal amplitude scale with the trend. All coefficients are fitted jointly.
#[derive(Debug, Clone)]
pub struct VariableModel {
    variable: Variable,
    first_month: NaiveDate,
    span: f64,
    fourier_order: usize,
    modulated: bool,
    coefficients: Vec<f64>,
    regressors: Vec<RegressorFit>,
    history: Vec<TrainingMonth>,
    sigma: f64,
    t_value: f64,
    t_mean: f64,
    t_sum_sq_dev: f64,
}

impl ForecastEngine {
    /// Returns a new engine
    ///
    /// # Arguments
    ///
    /// * 'params' - forecast parameters from configuration
    pub fn new(params: &ForecastParameters) -> ForecastEngine {
        ForecastEngine { params: params.clone() }
    }

    /// Fits a model for the variable and projects it `horizon` months past the last month
    /// of the series
    ///
    /// # Arguments
    ///
    /// * 'series' - the historical series
    /// * 'variable' - the variable to forecast
    /// * 'horizon' - number of future months
    pub fn forecast(&self, series: &MonthlySeries, variable: Variable, horizon: u32) -> Result<ProjectedSeries, ForecastError> {
        let model = self.fit(series, variable)?;
        model.project(series, horizon)
    }

    /// Fits a model for the variable.
    ///
    /// Training uses every month where the variable is present. A configured regressor is
    /// used only if it is present on all of those months and not constant over them, so a
    /// short regressor never shortens the training of another variable.
    ///
    /// # Arguments
    ///
    /// * 'series' - the historical series
    /// * 'variable' - the variable to fit
    pub fn fit(&self, series: &MonthlySeries, variable: Variable) -> Result<VariableModel, ForecastError> {
        if !series.has_variable(variable) {
            return Err(ForecastError::MissingVariable(variable));
        }

        let training: Vec<&MonthlyRow> = series.rows()
            .iter()
            .filter(|row| row.get(variable).is_some())
            .collect();

        let n = training.len();
        let required = self.params.min_data_points.max(MIN_FIT_POINTS);
        if n < required {
            return Err(ForecastError::InsufficientData { variable, found: n, required });
        }

        let y: Vec<f64> = training.iter().filter_map(|row| row.get(variable)).collect();
        if design::mean_std(&y).1 < CONSTANT_EPS {
            return Err(ForecastError::fit(variable, "target is constant over the training months"));
        }

        let mut regressors: Vec<RegressorFit> = Vec::new();
        let mut columns: Vec<Vec<f64>> = Vec::new();
        for r in &self.params.regressors {
            if *r == variable || regressors.iter().any(|f| f.variable == *r) {
                continue;
            }

            let Some(column) = training.iter().map(|row| row.get(*r)).collect::<Option<Vec<f64>>>() else {
                debug!("{}: regressor {} is missing on some training months, not used", variable, r);
                continue;
            };

            let (mean, std) = design::mean_std(&column);
            if std < CONSTANT_EPS {
                debug!("{}: regressor {} is constant, not used", variable, r);
                continue;
            }

            regressors.push(RegressorFit { variable: *r, mean, std });
            columns.push(column);
        }

        let history: Vec<TrainingMonth> = training
            .iter()
            .enumerate()
            .map(|(i, row)| TrainingMonth { month: row.month, regressors: columns.iter().map(|c| c[i]).collect() })
            .collect();

        let first_month = history[0].month;
        let span = months_between(first_month, history[n - 1].month) as f64;
        let t: Vec<f64> = history.iter().map(|h| months_between(first_month, h.month) as f64 / span).collect();

        let order = self.params.yearly_fourier_order;
        let modulated = n >= MODULATION_MONTHS;
        let rows: Vec<Vec<f64>> = history
            .iter()
            .zip(&t)
            .map(|(h, ti)| {
                let z: Vec<f64> = regressors.iter().zip(&h.regressors).map(|(r, x)| r.standardize(*x)).collect();
                design::design_row(h.month, *ti, order, modulated, &z)
            })
            .collect();

        let coefficients = design::least_squares(&rows, &y).map_err(|e| ForecastError::fit(variable, e))?;
        if coefficients.iter().any(|b| !b.is_finite()) {
            return Err(ForecastError::fit(variable, "non-finite model coefficients"));
        }

        let sse: f64 = rows
            .iter()
            .zip(&y)
            .map(|(row, yi)| (yi - dot(row, &coefficients)).powi(2))
            .sum();

        let df = (n as f64 - coefficients.len() as f64).max(1.0);
        let sigma = (sse / df).sqrt();

        let t_dist = StudentsT::new(0.0, 1.0, df)
            .map_err(|e| ForecastError::fit(variable, format!("failed to create t-distribution: {}", e)))?;
        let alpha = 1.0 - self.params.interval_width;
        let t_value = t_dist.inverse_cdf(1.0 - alpha / 2.0);

        let (t_mean, _) = design::mean_std(&t);
        let t_sum_sq_dev: f64 = t.iter().map(|ti| (ti - t_mean).powi(2)).sum();

        if !sigma.is_finite() || !t_value.is_finite() {
            return Err(ForecastError::fit(variable, "non-finite residual scale"));
        }

        debug!("{}: fitted on {} months with regressors {:?}, modulated {}, sigma {:.4}",
            variable, n, regressors.iter().map(|r| r.variable).collect::<Vec<Variable>>(), modulated, sigma);

        Ok(VariableModel {
            variable,
            first_month,
            span,
            fourier_order: order,
            modulated,
            coefficients,
            regressors,
            history,
            sigma,
            t_value,
            t_mean,
            t_sum_sq_dev,
        })
    }
}

impl VariableModel {
    pub fn variable(&self) -> Variable {
        self.variable
    }

    /// Regressors the model ended up using
    pub fn regressors(&self) -> Vec<Variable> {
        self.regressors.iter().map(|r| r.variable).collect()
    }

    /// Projects the model over its training months followed by `horizon` months after the
    /// last month of the series. Future regressor values are synthesized per calendar month.
    ///
    /// # Arguments
    ///
    /// * 'series' - the series the model was fitted on
    /// * 'horizon' - number of future months
    pub fn project(&self, series: &MonthlySeries, horizon: u32) -> Result<ProjectedSeries, ForecastError> {
        let mut rows: Vec<ProjectedRow> = Vec::with_capacity(self.history.len() + horizon as usize);
        for h in &self.history {
            rows.push(self.predict(h.month, &h.regressors)?);
        }

        let last_month = series.last_month()
            .into_iter()
            .chain(self.history.last().map(|h| h.month))
            .max()
            .ok_or_else(|| ForecastError::MissingVariable(self.variable))?;

        for step in 1..=horizon {
            let month = last_month
                .checked_add_months(Months::new(step))
                .ok_or_else(|| ForecastError::fit(self.variable, "projection runs past the calendar"))?;

            let values = self.regressors
                .iter()
                .map(|r| regressors::synthesize(series, r.variable, month)
                    .ok_or_else(|| ForecastError::fit(self.variable, format!("no history for regressor {}", r.variable))))
                .collect::<Result<Vec<f64>, ForecastError>>()?;

            rows.push(self.predict(month, &values)?);
        }

        Ok(ProjectedSeries { variable: self.variable, rows })
    }

    /// Point forecast and prediction interval for one month
    ///
    /// # Arguments
    ///
    /// * 'month' - the month to predict
    /// * 'values' - raw regressor values in model order
    fn predict(&self, month: NaiveDate, values: &[f64]) -> Result<ProjectedRow, ForecastError> {
        let t = months_between(self.first_month, month) as f64 / self.span;

        let z: Vec<f64> = self.regressors.iter().zip(values).map(|(r, x)| r.standardize(*x)).collect();
        let row = design::design_row(month, t, self.fourier_order, self.modulated, &z);
        let point = dot(&row, &self.coefficients);

        let n = self.history.len() as f64;
        let margin = self.t_value
            * self.sigma
            * (1.0 + 1.0 / n + (t - self.t_mean).powi(2) / self.t_sum_sq_dev).sqrt();

        if !point.is_finite() || !margin.is_finite() {
            return Err(ForecastError::fit(self.variable, format!("non-finite projection for {}", month)));
        }

        Ok(ProjectedRow { month, point, lower: point - margin.abs(), upper: point + margin.abs() })
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn month(i: u32) -> NaiveDate {
        date(2020, 1).checked_add_months(Months::new(i)).unwrap()
    }

    fn phase(i: u32) -> f64 {
        2.0 * std::f64::consts::PI * (i % 12) as f64 / 12.0
    }

    fn noise(i: u32) -> f64 {
        ((i * 7919) % 13) as f64 / 20.0 - 0.3
    }

    /// Seasonal temperature with small deterministic noise, humidity moving against it
    fn climate(months: u32) -> MonthlySeries {
        let rows = (0..months).map(|i| {
            let mut values = BTreeMap::new();
            values.insert(Variable::Temperature, 10.0 - 12.0 * phase(i).cos() + 0.05 * i as f64 + noise(i));
            values.insert(Variable::Humidity, 70.0 + 10.0 * phase(i).cos() - noise(i));
            values.insert(Variable::Pressure, 1013.0);
            MonthlyRow::new(month(i), values)
        }).collect();

        MonthlySeries::new(rows)
    }

    /// Temperature only, `level - 12 cos(phase)` around the given annual level
    fn temperature_around(level: f64, months: u32) -> MonthlySeries {
        MonthlySeries::new((0..months).map(|i| {
            let value = level - 12.0 * phase(i).cos() + noise(i);
            MonthlyRow::new(month(i), BTreeMap::from([(Variable::Temperature, value)]))
        }).collect())
    }

    #[test]
    fn test_projection_covers_history_and_horizon() {
        let series = climate(36);
        let engine = ForecastEngine::new(&ForecastParameters::default());
        let projected = engine.forecast(&series, Variable::Temperature, 6).unwrap();

        assert_eq!(projected.variable, Variable::Temperature);
        assert_eq!(projected.rows.len(), 42);
        assert_eq!(projected.rows.last().unwrap().month, date(2023, 6));
        assert!(projected.rows.windows(2).all(|w| w[0].month < w[1].month));
        for row in &projected.rows {
            assert!(row.lower <= row.point && row.point <= row.upper);
        }
    }

    #[test]
    fn test_seasonality_is_captured() {
        let series = climate(48);
        let engine = ForecastEngine::new(&ForecastParameters::default());
        let projected = engine.forecast(&series, Variable::Temperature, 12).unwrap();

        let july = projected.rows.iter().find(|r| r.month == date(2024, 7)).unwrap();
        let january = projected.rows.iter().find(|r| r.month == date(2024, 1)).unwrap();
        assert!(july.point > january.point + 10.0);
    }

    #[test]
    fn test_seasonality_around_zero_level() {
        let engine = ForecastEngine::new(&ForecastParameters::default());

        for level in [-2.0, 0.0, 0.3] {
            for months in [24, 48] {
                let projected = engine.forecast(&temperature_around(level, months), Variable::Temperature, 12).unwrap();
                let last_year = (months / 12 + 2020) as i32;

                let january = projected.rows.iter().find(|r| r.month == date(last_year, 1)).unwrap();
                let july = projected.rows.iter().find(|r| r.month == date(last_year, 7)).unwrap();
                assert!(january.point < level - 9.0, "level {} january {}", level, january.point);
                assert!(july.point > level + 9.0, "level {} july {}", level, july.point);
            }
        }
    }

    #[test]
    fn test_constant_regressor_not_used() {
        let series = climate(36);
        let model = ForecastEngine::new(&ForecastParameters::default()).fit(&series, Variable::Temperature).unwrap();

        assert_eq!(model.variable(), Variable::Temperature);
        assert_eq!(model.regressors(), vec![Variable::Humidity]);
    }

    #[test]
    fn test_short_regressor_does_not_shorten_training() {
        let rows = climate(36).rows().iter().enumerate().map(|(i, row)| {
            let mut values = row.values.clone();
            if i < 31 {
                values.remove(&Variable::Humidity);
            }
            MonthlyRow::new(row.month, values)
        }).collect();
        let series = MonthlySeries::new(rows);

        let model = ForecastEngine::new(&ForecastParameters::default()).fit(&series, Variable::Temperature).unwrap();
        assert!(model.regressors().is_empty());
        assert_eq!(model.project(&series, 3).unwrap().rows.len(), 39);

        let humidity = ForecastEngine::new(&ForecastParameters::default()).fit(&series, Variable::Humidity);
        assert_eq!(humidity.err(), Some(ForecastError::InsufficientData { variable: Variable::Humidity, found: 5, required: 12 }));
    }

    #[test]
    fn test_insufficient_data() {
        let series = climate(5);
        let result = ForecastEngine::new(&ForecastParameters::default()).fit(&series, Variable::Temperature);

        assert_eq!(result.err(), Some(ForecastError::InsufficientData { variable: Variable::Temperature, found: 5, required: 12 }));
    }

    #[test]
    fn test_missing_variable() {
        let series = climate(36);
        let result = ForecastEngine::new(&ForecastParameters::default()).fit(&series, Variable::SnowWater);

        assert_eq!(result.err(), Some(ForecastError::MissingVariable(Variable::SnowWater)));
    }

    #[test]
    fn test_constant_target_fails_fit() {
        let series = climate(36);
        let result = ForecastEngine::new(&ForecastParameters::default()).fit(&series, Variable::Pressure);

        assert!(matches!(result, Err(ForecastError::ModelFit { variable: Variable::Pressure, .. })));
    }

    #[test]
    fn test_deterministic() {
        let series = climate(30);
        let engine = ForecastEngine::new(&ForecastParameters::default());
        let a = engine.forecast(&series, Variable::Humidity, 3).unwrap();
        let b = engine.forecast(&series, Variable::Humidity, 3).unwrap();

        assert_eq!(a.rows, b.rows);
    }
}
