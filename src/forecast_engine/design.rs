use std::f64::consts::PI;
use chrono::{Datelike, NaiveDate};
use nalgebra::{DMatrix, DVector};

/// Length of the yearly seasonal period in days
const YEAR_DAYS: f64 = 365.25;

/// Singular values below this are treated as zero when solving least squares
const SVD_EPS: f64 = 1e-10;

/// Yearly Fourier terms `[sin(x1), cos(x1), sin(x2), cos(x2), ...]` for the given month,
/// anchored on the calendar so the phase is the same for every model
///
/// # Arguments
///
/// * 'month' - the month to compute terms for
/// * 'order' - number of harmonics
pub fn fourier_terms(month: NaiveDate, order: usize) -> Vec<f64> {
    let day = month.num_days_from_ce() as f64;

    let mut terms = Vec::with_capacity(2 * order);
    for k in 1..=order {
        let x = 2.0 * PI * k as f64 * day / YEAR_DAYS;
        terms.push(x.sin());
        terms.push(x.cos());
    }

    terms
}

/// One row of the model design: intercept, scaled time, the yearly Fourier terms and,
/// when `modulated`, the Fourier terms scaled by time so the seasonal amplitude follows the
/// trend. Standardized regressor values come last.
///
/// # Arguments
///
/// * 'month' - the month of the row
/// * 't' - scaled time of the month
/// * 'order' - number of harmonics
/// * 'modulated' - true to include the time scaled seasonal terms
/// * 'regressors' - standardized regressor values
pub fn design_row(month: NaiveDate, t: f64, order: usize, modulated: bool, regressors: &[f64]) -> Vec<f64> {
    let fourier = fourier_terms(month, order);

    let mut row: Vec<f64> = Vec::with_capacity(2 + 2 * fourier.len() + regressors.len());
    row.push(1.0);
    row.push(t);
    row.extend_from_slice(&fourier);
    if modulated {
        row.extend(fourier.iter().map(|f| t * f));
    }
    row.extend_from_slice(regressors);

    row
}

/// Solves min |X b - rhs| through SVD, which also copes with collinear columns
///
/// # Arguments
///
/// * 'rows' - design matrix rows, all of the same length
/// * 'rhs' - the values to fit
pub fn least_squares(rows: &[Vec<f64>], rhs: &[f64]) -> Result<Vec<f64>, String> {
    let p = rows.first().map_or(0, |r| r.len());
    if p == 0 {
        return Ok(Vec::new());
    }

    let x = DMatrix::from_fn(rows.len(), p, |i, j| rows[i][j]);
    let b = DVector::from_column_slice(rhs);

    let beta = x
        .svd(true, true)
        .solve(&b, SVD_EPS)
        .map_err(|e| format!("least squares failed: {}", e))?;

    Ok(beta.iter().copied().collect())
}

/// Population mean and standard deviation
///
/// # Arguments
///
/// * 'values' - the values, must not be empty
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len().max(1) as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_design_row_layout() {
        let month = NaiveDate::from_ymd_opt(2021, 4, 1).unwrap();
        let fourier = fourier_terms(month, 1);

        let plain = design_row(month, 0.5, 1, false, &[1.5]);
        assert_eq!(plain, vec![1.0, 0.5, fourier[0], fourier[1], 1.5]);

        let modulated = design_row(month, 0.5, 1, true, &[]);
        assert_eq!(modulated.len(), 6);
        assert_eq!(modulated[4], 0.5 * fourier[0]);
        assert_eq!(modulated[5], 0.5 * fourier[1]);
    }

    #[test]
    fn test_fourier_terms_repeat_yearly() {
        let jan = fourier_terms(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), 2);
        let next_jan = fourier_terms(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 2);
        let jul = fourier_terms(NaiveDate::from_ymd_opt(2020, 7, 1).unwrap(), 2);

        assert_eq!(jan.len(), 4);
        for (a, b) in jan.iter().zip(&next_jan) {
            assert!((a - b).abs() < 1e-6);
        }
        assert!((jan[1] + jul[1]).abs() < 0.05);
    }

    #[test]
    fn test_least_squares_with_collinear_columns() {
        let rows: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64, 2.0 * i as f64, 1.0]).collect();
        let rhs: Vec<f64> = (0..6).map(|i| 5.0 * i as f64 + 1.0).collect();

        let beta = least_squares(&rows, &rhs).unwrap();
        for (row, y) in rows.iter().zip(&rhs) {
            let fit: f64 = row.iter().zip(&beta).map(|(a, b)| a * b).sum();
            assert!((fit - y).abs() < 1e-6);
        }
        assert!(least_squares(&[vec![], vec![]], &[1.0, 2.0]).unwrap().is_empty());
    }

    #[test]
    fn test_mean_std() {
        let (m, s) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(m, 5.0);
        assert_eq!(s, 2.0);
    }
}
