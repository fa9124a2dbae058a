use std::collections::BTreeMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use crate::models::grid::GridObservation;
use crate::models::series::{mean, MonthlyRow, MonthlySeries};
use crate::models::variable::Variable;

/// Inclusive latitude/longitude rectangle
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

/// Reduces raw grid observations within a bounding box to one value per variable and month
pub struct SpatialAggregator {
    bbox: BoundingBox,
}

impl SpatialAggregator {
    /// Returns a new aggregator for the given region
    ///
    /// # Arguments
    ///
    /// * 'bbox' - the inclusive bounding box cells must fall within
    pub fn new(bbox: BoundingBox) -> SpatialAggregator {
        SpatialAggregator { bbox }
    }

    /// Aggregates observations into a monthly series.
    ///
    /// Observations without date, or without any cell inside the bounding box, are dropped.
    /// Each variable is reduced to the NaN-ignoring mean of the selected cells and converted
    /// to pipeline units. Rows are then sorted, de-duplicated and forward filled by
    /// `MonthlySeries::new`. Zero matching observations give an empty series.
    ///
    /// # Arguments
    ///
    /// * 'observations' - raw observations in any order
    pub fn aggregate(&self, observations: &[GridObservation]) -> MonthlySeries {
        let mut rows: Vec<MonthlyRow> = Vec::with_capacity(observations.len());

        for obs in observations {
            let Some(date) = obs.date else {
                debug!("dropping observation without date");
                continue;
            };

            let lat_idx = select(&obs.lat, self.bbox.lat_min, self.bbox.lat_max);
            let lon_idx = select(&obs.lon, self.bbox.lon_min, self.bbox.lon_max);
            if lat_idx.is_empty() || lon_idx.is_empty() {
                debug!("dropping observation {}: no cells within bounding box", date);
                continue;
            }

            let mut values: BTreeMap<Variable, f64> = BTreeMap::new();
            for (variable, grid) in &obs.fields {
                if let Some(m) = cell_mean(grid, &lat_idx, &lon_idx) {
                    values.insert(*variable, variable.from_source_units(m));
                }
            }

            rows.push(MonthlyRow::new(date, values));
        }

        let series = MonthlySeries::new(rows);
        info!("aggregated {} observations into {} months", observations.len(), series.len());

        series
    }
}

/// Returns indices of coordinates within the inclusive range
///
/// # Arguments
///
/// * 'coords' - coordinate axis
/// * 'min' - lower bound
/// * 'max' - upper bound
fn select(coords: &[f64], min: f64, max: f64) -> Vec<usize> {
    coords
        .iter()
        .enumerate()
        .filter(|(_, c)| **c >= min && **c <= max)
        .map(|(i, _)| i)
        .collect()
}

/// Mean over the selected cells, ignoring NaN and cells outside a ragged grid
///
/// # Arguments
///
/// * 'grid' - the variable grid indexed [lat][lon]
/// * 'lat_idx' - selected latitude indices
/// * 'lon_idx' - selected longitude indices
fn cell_mean(grid: &[Vec<f64>], lat_idx: &[usize], lon_idx: &[usize]) -> Option<f64> {
    let cells = lat_idx
        .iter()
        .filter_map(|&i| grid.get(i))
        .flat_map(|row| lon_idx.iter().filter_map(move |&j| row.get(j).copied()))
        .filter(|v| !v.is_nan());

    mean(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bbox() -> BoundingBox {
        BoundingBox { lat_min: 50.0, lat_max: 50.5, lon_min: 30.0, lon_max: 30.5 }
    }

    fn obs(date: Option<(i32, u32)>, fields: &[(Variable, Vec<Vec<f64>>)]) -> GridObservation {
        GridObservation {
            date: date.map(|(y, m)| NaiveDate::from_ymd_opt(y, m, 1).unwrap()),
            lat: vec![49.75, 50.0, 50.25, 50.75],
            lon: vec![30.0, 30.25, 31.0],
            fields: fields.iter().cloned().collect(),
        }
    }

    fn uniform(v: f64) -> Vec<Vec<f64>> {
        vec![vec![v; 3]; 4]
    }

    #[test]
    fn test_mean_of_cells_inside_box_ignoring_nan() {
        let grid = vec![
            vec![100.0, 100.0, 100.0],
            vec![2.0, f64::NAN, 100.0],
            vec![4.0, 6.0, 100.0],
            vec![100.0, 100.0, 100.0],
        ];
        let series = SpatialAggregator::new(bbox()).aggregate(&[obs(Some((2020, 1)), &[(Variable::WindSpeed, grid)])]);

        assert_eq!(series.len(), 1);
        assert!((series.rows()[0].get(Variable::WindSpeed).unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_unit_conversions_applied() {
        let series = SpatialAggregator::new(bbox()).aggregate(&[obs(Some((2020, 1)), &[
            (Variable::Temperature, uniform(293.15)),
            (Variable::Precipitation, uniform(0.00002)),
            (Variable::Humidity, uniform(0.6)),
            (Variable::Pressure, uniform(100000.0)),
            (Variable::SnowWater, uniform(12.5)),
        ])]);

        let row = &series.rows()[0];
        assert!((row.get(Variable::Temperature).unwrap() - 20.0).abs() < 1e-9);
        assert!((row.get(Variable::Precipitation).unwrap() - 1.728).abs() < 1e-9);
        assert!((row.get(Variable::Humidity).unwrap() - 60.0).abs() < 1e-9);
        assert!((row.get(Variable::Pressure).unwrap() - 1000.0).abs() < 1e-9);
        assert_eq!(row.get(Variable::SnowWater), Some(12.5));
    }

    #[test]
    fn test_undated_and_outside_observations_dropped() {
        let mut outside = obs(Some((2020, 2)), &[(Variable::WindSpeed, uniform(3.0))]);
        outside.lon = vec![10.0, 11.0, 12.0];

        let series = SpatialAggregator::new(bbox()).aggregate(&[
            obs(None, &[(Variable::WindSpeed, uniform(3.0))]),
            outside,
        ]);

        assert!(series.is_empty());
    }

    #[test]
    fn test_duplicate_months_and_forward_fill() {
        let series = SpatialAggregator::new(bbox()).aggregate(&[
            obs(Some((2020, 2)), &[(Variable::WindSpeed, uniform(5.0))]),
            obs(Some((2020, 1)), &[(Variable::WindSpeed, uniform(3.0)), (Variable::SnowWater, uniform(1.0))]),
            obs(Some((2020, 2)), &[(Variable::WindSpeed, uniform(6.0))]),
            obs(Some((2020, 3)), &[(Variable::WindSpeed, uniform(f64::NAN))]),
        ]);

        assert_eq!(series.len(), 3);
        assert_eq!(series.rows()[1].get(Variable::WindSpeed), Some(6.0));
        assert_eq!(series.rows()[1].get(Variable::SnowWater), Some(1.0));
        assert_eq!(series.rows()[2].get(Variable::WindSpeed), Some(6.0));
    }
}
