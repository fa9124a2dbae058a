use std::collections::BTreeMap;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde::de::Error;
use serde_json::Value;
use crate::models::variable::Variable;

/// One raw grid record for one time slice.
///
/// Grids are indexed `[lat][lon]` and hold values in source units. Cells without data are
/// carried as NaN.
#[derive(Deserialize, Debug, Clone)]
pub struct GridObservation {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(alias = "latitude")]
    pub lat: Vec<f64>,
    #[serde(alias = "longitude")]
    pub lon: Vec<f64>,
    #[serde(deserialize_with = "deserialize_grids")]
    pub fields: BTreeMap<Variable, Vec<Vec<f64>>>,
}

/// Deserializes variable grids where cells may be numbers, numeric strings or null
fn deserialize_grids<'de, D>(deserializer: D) -> Result<BTreeMap<Variable, Vec<Vec<f64>>>, D::Error>
where D: Deserializer<'de> {

    let raw: BTreeMap<Variable, Vec<Vec<Value>>> = BTreeMap::deserialize(deserializer)?;

    let mut grids = BTreeMap::new();
    for (variable, rows) in raw {
        let mut grid: Vec<Vec<f64>> = Vec::with_capacity(rows.len());
        for row in rows {
            let cells = row.iter()
                .map(cell_value)
                .collect::<Result<Vec<f64>, String>>()
                .map_err(|e| D::Error::custom(format!("{}: {}", variable, e)))?;
            grid.push(cells);
        }
        grids.insert(variable, grid);
    }

    Ok(grids)
}

/// Reads one grid cell, null becomes NaN
///
/// # Arguments
///
/// * 'v' - the json value of the cell
fn cell_value(v: &Value) -> Result<f64, String> {
    match v {
        Value::Null => Ok(f64::NAN),
        Value::Number(n) => n.as_f64().ok_or_else(|| "non-f64 cell".to_string()),
        Value::String(s) => s.parse::<f64>().map_err(|_| format!("non-numeric cell '{}'", s)),
        _ => Err("unexpected cell type".to_string()),
    }
}
