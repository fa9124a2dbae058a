use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use chrono::NaiveDate;
use glob::{glob, Pattern};
use log::{info, warn};
use crate::errors::RecordError;
use crate::models::record::ForecastRecord;
use crate::summary::{parse_summary, SummaryValue};

/// A forecast read back from disk or from a diagnostic summary
#[derive(Debug, Clone, PartialEq)]
pub struct StoredForecast {
    /// The record file, None when read from a summary
    pub path: Option<PathBuf>,
    pub values: BTreeMap<String, SummaryValue>,
}

impl StoredForecast {
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.values.get(key) {
            Some(SummaryValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(SummaryValue::Text(s)) => Some(s),
            _ => None,
        }
    }
}

/// Returns the record file name for a region and target date. Spaces in the region
/// become underscores and commas are removed.
///
/// # Arguments
///
/// * 'region' - region name
/// * 'target_date' - the requested date
pub fn record_file_name(region: &str, target_date: NaiveDate) -> String {
    let region = region.replace(' ', "_").replace(',', "");
    format!("forecast_{}_{}.csv", region, target_date.format("%Y-%m-%d"))
}

/// Saves a record as a header line and one data row
///
/// # Arguments
///
/// * 'records_dir' - directory to save to, created if missing
/// * 'record' - the record to save
pub fn save_record(records_dir: &Path, record: &ForecastRecord) -> Result<PathBuf, RecordError> {
    fs::create_dir_all(records_dir)?;
    let path = records_dir.join(record_file_name(&record.region, record.target_date));

    let row = record.flat_row();
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(row.iter().map(|(c, _)| c))?;
    writer.write_record(row.iter().map(|(_, v)| v))?;
    writer.flush()?;

    info!("forecast record saved to {:?}", path);

    Ok(path)
}

/// Loads the record for a region and target date. If there is none, the most recently
/// modified record in the directory is used instead.
///
/// # Arguments
///
/// * 'records_dir' - directory to look in
/// * 'region' - region name
/// * 'target_date' - the requested date
pub fn load_record(records_dir: &Path, region: &str, target_date: NaiveDate) -> Result<StoredForecast, RecordError> {
    let exact = records_dir.join(record_file_name(region, target_date));
    if exact.is_file() {
        return read_record(&exact);
    }

    let pattern = format!("{}/forecast_*.csv", Pattern::escape(&records_dir.to_string_lossy()));
    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for entry in glob(&pattern)? {
        let path = entry?;
        let modified = fs::metadata(&path)?.modified()?;
        if latest.as_ref().is_none_or(|(m, _)| modified > *m) {
            latest = Some((modified, path));
        }
    }

    match latest {
        Some((_, path)) => {
            warn!("no record for {} {}, using latest {:?}", region, target_date, path);
            read_record(&path)
        },
        None => Err(RecordError::NotFound { dir: records_dir.to_path_buf(), pattern }),
    }
}

/// Resolves a forecast from its record, falling back to a diagnostic summary
///
/// # Arguments
///
/// * 'records_dir' - directory to look in
/// * 'region' - region name
/// * 'target_date' - the requested date
/// * 'summary' - diagnostic summary text, if any
pub fn resolve_forecast(records_dir: &Path, region: &str, target_date: NaiveDate, summary: Option<&str>) -> Result<StoredForecast, RecordError> {
    match load_record(records_dir, region, target_date) {
        Ok(stored) => Ok(stored),
        Err(e) => {
            let values = summary.map(parse_summary).unwrap_or_default();
            if values.is_empty() {
                Err(e)
            } else {
                warn!("no usable record ({}), reading summary instead", e);
                Ok(StoredForecast { path: None, values })
            }
        },
    }
}

/// Reads the header and first data row of a record file
///
/// # Arguments
///
/// * 'path' - the record file
fn read_record(path: &Path) -> Result<StoredForecast, RecordError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let row = reader
        .records()
        .next()
        .ok_or_else(|| RecordError::Document(format!("{:?} has no data row", path)))??;

    let values = headers
        .iter()
        .zip(row.iter())
        .map(|(k, v)| (k.to_string(), SummaryValue::from_text(v)))
        .collect();

    Ok(StoredForecast { path: Some(path.to_path_buf()), values })
}
