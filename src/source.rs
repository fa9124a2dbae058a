use std::fs;
use std::path::{Path, PathBuf};
use chrono::NaiveDate;
use glob::{glob, Pattern};
use log::{debug, info};
use serde_json::Value;
use crate::errors::SourceError;
use crate::models::grid::GridObservation;

/// Anything able to hand over raw grid observations
pub trait ObservationSource {
    fn observations(&self) -> Result<Vec<GridObservation>, SourceError>;
}

/// Reads observations from the json documents of a directory. A document holds either one
/// observation or an array of them.
pub struct JsonDirectorySource {
    dir: PathBuf,
    start: NaiveDate,
    end: NaiveDate,
}

impl JsonDirectorySource {
    /// Returns a new source
    ///
    /// # Arguments
    ///
    /// * 'dir' - directory holding the json documents
    /// * 'start' - first date to include
    /// * 'end' - last date to include
    pub fn new(dir: &Path, start: NaiveDate, end: NaiveDate) -> JsonDirectorySource {
        JsonDirectorySource { dir: dir.to_path_buf(), start, end }
    }

    /// Reads all observations of one document
    ///
    /// # Arguments
    ///
    /// * 'path' - the json document
    fn read_document(path: &Path) -> Result<Vec<GridObservation>, SourceError> {
        let json = fs::read_to_string(path)?;
        let document: Value = serde_json::from_str(&json)?;

        let observations = match document {
            Value::Array(_) => serde_json::from_value::<Vec<GridObservation>>(document)?,
            _ => vec![serde_json::from_value::<GridObservation>(document)?],
        };

        debug!("read {} observations from {:?}", observations.len(), path);

        Ok(observations)
    }
}

impl ObservationSource for JsonDirectorySource {
    /// Returns observations dated within [start, end]. Undated observations are passed on.
    fn observations(&self) -> Result<Vec<GridObservation>, SourceError> {
        let pattern = format!("{}/*.json", Pattern::escape(&self.dir.to_string_lossy()));

        let mut observations: Vec<GridObservation> = Vec::new();
        for entry in glob(&pattern)? {
            let path = entry?;
            observations.extend(
                JsonDirectorySource::read_document(&path)?
                    .into_iter()
                    .filter(|o| o.date.is_none_or(|d| d >= self.start && d <= self.end))
            );
        }

        info!("{} observations read from {:?}", observations.len(), self.dir);

        Ok(observations)
    }
}
