use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use crate::comfort::ComfortAssessment;
use crate::errors::PipelineError;
use crate::models::forecast::ForecastMap;
use crate::risk::RiskFlag;

/// Format of `created_at` in flat rows
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything produced for one region and target date
#[derive(Serialize, Debug, Clone)]
pub struct ForecastRecord {
    pub region: String,
    pub target_date: NaiveDate,
    pub forecasts: ForecastMap,
    pub comfort: ComfortAssessment,
    pub risks: Vec<RiskFlag>,
    pub created_at: DateTime<Local>,
}

impl ForecastRecord {
    /// Assembles a record, an empty forecast map is an error
    ///
    /// # Arguments
    ///
    /// * 'region' - region name
    /// * 'target_date' - the requested date
    /// * 'forecasts' - forecast points per variable
    /// * 'comfort' - comfort assessment of the forecasts
    /// * 'risks' - raised risk flags
    /// * 'created_at' - creation timestamp
    pub fn assemble(region: &str, target_date: NaiveDate, forecasts: ForecastMap, comfort: ComfortAssessment,
                    risks: Vec<RiskFlag>, created_at: DateTime<Local>) -> Result<ForecastRecord, PipelineError> {
        if forecasts.is_empty() {
            return Err(PipelineError::NoForecastsProduced(Vec::new()));
        }

        Ok(ForecastRecord {
            region: region.to_string(),
            target_date,
            forecasts,
            comfort,
            risks,
            created_at,
        })
    }

    /// Returns the record as (column, value) pairs. Forecast columns come in the canonical
    /// variable order, followed by score, description, region, target date and creation time.
    pub fn flat_row(&self) -> Vec<(String, String)> {
        let mut row: Vec<(String, String)> = Vec::new();

        for (variable, point) in &self.forecasts {
            row.push((variable.to_string(), point.value.to_string()));
            row.push((format!("{}_lower", variable), point.lower.to_string()));
            row.push((format!("{}_upper", variable), point.upper.to_string()));
        }

        row.push(("wscore".to_string(), self.comfort.score.to_string()));
        row.push(("comfort_description".to_string(), self.comfort.description.clone()));
        row.push(("region".to_string(), self.region.clone()));
        row.push(("target_date".to_string(), self.target_date.format("%Y-%m-%d").to_string()));
        row.push(("created_at".to_string(), self.created_at.format(CREATED_AT_FORMAT).to_string()));

        row
    }
}
