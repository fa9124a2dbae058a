use chrono::{Local, NaiveDate};
use log::{info, warn};
use rayon::prelude::*;
use crate::aggregation::{BoundingBox, SpatialAggregator};
use crate::comfort::ComfortScorer;
use crate::config::{ComfortThresholds, Config, ForecastParameters, RiskThresholds};
use crate::errors::{ForecastError, PipelineError};
use crate::forecast_engine::ForecastEngine;
use crate::models::forecast::{ForecastMap, ForecastPoint};
use crate::models::grid::GridObservation;
use crate::models::record::ForecastRecord;
use crate::models::series::MonthlySeries;
use crate::models::variable::Variable;
use crate::risk::RiskAnalyzer;
use crate::target;

/// Result of a successful run, with the reasons for every variable left out
#[derive(Debug)]
pub struct PipelineOutcome {
    pub record: ForecastRecord,
    pub skipped: Vec<ForecastError>,
}

/// Runs forecasting, target extraction, comfort scoring and risk analysis for one region
pub struct Pipeline {
    forecast: ForecastParameters,
    comfort: ComfortThresholds,
    risk: RiskThresholds,
}

impl Pipeline {
    /// Returns a pipeline configured from the forecast, comfort and risk sections
    ///
    /// # Arguments
    ///
    /// * 'config' - the loaded configuration
    pub fn new(config: &Config) -> Pipeline {
        Pipeline::with_parameters(config.forecast.clone(), config.comfort.clone(), config.risk.clone())
    }

    /// Returns a pipeline from explicit parameters
    ///
    /// # Arguments
    ///
    /// * 'forecast' - forecast parameters
    /// * 'comfort' - comfort thresholds
    /// * 'risk' - risk thresholds
    pub fn with_parameters(forecast: ForecastParameters, comfort: ComfortThresholds, risk: RiskThresholds) -> Pipeline {
        Pipeline { forecast, comfort, risk }
    }

    /// Aggregates raw observations and runs the pipeline on the resulting series
    ///
    /// # Arguments
    ///
    /// * 'observations' - raw grid observations
    /// * 'bbox' - the region's bounding box
    /// * 'region' - region name
    /// * 'target_date' - the requested date
    pub fn run_observations(&self, observations: &[GridObservation], bbox: BoundingBox, region: &str, target_date: NaiveDate) -> Result<PipelineOutcome, PipelineError> {
        let series = SpatialAggregator::new(bbox).aggregate(observations);
        self.run(&series, region, target_date)
    }

    /// Forecasts every configured variable for the target date, then scores comfort and
    /// analyzes risks on the forecasts produced.
    ///
    /// A variable that can't be forecast is logged and left out. The run fails only if the
    /// series is too short or no variable at all could be forecast.
    ///
    /// # Arguments
    ///
    /// * 'series' - aggregated monthly history
    /// * 'region' - region name
    /// * 'target_date' - the requested date
    pub fn run(&self, series: &MonthlySeries, region: &str, target_date: NaiveDate) -> Result<PipelineOutcome, PipelineError> {
        let required = self.forecast.min_data_points;
        let last_month = match series.last_month() {
            Some(last) if series.len() >= required => last,
            _ => return Err(PipelineError::InsufficientHistory { found: series.len(), required }),
        };

        let horizon = target::horizon_months(last_month, target_date);
        info!("forecasting {} for {} ({} months past {})", region, target_date, horizon, last_month);

        let engine = ForecastEngine::new(&self.forecast);
        let results: Vec<Result<ForecastPoint, ForecastError>> = self.forecast.variables
            .par_iter()
            .map(|variable| forecast_variable(&engine, series, *variable, last_month, target_date, horizon))
            .collect();

        let mut forecasts = ForecastMap::new();
        let mut skipped: Vec<ForecastError> = Vec::new();
        for result in results {
            match result {
                Ok(point) => { forecasts.insert(point.variable, point); },
                Err(e) => {
                    warn!("variable skipped: {}", e);
                    skipped.push(e);
                },
            }
        }

        if forecasts.is_empty() {
            return Err(PipelineError::NoForecastsProduced(skipped));
        }

        let scorer = ComfortScorer::new(self.comfort.clone());
        let analyzer = RiskAnalyzer::new(self.risk.clone());
        let (comfort, risks) = rayon::join(
            || scorer.assess(&forecasts),
            || analyzer.analyze(&forecasts, series),
        );
        info!("WScore {} ({}), {} risk flags", comfort.score, comfort.description, risks.len());

        let record = ForecastRecord::assemble(region, target_date, forecasts, comfort, risks, Local::now())?;

        Ok(PipelineOutcome { record, skipped })
    }
}

/// Fits, projects and extracts the target month for one variable
///
/// # Arguments
///
/// * 'engine' - the forecast engine
/// * 'series' - aggregated monthly history
/// * 'variable' - the variable to forecast
/// * 'last_month' - last month of the history
/// * 'target_date' - the requested date
/// * 'horizon' - months from the last month to the target
fn forecast_variable(engine: &ForecastEngine, series: &MonthlySeries, variable: Variable,
                     last_month: NaiveDate, target_date: NaiveDate, horizon: i32) -> Result<ForecastPoint, ForecastError> {
    let projected = engine.forecast(series, variable, horizon.max(0) as u32)?;
    target::extract(&projected, last_month, target_date)
}
