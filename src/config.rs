use std::fs;
use chrono::NaiveDate;
use log::LevelFilter;
use serde::Deserialize;
use crate::aggregation::BoundingBox;
use crate::errors::ConfigError;
use crate::models::variable::Variable;

#[derive(Deserialize, Debug, Clone)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Region {
    pub name: String,
    pub lat: (f64, f64),
    pub lon: (f64, f64),
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub target_date: NaiveDate,
}

impl Region {
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox { lat_min: self.lat.0, lat_max: self.lat.1, lon_min: self.lon.0, lon_max: self.lon.1 }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Files {
    pub observations_dir: String,
    pub records_dir: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ForecastParameters {
    pub min_data_points: usize,
    pub interval_width: f64,
    pub yearly_fourier_order: usize,
    pub variables: Vec<Variable>,
    pub regressors: Vec<Variable>,
}

impl Default for ForecastParameters {
    fn default() -> Self {
        ForecastParameters {
            min_data_points: 12,
            interval_width: 0.8,
            yearly_fourier_order: 3,
            variables: Variable::ALL.to_vec(),
            regressors: vec![Variable::Temperature, Variable::Humidity, Variable::Pressure, Variable::WindSpeed],
        }
    }
}

/// A severity ladder: crossing the n:th threshold gives tier `first_tier + n`
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Ladder {
    pub first_tier: u8,
    pub thresholds: Vec<f64>,
}

impl Ladder {
    fn new(first_tier: u8, thresholds: &[f64]) -> Ladder {
        Ladder { first_tier, thresholds: thresholds.to_vec() }
    }
}

/// Values assumed for dimensions without forecast
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct NeutralValues {
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub precipitation: f64,
    pub snow_water: f64,
}

impl Default for NeutralValues {
    fn default() -> Self {
        NeutralValues { temperature: 20.0, humidity: 50.0, wind_speed: 3.0, precipitation: 0.0, snow_water: 0.0 }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Callouts {
    pub very_hot: f64,
    pub hot: f64,
    pub very_cold: f64,
    pub cold: f64,
    pub very_windy: f64,
    pub windy: f64,
}

impl Default for Callouts {
    fn default() -> Self {
        Callouts { very_hot: 35.0, hot: 30.0, very_cold: -10.0, cold: -5.0, very_windy: 15.0, windy: 10.0 }
    }
}

/// Comfort tiers. `cold` and `dry` trigger below their thresholds, all others above.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ComfortThresholds {
    pub neutral: NeutralValues,
    pub cold: Ladder,
    pub heat: Ladder,
    pub humid: Ladder,
    pub dry: Ladder,
    pub wind: Ladder,
    pub precipitation: Ladder,
    pub snow_water: Ladder,
    pub callouts: Callouts,
}

impl Default for ComfortThresholds {
    fn default() -> Self {
        ComfortThresholds {
            neutral: NeutralValues::default(),
            cold: Ladder::new(2, &[10.0, 0.0, -5.0, -10.0]),
            heat: Ladder::new(2, &[24.0, 25.0, 30.0, 35.0]),
            humid: Ladder::new(3, &[70.0, 85.0]),
            dry: Ladder::new(3, &[20.0]),
            wind: Ladder::new(3, &[7.0, 10.0, 15.0]),
            precipitation: Ladder::new(3, &[50.0, 100.0, 200.0]),
            snow_water: Ladder::new(3, &[50.0, 100.0, 200.0]),
            callouts: Callouts::default(),
        }
    }
}

/// Moderate and high levels of a hazard, in the direction the hazard grows
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct Band {
    pub moderate: f64,
    pub high: f64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DroughtThresholds {
    pub forecast_below: f64,
    pub history_below: f64,
    pub history_months: usize,
    pub deficit_below: f64,
}

impl Default for DroughtThresholds {
    fn default() -> Self {
        DroughtThresholds { forecast_below: 20.0, history_below: 30.0, history_months: 6, deficit_below: 40.0 }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RiskThresholds {
    pub flood: Band,
    pub drought: DroughtThresholds,
    pub frost: Band,
    pub heat: Band,
    pub snow: Band,
    pub wind: Band,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        RiskThresholds {
            flood: Band { moderate: 150.0, high: 300.0 },
            drought: DroughtThresholds::default(),
            frost: Band { moderate: -5.0, high: -15.0 },
            heat: Band { moderate: 30.0, high: 35.0 },
            snow: Band { moderate: 200.0, high: 500.0 },
            wind: Band { moderate: 15.0, high: 20.0 },
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub general: General,
    pub region: Region,
    pub files: Files,
    #[serde(default)]
    pub forecast: ForecastParameters,
    #[serde(default)]
    pub comfort: ComfortThresholds,
    #[serde(default)]
    pub risk: RiskThresholds,
}

/// Loads the configuration file and returns a struct with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {

    let toml = fs::read_to_string(config_path)?;
    let config: Config = toml::from_str(&toml)?;

    validate(&config)?;

    Ok(config)
}

/// Checks ranges and orderings that serde can't express
///
/// # Arguments
///
/// * 'config' - the configuration to check
fn validate(config: &Config) -> Result<(), ConfigError> {
    let region = &config.region;
    if region.lat.0 > region.lat.1 || region.lon.0 > region.lon.1 {
        return Err(ConfigError::from("bounding box min must not exceed max"));
    }
    if region.start > region.end {
        return Err(ConfigError::from("region start date is after end date"));
    }

    let forecast = &config.forecast;
    if forecast.min_data_points == 0 {
        return Err(ConfigError::from("min_data_points must be at least 1"));
    }
    if !(forecast.interval_width > 0.0 && forecast.interval_width < 1.0) {
        return Err(ConfigError::from("interval_width must be within (0, 1)"));
    }
    if forecast.variables.is_empty() {
        return Err(ConfigError::from("no variables to forecast"));
    }

    let comfort = &config.comfort;
    for (name, ladder) in [("heat", &comfort.heat), ("humid", &comfort.humid), ("wind", &comfort.wind),
                           ("precipitation", &comfort.precipitation), ("snow_water", &comfort.snow_water)] {
        check_ladder(name, ladder, |a, b| a < b)?;
    }
    for (name, ladder) in [("cold", &comfort.cold), ("dry", &comfort.dry)] {
        check_ladder(name, ladder, |a, b| a > b)?;
    }

    let risk = &config.risk;
    for (name, band) in [("flood", risk.flood), ("heat", risk.heat), ("snow", risk.snow), ("wind", risk.wind)] {
        if band.high < band.moderate {
            return Err(ConfigError(format!("risk band {} has high below moderate", name)));
        }
    }
    if risk.frost.high > risk.frost.moderate {
        return Err(ConfigError::from("risk band frost has high above moderate"));
    }

    Ok(())
}

/// Checks that a ladder stays within tiers 2..=5 and is strictly ordered
///
/// # Arguments
///
/// * 'name' - ladder name for error messages
/// * 'ladder' - the ladder to check
/// * 'ordered' - true if two consecutive thresholds are in the right order
fn check_ladder(name: &str, ladder: &Ladder, ordered: impl Fn(f64, f64) -> bool) -> Result<(), ConfigError> {
    let top = ladder.first_tier as usize + ladder.thresholds.len();
    if ladder.first_tier < 2 || ladder.thresholds.is_empty() || top > 6 {
        return Err(ConfigError(format!("comfort ladder {} must map into tiers 2 to 5", name)));
    }
    if !ladder.thresholds.windows(2).all(|w| ordered(w[0], w[1])) {
        return Err(ConfigError(format!("comfort ladder {} thresholds are out of order", name)));
    }
    Ok(())
}
