use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// Seconds in a day, used to turn a precipitation flux into a daily depth
const SECONDS_PER_DAY: f64 = 86400.0;

/// Offset between Kelvin and Celsius
const KELVIN_OFFSET: f64 = 273.15;

/// The closed set of climate variables handled by the pipeline.
///
/// The serde aliases accept the field names used by the gridded land data
/// assimilation products the observations are decoded from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    #[serde(alias = "Tair_f_inst")]
    Temperature,
    #[serde(alias = "Rainf_f_tavg")]
    Precipitation,
    #[serde(alias = "Wind_f_inst")]
    WindSpeed,
    #[serde(alias = "Qair_f_inst")]
    Humidity,
    #[serde(alias = "SWE_inst")]
    SnowWater,
    #[serde(alias = "Psurf_f_inst")]
    Pressure,
}

impl Variable {
    /// All variables in canonical output order
    pub const ALL: [Variable; 6] = [
        Variable::Temperature,
        Variable::Precipitation,
        Variable::WindSpeed,
        Variable::Humidity,
        Variable::SnowWater,
        Variable::Pressure,
    ];

    /// Returns the snake case name used in records and configuration
    pub fn name(&self) -> &'static str {
        match self {
            Variable::Temperature => "temperature",
            Variable::Precipitation => "precipitation",
            Variable::WindSpeed => "wind_speed",
            Variable::Humidity => "humidity",
            Variable::SnowWater => "snow_water",
            Variable::Pressure => "pressure",
        }
    }

    /// Returns the unit of the variable after aggregation
    pub fn unit(&self) -> &'static str {
        match self {
            Variable::Temperature => "°C",
            Variable::Precipitation => "mm/day",
            Variable::WindSpeed => "m/s",
            Variable::Humidity => "%",
            Variable::SnowWater => "kg/m²",
            Variable::Pressure => "hPa",
        }
    }

    /// Converts a value in source units to the unit the pipeline works in
    ///
    /// # Arguments
    ///
    /// * 'raw' - the value as found in the source grid
    pub fn from_source_units(&self, raw: f64) -> f64 {
        match self {
            Variable::Precipitation => raw * SECONDS_PER_DAY,
            Variable::Temperature => raw - KELVIN_OFFSET,
            Variable::Humidity => raw * 100.0,
            Variable::Pressure => raw / 100.0,
            Variable::WindSpeed | Variable::SnowWater => raw,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Variable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::ALL
            .iter()
            .find(|v| v.name() == s)
            .copied()
            .ok_or_else(|| format!("unknown variable: {}", s))
    }
}
