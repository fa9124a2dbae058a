use std::fmt;
use log::debug;
use serde::Serialize;
use crate::config::{Band, RiskThresholds};
use crate::models::forecast::ForecastMap;
use crate::models::series::MonthlySeries;
use crate::models::variable::Variable;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Hazard {
    Flood,
    Drought,
    Frost,
    Heat,
    Snow,
    Wind,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Moderate,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Moderate => "moderate",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RiskFlag {
    pub hazard: Hazard,
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl RiskFlag {
    fn new(hazard: Hazard, severity: Severity, title: &str, message: &str) -> RiskFlag {
        RiskFlag { hazard, severity, title: title.to_string(), message: message.to_string() }
    }
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.title, self.message)
    }
}

/// Flags hazardous weather in a forecast
pub struct RiskAnalyzer {
    thresholds: RiskThresholds,
}

impl RiskAnalyzer {
    /// Returns a new analyzer
    ///
    /// # Arguments
    ///
    /// * 'thresholds' - hazard levels
    pub fn new(thresholds: RiskThresholds) -> RiskAnalyzer {
        RiskAnalyzer { thresholds }
    }

    /// Returns at most one flag per hazard, in the order flood, drought, frost, heat, snow
    /// and wind. A hazard is only evaluated if its variable has a forecast. An empty list
    /// means no significant risk.
    ///
    /// # Arguments
    ///
    /// * 'forecasts' - forecast points per variable
    /// * 'history' - the historical series, used for the drought condition
    pub fn analyze(&self, forecasts: &ForecastMap, history: &MonthlySeries) -> Vec<RiskFlag> {
        let t = &self.thresholds;
        let value = |v: Variable| forecasts.get(&v).map(|p| p.value);
        let mut flags: Vec<RiskFlag> = Vec::new();

        if let Some(precipitation) = value(Variable::Precipitation) {
            flags.extend(rising(t.flood, precipitation, Hazard::Flood,
                ("HIGH FLOOD RISK", "Extreme monthly precipitation - high flood probability"),
                ("MODERATE FLOOD RISK", "High monthly precipitation - possible local floods")));
            flags.extend(self.drought(precipitation, history));
        }

        if let Some(temperature) = value(Variable::Temperature) {
            flags.extend(falling(t.frost, temperature, Hazard::Frost,
                ("EXTREME FROST", "Dangerously low temperature - infrastructure risk"),
                ("STRONG FROST", "Low temperature - agriculture risk")));
            flags.extend(rising(t.heat, temperature, Hazard::Heat,
                ("EXTREME HEAT", "Dangerously high temperature - health risk"),
                ("HEAT", "High temperature - risk of overheating")));
        }

        if let Some(snow_water) = value(Variable::SnowWater) {
            flags.extend(rising(t.snow, snow_water, Hazard::Snow,
                ("EXTREME SNOWFALL", "Massive snow cover - transportation disruptions"),
                ("HEAVY SNOWFALL", "Significant snowfall - possible complications")));
        }

        if let Some(wind_speed) = value(Variable::WindSpeed) {
            flags.extend(rising(t.wind, wind_speed, Hazard::Wind,
                ("HURRICANE WINDS", "Extremely strong wind - dangerous!"),
                ("STRONG WIND", "Powerful wind gusts - be careful!")));
        }

        debug!("{} risk flags raised", flags.len());

        flags
    }

    /// Drought needs both a dry forecast and a dry recent history, a dry forecast alone
    /// is only a deficit. Without precipitation history the historical condition is not met.
    ///
    /// # Arguments
    ///
    /// * 'precipitation' - forecast precipitation
    /// * 'history' - the historical series
    fn drought(&self, precipitation: f64, history: &MonthlySeries) -> Option<RiskFlag> {
        let d = &self.thresholds.drought;
        let dry_history = history
            .trailing_mean(Variable::Precipitation, d.history_months)
            .is_some_and(|m| m < d.history_below);

        if precipitation < d.forecast_below && dry_history {
            Some(RiskFlag::new(Hazard::Drought, Severity::High,
                "DROUGHT RISK", "Long-term lack of precipitation - critically low levels"))
        } else if precipitation < d.deficit_below {
            Some(RiskFlag::new(Hazard::Drought, Severity::Moderate,
                "PRECIPITATION DEFICIT", "Low precipitation - possible water supply issues"))
        } else {
            None
        }
    }
}

/// Flag for a hazard that grows with the value
fn rising(band: Band, value: f64, hazard: Hazard, high: (&str, &str), moderate: (&str, &str)) -> Option<RiskFlag> {
    if value > band.high {
        Some(RiskFlag::new(hazard, Severity::High, high.0, high.1))
    } else if value > band.moderate {
        Some(RiskFlag::new(hazard, Severity::Moderate, moderate.0, moderate.1))
    } else {
        None
    }
}

/// Flag for a hazard that grows as the value falls
fn falling(band: Band, value: f64, hazard: Hazard, high: (&str, &str), moderate: (&str, &str)) -> Option<RiskFlag> {
    if value < band.high {
        Some(RiskFlag::new(hazard, Severity::High, high.0, high.1))
    } else if value < band.moderate {
        Some(RiskFlag::new(hazard, Severity::Moderate, moderate.0, moderate.1))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use chrono::NaiveDate;
    use crate::models::forecast::ForecastPoint;
    use crate::models::series::MonthlyRow;

    fn forecasts(values: &[(Variable, f64)]) -> ForecastMap {
        values.iter()
            .map(|(v, x)| (*v, ForecastPoint { variable: *v, value: *x, lower: *x, upper: *x }))
            .collect()
    }

    fn precipitation_history(values: &[f64]) -> MonthlySeries {
        MonthlySeries::new(values.iter().enumerate().map(|(i, v)| {
            let month = NaiveDate::from_ymd_opt(2023, i as u32 + 1, 1).unwrap();
            MonthlyRow::new(month, BTreeMap::from([(Variable::Precipitation, *v)]))
        }).collect())
    }

    fn analyzer() -> RiskAnalyzer {
        RiskAnalyzer::new(RiskThresholds::default())
    }

    #[test]
    fn test_drought_needs_dry_history() {
        let dry = precipitation_history(&[80.0, 25.0, 25.0, 25.0, 25.0, 25.0, 25.0]);
        let flags = analyzer().analyze(&forecasts(&[(Variable::Precipitation, 15.0)]), &dry);

        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].hazard, Hazard::Drought);
        assert_eq!(flags[0].severity, Severity::High);
        assert_eq!(flags[0].title, "DROUGHT RISK");
    }

    #[test]
    fn test_precipitation_deficit() {
        let wet = precipitation_history(&[60.0; 6]);
        let flags = analyzer().analyze(&forecasts(&[(Variable::Precipitation, 35.0)]), &wet);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].severity, Severity::Moderate);
        assert_eq!(flags[0].title, "PRECIPITATION DEFICIT");

        let flags = analyzer().analyze(&forecasts(&[(Variable::Precipitation, 15.0)]), &wet);
        assert_eq!(flags[0].title, "PRECIPITATION DEFICIT");

        let flags = analyzer().analyze(&forecasts(&[(Variable::Precipitation, 15.0)]), &MonthlySeries::default());
        assert_eq!(flags[0].title, "PRECIPITATION DEFICIT");
    }

    #[test]
    fn test_absent_variables_raise_nothing() {
        let flags = analyzer().analyze(&forecasts(&[(Variable::Temperature, 22.0), (Variable::Humidity, 50.0)]), &MonthlySeries::default());
        assert!(flags.is_empty());
    }

    #[test]
    fn test_one_flag_per_hazard_in_order() {
        let flags = analyzer().analyze(&forecasts(&[
            (Variable::WindSpeed, 25.0),
            (Variable::SnowWater, 250.0),
            (Variable::Temperature, 36.0),
            (Variable::Precipitation, 400.0),
        ]), &MonthlySeries::default());

        let summary: Vec<(Hazard, Severity)> = flags.iter().map(|f| (f.hazard, f.severity)).collect();
        assert_eq!(summary, vec![
            (Hazard::Flood, Severity::High),
            (Hazard::Heat, Severity::High),
            (Hazard::Snow, Severity::Moderate),
            (Hazard::Wind, Severity::High),
        ]);
        assert_eq!(flags[3].to_string(), "[high] HURRICANE WINDS: Extremely strong wind - dangerous!");
    }

    #[test]
    fn test_frost_bands() {
        let strong = analyzer().analyze(&forecasts(&[(Variable::Temperature, -8.0)]), &MonthlySeries::default());
        assert_eq!(strong[0].title, "STRONG FROST");

        let extreme = analyzer().analyze(&forecasts(&[(Variable::Temperature, -20.0)]), &MonthlySeries::default());
        assert_eq!(extreme.len(), 1);
        assert_eq!(extreme[0].title, "EXTREME FROST");
    }
}
