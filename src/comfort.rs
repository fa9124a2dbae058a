use log::debug;
use serde::Serialize;
use crate::config::{ComfortThresholds, Ladder};
use crate::models::forecast::ForecastMap;
use crate::models::variable::Variable;

/// Lowest and highest WScore
const MIN_SCORE: u8 = 1;
const MAX_SCORE: u8 = 5;

/// Result of comfort scoring, `score` is within 1..=5
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ComfortAssessment {
    pub score: u8,
    pub description: String,
    pub conditions: Vec<String>,
    pub details: Vec<String>,
}

/// Maps a forecast to a 1 (most comfortable) to 5 (least comfortable) score
pub struct ComfortScorer {
    thresholds: ComfortThresholds,
}

impl ComfortScorer {
    /// Returns a new scorer
    ///
    /// # Arguments
    ///
    /// * 'thresholds' - comfort ladders, neutral values and call-out levels
    pub fn new(thresholds: ComfortThresholds) -> ComfortScorer {
        ComfortScorer { thresholds }
    }

    /// Scores the forecast. Dimensions without forecast take their neutral value.
    /// The score is the worst tier over all dimensions.
    ///
    /// # Arguments
    ///
    /// * 'forecasts' - forecast points per variable
    pub fn assess(&self, forecasts: &ForecastMap) -> ComfortAssessment {
        let t = &self.thresholds;
        let value = |v: Variable, neutral: f64| forecasts.get(&v).map_or(neutral, |p| p.value);

        let temperature = value(Variable::Temperature, t.neutral.temperature);
        let humidity = value(Variable::Humidity, t.neutral.humidity);
        let wind_speed = value(Variable::WindSpeed, t.neutral.wind_speed);
        let precipitation = value(Variable::Precipitation, t.neutral.precipitation);
        let snow_water = value(Variable::SnowWater, t.neutral.snow_water);

        let tiers = [
            ("cold", below(&t.cold, temperature)),
            ("heat", above(&t.heat, temperature)),
            ("humid", above(&t.humid, humidity)),
            ("dry", below(&t.dry, humidity)),
            ("wind", above(&t.wind, wind_speed)),
            ("precipitation", above(&t.precipitation, precipitation)),
            ("snow_water", above(&t.snow_water, snow_water)),
        ];
        debug!("comfort tiers: {:?}", tiers);

        let score = tiers
            .iter()
            .map(|(_, tier)| *tier)
            .max()
            .unwrap_or(MIN_SCORE)
            .clamp(MIN_SCORE, MAX_SCORE);

        ComfortAssessment {
            score,
            description: describe(score).to_string(),
            conditions: self.conditions(temperature, wind_speed),
            details: details(forecasts),
        }
    }

    /// Temperature and wind call-outs, these don't affect the score
    ///
    /// # Arguments
    ///
    /// * 'temperature' - temperature in °C
    /// * 'wind_speed' - wind speed in m/s
    fn conditions(&self, temperature: f64, wind_speed: f64) -> Vec<String> {
        let c = &self.thresholds.callouts;
        let mut conditions: Vec<String> = Vec::new();

        if temperature > c.very_hot {
            conditions.push("VERY HOT conditions".to_string());
        } else if temperature > c.hot {
            conditions.push("Hot conditions".to_string());
        } else if temperature < c.very_cold {
            conditions.push("VERY COLD conditions".to_string());
        } else if temperature < c.cold {
            conditions.push("Cold conditions".to_string());
        }

        if wind_speed > c.very_windy {
            conditions.push("VERY WINDY conditions".to_string());
        } else if wind_speed > c.windy {
            conditions.push("Windy conditions".to_string());
        }

        conditions
    }
}

/// Fixed description of a score
///
/// # Arguments
///
/// * 'score' - WScore in 1..=5
pub fn describe(score: u8) -> &'static str {
    match score {
        0 | 1 => "EXCELLENT - very comfortable conditions",
        2 => "GOOD - comfortable conditions",
        3 => "MODERATE - average comfort conditions",
        4 => "UNCOMFORTABLE - uncomfortable conditions",
        _ => "CRITICAL - very uncomfortable conditions",
    }
}

/// Tier for a ladder that grows with the value
fn above(ladder: &Ladder, value: f64) -> u8 {
    tier(ladder, ladder.thresholds.iter().filter(|t| value > **t).count())
}

/// Tier for a ladder that grows as the value falls
fn below(ladder: &Ladder, value: f64) -> u8 {
    tier(ladder, ladder.thresholds.iter().filter(|t| value < **t).count())
}

fn tier(ladder: &Ladder, crossed: usize) -> u8 {
    if crossed == 0 {
        MIN_SCORE
    } else {
        ladder.first_tier.saturating_add(crossed as u8 - 1)
    }
}

/// Human readable wording for forecast temperature and wind
///
/// # Arguments
///
/// * 'forecasts' - forecast points per variable
fn details(forecasts: &ForecastMap) -> Vec<String> {
    let mut details: Vec<String> = Vec::new();

    if let Some(p) = forecasts.get(&Variable::Temperature) {
        let wording = match p.value {
            v if v > 30.0 => "Hot (cooling needed)",
            v if v > 20.0 => "Comfortable",
            v if v > 10.0 => "Cool (light clothing)",
            v if v > 0.0 => "Cold (warm clothing)",
            _ => "Very cold (winter clothing)",
        };
        details.push(format!("Temperature: {}", wording));
    }

    if let Some(p) = forecasts.get(&Variable::WindSpeed) {
        let wording = match p.value {
            v if v > 15.0 => "Very strong (dangerous)",
            v if v > 10.0 => "Strong (hard to walk)",
            v if v > 5.0 => "Moderate (noticeable)",
            _ => "Light (comfortable)",
        };
        details.push(format!("Wind: {}", wording));
    }

    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::forecast::ForecastPoint;

    fn forecasts(values: &[(Variable, f64)]) -> ForecastMap {
        values.iter()
            .map(|(v, x)| (*v, ForecastPoint { variable: *v, value: *x, lower: x - 1.0, upper: x + 1.0 }))
            .collect()
    }

    fn scorer() -> ComfortScorer {
        ComfortScorer::new(ComfortThresholds::default())
    }

    #[test]
    fn test_neutral_scenario_is_excellent() {
        let a = scorer().assess(&forecasts(&[
            (Variable::Temperature, 22.0),
            (Variable::Humidity, 50.0),
            (Variable::WindSpeed, 3.0),
            (Variable::Precipitation, 0.0),
            (Variable::SnowWater, 0.0),
        ]));

        assert_eq!(a.score, 1);
        assert_eq!(a.description, "EXCELLENT - very comfortable conditions");
        assert!(a.conditions.is_empty());
        assert_eq!(a.details, vec!["Temperature: Comfortable", "Wind: Light (comfortable)"]);
    }

    #[test]
    fn test_empty_forecast_uses_neutral_values() {
        let a = scorer().assess(&ForecastMap::new());
        assert_eq!(a.score, 1);
        assert!(a.details.is_empty());
    }

    #[test]
    fn test_temperature_monotonic() {
        let mut last = 0;
        for t in 22..=36 {
            let score = scorer().assess(&forecasts(&[(Variable::Temperature, t as f64)])).score;
            assert!(score >= last, "score dropped at {}", t);
            last = score;
        }
        assert_eq!(last, 5);
    }

    #[test]
    fn test_each_dimension_monotonic() {
        let cases = [
            (Variable::Humidity, 50.0, 100.0),
            (Variable::WindSpeed, 3.0, 25.0),
            (Variable::Precipitation, 0.0, 300.0),
            (Variable::SnowWater, 0.0, 300.0),
        ];
        for (variable, from, to) in cases {
            let mut last = 0;
            let mut x = from;
            while x <= to {
                let score = scorer().assess(&forecasts(&[(variable, x)])).score;
                assert!(score >= last, "{} score dropped at {}", variable, x);
                last = score;
                x += 0.5;
            }
        }
    }

    #[test]
    fn test_ladder_tiers() {
        assert_eq!(scorer().assess(&forecasts(&[(Variable::Temperature, 5.0)])).score, 2);
        assert_eq!(scorer().assess(&forecasts(&[(Variable::Temperature, -12.0)])).score, 5);
        assert_eq!(scorer().assess(&forecasts(&[(Variable::Humidity, 90.0)])).score, 4);
        assert_eq!(scorer().assess(&forecasts(&[(Variable::Humidity, 15.0)])).score, 3);
        assert_eq!(scorer().assess(&forecasts(&[(Variable::WindSpeed, 12.0)])).score, 4);
        assert_eq!(scorer().assess(&forecasts(&[(Variable::Precipitation, 250.0)])).score, 5);
    }

    #[test]
    fn test_score_is_worst_dimension() {
        let a = scorer().assess(&forecasts(&[
            (Variable::Temperature, 26.0),
            (Variable::WindSpeed, 16.0),
        ]));

        assert_eq!(a.score, 5);
        assert_eq!(a.description, "CRITICAL - very uncomfortable conditions");
        assert_eq!(a.conditions, vec!["VERY WINDY conditions"]);
    }

    #[test]
    fn test_condition_callouts() {
        let hot = scorer().assess(&forecasts(&[(Variable::Temperature, 32.0), (Variable::WindSpeed, 11.0)]));
        assert_eq!(hot.conditions, vec!["Hot conditions", "Windy conditions"]);

        let cold = scorer().assess(&forecasts(&[(Variable::Temperature, -12.0)]));
        assert_eq!(cold.conditions, vec!["VERY COLD conditions"]);
        assert_eq!(cold.details, vec!["Temperature: Very cold (winter clothing)"]);
    }
}
