use std::collections::BTreeMap;
use serde::Serialize;
use crate::models::record::ForecastRecord;

const BANNER_WIDTH: usize = 60;

/// Unit suffixes stripped when reading a summary, longest first where they overlap
const UNITS: [&str; 7] = ["mm/month", "mm/day", "kg/m²", "°C", "m/s", "hPa", "%"];

/// A value read from a summary line
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum SummaryValue {
    Number(f64),
    Text(String),
}

impl SummaryValue {
    /// Number if the text parses as one, otherwise the text itself
    ///
    /// # Arguments
    ///
    /// * 'text' - the raw value
    pub fn from_text(text: &str) -> SummaryValue {
        let text = text.trim();
        match text.parse::<f64>() {
            Ok(n) => SummaryValue::Number(n),
            Err(_) => SummaryValue::Text(text.to_string()),
        }
    }
}

/// Renders a human readable summary of a record
///
/// # Arguments
///
/// * 'record' - the record to render
pub fn render_summary(record: &ForecastRecord) -> String {
    let banner = "=".repeat(BANNER_WIDTH);
    let mut lines: Vec<String> = Vec::new();

    lines.push(banner.clone());
    lines.push(format!("climate forecast for {} on {}", record.region, record.target_date.format("%Y-%m-%d")));
    lines.push(banner.clone());

    for (variable, point) in &record.forecasts {
        let unit = variable.unit();
        lines.push(format!("{}: {:.2} {}", variable, point.value, unit));
        lines.push(format!("  confidence interval: {:.2} .. {:.2} {}", point.lower, point.upper, unit));
    }

    lines.push(banner.clone());
    lines.push(format!("wscore: {}", record.comfort.score));
    lines.push(format!("comfort_description: {}", record.comfort.description));
    if !record.comfort.conditions.is_empty() {
        lines.push(format!("conditions: {}", record.comfort.conditions.join(", ")));
    }
    if !record.comfort.details.is_empty() {
        lines.push(format!("details: {}", record.comfort.details.join("; ")));
    }
    if record.risks.is_empty() {
        lines.push("risks: no significant risk".to_string());
    } else {
        let risks: Vec<String> = record.risks.iter().map(|r| r.to_string()).collect();
        lines.push(format!("risks: {}", risks.join("; ")));
    }
    lines.push(banner);

    lines.join("\n")
}

/// Reads `label: value unit` lines from a summary. Banner lines, lines without colon and
/// confidence interval lines are skipped. Later labels replace earlier ones.
///
/// # Arguments
///
/// * 'text' - the summary text
pub fn parse_summary(text: &str) -> BTreeMap<String, SummaryValue> {
    let mut values: BTreeMap<String, SummaryValue> = BTreeMap::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('=') || line.contains("confidence interval") {
            continue;
        }
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };

        let label = label.trim();
        if label.is_empty() {
            continue;
        }

        values.insert(label.to_string(), SummaryValue::from_text(strip_unit(value.trim())));
    }

    values
}

/// Removes a known unit suffix
///
/// # Arguments
///
/// * 'value' - trimmed value text
fn strip_unit(value: &str) -> &str {
    UNITS
        .iter()
        .find_map(|u| value.strip_suffix(u))
        .map_or(value, str::trim_end)
}
