use std::path::PathBuf;
use chrono::NaiveDate;
use thiserror::Error;
use crate::models::variable::Variable;

/// Reasons a single variable produces no forecast. These never abort the invocation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("InsufficientDataError: {variable} has {found} usable points, {required} required")]
    InsufficientData { variable: Variable, found: usize, required: usize },
    #[error("MissingVariableError: {0} is absent from the aggregated series")]
    MissingVariable(Variable),
    #[error("ModelFitError: {variable}: {reason}")]
    ModelFit { variable: Variable, reason: String },
    #[error("InvalidTargetDateError: {variable}: target {target} is not after last historical month {last_month}")]
    InvalidTargetDate { variable: Variable, target: NaiveDate, last_month: NaiveDate },
    #[error("UnresolvedTargetError: {variable}: no projected row for {target}")]
    UnresolvedTarget { variable: Variable, target: NaiveDate },
}

impl ForecastError {
    /// Returns a model fit error for the given variable
    ///
    /// # Arguments
    ///
    /// * 'variable' - the variable being fitted
    /// * 'reason' - what went wrong
    pub fn fit(variable: Variable, reason: impl Into<String>) -> ForecastError {
        ForecastError::ModelFit { variable, reason: reason.into() }
    }
}

/// Invocation level failures
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("InsufficientDataError: {found} months aggregated, at least {required} required")]
    InsufficientHistory { found: usize, required: usize },
    #[error("NoForecastsProducedError: {}", join_reasons(.0))]
    NoForecastsProduced(Vec<ForecastError>),
}

fn join_reasons(reasons: &[ForecastError]) -> String {
    if reasons.is_empty() {
        "no variables were forecast".to_string()
    } else {
        reasons.iter().map(|r| r.to_string()).collect::<Vec<String>>().join("; ")
    }
}

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("RecordNotFoundError: no record matching {pattern} in {dir:?}")]
    NotFound { dir: PathBuf, pattern: String },
    #[error("RecordError::Io: {0}")]
    Io(#[from] std::io::Error),
    #[error("RecordError::Csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("RecordError::Pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("RecordError::Glob: {0}")]
    Glob(#[from] glob::GlobError),
    #[error("RecordError::Document: {0}")]
    Document(String),
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("SourceError::Io: {0}")]
    Io(#[from] std::io::Error),
    #[error("SourceError::Document: {0}")]
    Document(#[from] serde_json::Error),
    #[error("SourceError::Pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("SourceError::Glob: {0}")]
    Glob(#[from] glob::GlobError),
}

#[derive(Error, Debug)]
#[error("ConfigError: {0}")]
pub struct ConfigError(pub String);
impl From<&str> for ConfigError {
    fn from(e: &str) -> Self { ConfigError(e.to_string()) }
}
impl From<String> for ConfigError {
    fn from(e: String) -> Self { ConfigError(e) }
}
impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self { ConfigError(format!("io error: {}", e)) }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self { ConfigError(format!("toml document error: {}", e)) }
}

#[derive(Error, Debug)]
#[error("LoggingError: {0}")]
pub struct LoggingError(pub String);
impl From<std::io::Error> for LoggingError {
    fn from(e: std::io::Error) -> Self { LoggingError(e.to_string()) }
}
impl From<log4rs::config::runtime::ConfigErrors> for LoggingError {
    fn from(e: log4rs::config::runtime::ConfigErrors) -> Self { LoggingError(e.to_string()) }
}
impl From<log::SetLoggerError> for LoggingError {
    fn from(e: log::SetLoggerError) -> Self { LoggingError(e.to_string()) }
}
