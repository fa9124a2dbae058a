pub mod aggregation;
pub mod comfort;
pub mod config;
pub mod errors;
pub mod forecast_engine;
pub mod initialization;
pub mod models;
pub mod pipeline;
pub mod records;
pub mod risk;
pub mod source;
pub mod summary;
pub mod target;
