use std::env;
use std::path::Path;
use std::process::ExitCode;
use anyhow::Context;
use log::{error, info};
use climcast::config::{load_config, Config};
use climcast::initialization::setup_logger;
use climcast::pipeline::Pipeline;
use climcast::records::save_record;
use climcast::source::{JsonDirectorySource, ObservationSource};
use climcast::summary::render_summary;

fn main() -> ExitCode {
    let config_path = env::var("CLIMCAST_CONFIG").unwrap_or("config.toml".to_string());

    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration from {}: {}", config_path, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = setup_logger(&config.general) {
        eprintln!("Error setting up logger: {}", e);
        return ExitCode::FAILURE;
    }

    info!("climcast version: {}", env!("CARGO_PKG_VERSION"));

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Reads observations, runs the pipeline, saves the record and prints the summary
///
/// # Arguments
///
/// * 'config' - the loaded configuration
fn run(config: &Config) -> anyhow::Result<()> {
    let region = &config.region;

    let source = JsonDirectorySource::new(Path::new(&config.files.observations_dir), region.start, region.end);
    let observations = source.observations()
        .with_context(|| format!("reading observations from {}", config.files.observations_dir))?;

    let outcome = Pipeline::new(config)
        .run_observations(&observations, region.bounding_box(), &region.name, region.target_date)
        .with_context(|| format!("forecasting {} for {}", region.name, region.target_date))?;

    for skipped in &outcome.skipped {
        info!("not forecast: {}", skipped);
    }

    let path = save_record(Path::new(&config.files.records_dir), &outcome.record)
        .context("saving forecast record")?;

    println!("{}", render_summary(&outcome.record));
    info!("done, record at {:?}", path);

    Ok(())
}
