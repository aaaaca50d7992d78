#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the crime forecaster.
//!
//! ```text
//! crime_forecast predict --city Delhi [--count 10] [--seed 42] [--pretty]
//! crime_forecast patterns --city Delhi
//! crime_forecast cities
//! ```
//!
//! Every subcommand reads the historical CSV given by `--data` and an
//! optional TOML configuration given by `--config`.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use crime_forecast::{ForecastConfig, ForecastError, Forecaster};
use crime_forecast_areas::RegistryAreaLookup;
use crime_forecast_models::HistoricalRecord;
use crime_forecast_source::{CityCount, SourceError, city_counts, load_records, records_for_city};
use thiserror::Error;

/// Errors that can occur while running a CLI command.
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No crime data found for city: {city}")]
    NoRecords { city: String },
}

#[derive(Parser)]
#[command(
    name = "crime_forecast",
    about = "Forecast likely crime incidents from historical records"
)]
struct Cli {
    /// Historical incident CSV
    #[arg(long, global = true, default_value = "crime_dataset_india.csv")]
    data: PathBuf,

    /// Forecast configuration TOML
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate ranked predictions for a city
    Predict {
        /// City name as it appears in the data
        #[arg(long)]
        city: String,
        /// Number of predictions (defaults to the configured count)
        #[arg(long)]
        count: Option<usize>,
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the frequency tables extracted for a city
    Patterns {
        /// City name as it appears in the data
        #[arg(long)]
        city: String,
    },
    /// List cities and their record counts
    Cities,
}

fn load_config(path: Option<&Path>, seed: Option<u64>) -> Result<ForecastConfig, CliError> {
    load_config_with(path, seed, |key| std::env::var(key).ok())
}

/// Loads the configuration with `FORECAST_*` overrides read from `var`.
/// An explicit `--seed` wins over both the file and the overrides.
fn load_config_with(
    path: Option<&Path>,
    seed: Option<u64>,
    var: impl Fn(&str) -> Option<String>,
) -> Result<ForecastConfig, CliError> {
    let config = match path {
        Some(path) => ForecastConfig::load(path)?,
        None => ForecastConfig::default(),
    };
    let mut config = config.apply_overrides(var)?;

    if seed.is_some() {
        config.seed = seed;
    }

    Ok(config)
}

fn city_records(records: &[HistoricalRecord], city: &str) -> Result<Vec<HistoricalRecord>, CliError> {
    let found = records_for_city(records, city);
    if found.is_empty() {
        return Err(CliError::NoRecords {
            city: city.trim().to_string(),
        });
    }
    Ok(found)
}

fn format_cities(cities: &[CityCount]) -> String {
    let width = cities
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0)
        .max("City".len());

    let mut out = format!("{:<width$}  Records\n", "City");
    for city in cities {
        out.push_str(&format!("{:<width$}  {}\n", city.name, city.crime_count));
    }
    out
}

fn run(cli: Cli) -> Result<(), CliError> {
    let seed = match &cli.command {
        Commands::Predict { seed, .. } => *seed,
        _ => None,
    };
    let config = load_config(cli.config.as_deref(), seed)?;
    let records = load_records(&cli.data)?;

    match cli.command {
        Commands::Predict {
            city,
            count,
            pretty,
            ..
        } => {
            let found = city_records(&records, &city)?;
            let forecaster = Forecaster::new(config, RegistryAreaLookup::new());
            let predictions = forecaster.generate_predictions(&found, city.trim(), count)?;

            log::info!(
                "Generated {} predictions from {} records",
                predictions.len(),
                found.len()
            );

            let json = if pretty {
                serde_json::to_string_pretty(&predictions)?
            } else {
                serde_json::to_string(&predictions)?
            };
            println!("{json}");
        }
        Commands::Patterns { city } => {
            let found = city_records(&records, &city)?;
            let forecaster = Forecaster::new(config, RegistryAreaLookup::new());
            let patterns = forecaster.analyze_patterns(&found);
            println!("{}", serde_json::to_string_pretty(&patterns)?);
        }
        Commands::Cities => {
            let cities = city_counts(&records);
            if cities.is_empty() {
                println!("No cities found.");
            } else {
                print!("{}", format_cities(&cities));
            }
        }
    }

    Ok(())
}

fn main() {
    pretty_env_logger::init_custom_env("RUST_LOG");

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
