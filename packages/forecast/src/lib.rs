#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistical crime forecaster.
//!
//! [`Forecaster::analyze_patterns`] counts a city's historical records into
//! frequency tables, and [`Forecaster::generate_predictions`] samples those
//! tables into a ranked batch of synthetic future incidents. Nothing is
//! learned or cached between calls; every call rebuilds its tables from the
//! records it is given and draws from its own random source.

pub mod analyzer;
pub mod config;
pub mod sampling;
pub mod synthesizer;

use chrono::NaiveDateTime;
use crime_forecast_models::{AreaLookup, CrimePatterns, HistoricalRecord, Prediction};
use rand::Rng;
use thiserror::Error;

pub use config::{ForecastConfig, ParseFailurePolicy};
pub use synthesizer::Synthesizer;

/// Errors that can occur while configuring or running the forecaster.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The request cannot be satisfied with the given inputs.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of what went wrong.
        message: String,
    },

    /// A configuration value is out of range.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// The configuration file is not valid TOML for [`ForecastConfig`].
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Reading the configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Entry point tying the analyzer and synthesizer to a configuration and
/// an area lookup.
pub struct Forecaster<A> {
    config: ForecastConfig,
    areas: A,
}

impl<A: AreaLookup> Forecaster<A> {
    /// Creates a forecaster.
    #[must_use]
    pub const fn new(config: ForecastConfig, areas: A) -> Self {
        Self { config, areas }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Returns the area lookup predictions are placed through.
    #[must_use]
    pub const fn areas(&self) -> &A {
        &self.areas
    }

    /// Builds frequency tables from `records`.
    #[must_use]
    pub fn analyze_patterns(&self, records: &[HistoricalRecord]) -> CrimePatterns {
        analyzer::analyze(records, &self.config, &mut self.config.rng())
    }

    /// Generates a ranked batch of predictions for `city`, starting from
    /// the current local time.
    ///
    /// `count` falls back to the configured default when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::InvalidInput`] if `count` is zero or the
    /// records leave a required distribution empty.
    pub fn generate_predictions(
        &self,
        records: &[HistoricalRecord],
        city: &str,
        count: Option<usize>,
    ) -> Result<Vec<Prediction>, ForecastError> {
        let now = chrono::Local::now().naive_local();
        self.generate_predictions_with(records, city, count, now, &mut self.config.rng())
    }

    /// Same as [`Self::generate_predictions`] with an explicit base time
    /// and random source.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::InvalidInput`] if `count` is zero or the
    /// records leave a required distribution empty.
    pub fn generate_predictions_with<R: Rng + ?Sized>(
        &self,
        records: &[HistoricalRecord],
        city: &str,
        count: Option<usize>,
        now: NaiveDateTime,
        rng: &mut R,
    ) -> Result<Vec<Prediction>, ForecastError> {
        let count = count.unwrap_or(self.config.default_prediction_count);
        let patterns = analyzer::analyze(records, &self.config, rng);

        log::debug!(
            "Generating {count} predictions for '{city}' from {} records",
            records.len()
        );

        Synthesizer::new(&patterns, &self.areas, &self.config).synthesize(city, count, now, rng)
    }
}
