//! Forecaster configuration.
//!
//! Loaded from TOML, then optionally overridden from `FORECAST_*`
//! environment variables. Every field has a default, so an empty file is a
//! valid configuration.

use std::path::Path;

use rand::SeedableRng as _;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::ForecastError;

/// What the analyzer does with a non-empty time or date field it cannot
/// parse.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ParseFailurePolicy {
    /// Count the record under a uniformly random hour or weekday.
    #[default]
    Randomize,
    /// Leave the record out of that one table.
    Skip,
    /// Count the record under the configured fallback hour or weekday.
    DefaultValue,
}

/// Tunables for pattern analysis and prediction synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Handling of malformed time and date fields.
    pub on_parse_failure: ParseFailurePolicy,
    /// Hour (0-23) used by [`ParseFailurePolicy::DefaultValue`].
    pub fallback_hour: u32,
    /// Weekday (0 = Sunday .. 6 = Saturday) used by
    /// [`ParseFailurePolicy::DefaultValue`].
    pub fallback_weekday: u32,
    /// Age assumed for records with a missing or non-numeric victim age.
    pub default_victim_age: i64,
    /// Number of predictions generated when the caller does not ask for a
    /// specific count.
    pub default_prediction_count: usize,
    /// Factor applied to the random time offset when the base time falls in
    /// the evening/night band, pulling predictions closer.
    pub evening_offset_scale: f64,
    /// Seed for the random source. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            on_parse_failure: ParseFailurePolicy::Randomize,
            fallback_hour: 0,
            fallback_weekday: 0,
            default_victim_age: 30,
            default_prediction_count: 8,
            evening_offset_scale: 0.8,
            seed: None,
        }
    }
}

impl ForecastConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::ConfigParse`] if the TOML is malformed and
    /// [`ForecastError::Config`] if a value is out of range.
    pub fn from_toml_str(s: &str) -> Result<Self, ForecastError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Io`] if the file cannot be read, otherwise
    /// the same errors as [`Self::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ForecastError> {
        log::debug!("Loading forecast config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Applies `FORECAST_SEED`, `FORECAST_ON_PARSE_FAILURE` and
    /// `FORECAST_PREDICTION_COUNT` from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Config`] if a variable holds an invalid
    /// value.
    pub fn apply_env_overrides(self) -> Result<Self, ForecastError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Config`] if a variable holds an invalid
    /// value.
    pub fn apply_overrides(
        mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ForecastError> {
        if let Some(seed) = var("FORECAST_SEED") {
            self.seed = Some(seed.trim().parse().map_err(|e| ForecastError::Config {
                message: format!("FORECAST_SEED '{seed}' is not a valid u64: {e}"),
            })?);
        }

        if let Some(policy) = var("FORECAST_ON_PARSE_FAILURE") {
            self.on_parse_failure = policy.trim().parse().map_err(|_| ForecastError::Config {
                message: format!(
                    "FORECAST_ON_PARSE_FAILURE '{policy}' must be one of randomize, skip, default_value"
                ),
            })?;
        }

        if let Some(count) = var("FORECAST_PREDICTION_COUNT") {
            self.default_prediction_count =
                count.trim().parse().map_err(|e| ForecastError::Config {
                    message: format!("FORECAST_PREDICTION_COUNT '{count}' is not a count: {e}"),
                })?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Checks that every value is within its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.fallback_hour > 23 {
            return Err(ForecastError::Config {
                message: format!("fallback_hour {} must be 0-23", self.fallback_hour),
            });
        }
        if self.fallback_weekday > 6 {
            return Err(ForecastError::Config {
                message: format!("fallback_weekday {} must be 0-6", self.fallback_weekday),
            });
        }
        if self.default_prediction_count == 0 {
            return Err(ForecastError::Config {
                message: "default_prediction_count must be at least 1".to_string(),
            });
        }
        if !(self.evening_offset_scale > 0.0 && self.evening_offset_scale <= 1.0) {
            return Err(ForecastError::Config {
                message: format!(
                    "evening_offset_scale {} must be in (0, 1]",
                    self.evening_offset_scale
                ),
            });
        }
        Ok(())
    }

    /// Creates the random source for one analysis or prediction call.
    #[must_use]
    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rand::Rng as _;

    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = ForecastConfig::from_toml_str("").unwrap();
        assert_eq!(config, ForecastConfig::default());
        assert_eq!(config.default_victim_age, 30);
        assert_eq!(config.default_prediction_count, 8);
    }

    #[test]
    fn parses_all_fields() {
        let config = ForecastConfig::from_toml_str(
            r#"
on_parse_failure = "default_value"
fallback_hour = 12
fallback_weekday = 3
default_victim_age = 40
default_prediction_count = 10
evening_offset_scale = 0.5
seed = 42
"#,
        )
        .unwrap();

        assert_eq!(config.on_parse_failure, ParseFailurePolicy::DefaultValue);
        assert_eq!(config.fallback_hour, 12);
        assert_eq!(config.fallback_weekday, 3);
        assert_eq!(config.default_victim_age, 40);
        assert_eq!(config.default_prediction_count, 10);
        assert!((config.evening_offset_scale - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            ForecastConfig::from_toml_str("fallback_hour = 24"),
            Err(ForecastError::Config { .. })
        ));
        assert!(matches!(
            ForecastConfig::from_toml_str("fallback_weekday = 7"),
            Err(ForecastError::Config { .. })
        ));
        assert!(matches!(
            ForecastConfig::from_toml_str("default_prediction_count = 0"),
            Err(ForecastError::Config { .. })
        ));
        assert!(matches!(
            ForecastConfig::from_toml_str("evening_offset_scale = 1.5"),
            Err(ForecastError::Config { .. })
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            ForecastConfig::from_toml_str("on_parse_failure = \"sometimes\""),
            Err(ForecastError::ConfigParse(_))
        ));
    }

    #[test]
    fn overrides_replace_file_values() {
        let vars: BTreeMap<&str, &str> = [
            ("FORECAST_SEED", "7"),
            ("FORECAST_ON_PARSE_FAILURE", "skip"),
            ("FORECAST_PREDICTION_COUNT", "10"),
        ]
        .into_iter()
        .collect();

        let config = ForecastConfig::default()
            .apply_overrides(|key| vars.get(key).map(ToString::to_string))
            .unwrap();

        assert_eq!(config.seed, Some(7));
        assert_eq!(config.on_parse_failure, ParseFailurePolicy::Skip);
        assert_eq!(config.default_prediction_count, 10);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let result = ForecastConfig::default().apply_overrides(|key| {
            (key == "FORECAST_SEED").then(|| "not-a-number".to_string())
        });
        assert!(matches!(result, Err(ForecastError::Config { .. })));
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let config = ForecastConfig {
            seed: Some(99),
            ..ForecastConfig::default()
        };
        let a: Vec<u32> = (0..8).map(|_| config.rng().random()).collect();
        let mut first = config.rng();
        let mut second = config.rng();
        let b: Vec<u32> = (0..8).map(|_| first.random()).collect();
        let c: Vec<u32> = (0..8).map(|_| second.random()).collect();
        assert_eq!(b, c);
        assert!(a.iter().all(|v| *v == a[0]), "each fresh rng starts the same");
    }
}
