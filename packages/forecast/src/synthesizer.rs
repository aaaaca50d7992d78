//! Prediction synthesis: samples future incidents from frequency tables.
//!
//! Each round draws a future timestamp within the next 24 hours, samples
//! the incident type, weapon, victim age bracket and gender from their
//! tables, scores the result, places it in a named area, and explains it
//! with a list of factors. The finished batch is ranked by
//! `probability * confidence`.

use chrono::{Datelike as _, Duration, NaiveDateTime, Timelike as _};
use crime_forecast_models::{
    AgeBracket, Area, AreaLookup, Coordinates, CrimePatterns, FrequencyTable, Prediction,
    RiskLevel,
};
use rand::Rng;

use crate::ForecastError;
use crate::config::ForecastConfig;
use crate::sampling::select_weighted;

/// Location used when the area lookup knows nothing about the city.
pub const UNKNOWN_AREA: &str = "Unknown Area";

/// Substrings of an incident type that mark it as violent.
pub const VIOLENT_CRIME_MARKERS: &[&str] = &["HOMICIDE", "ASSAULT", "ROBBERY", "KIDNAPPING"];

/// Upper bound on a prediction's probability.
pub const MAX_PROBABILITY: f64 = 0.95;

const HOURS_PER_DAY_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Evening and night: 18:00 through 06:59.
#[must_use]
pub const fn is_night(hour: u32) -> bool {
    hour >= 18 || hour <= 6
}

/// Afternoon: 12:00 through 17:59.
#[must_use]
pub const fn is_afternoon(hour: u32) -> bool {
    hour >= 12 && hour <= 17
}

/// Friday (5) or Saturday (6), with 0 = Sunday.
#[must_use]
pub const fn is_weekend(weekday: u32) -> bool {
    weekday == 5 || weekday == 6
}

/// Probability multiplier for the hour of day.
#[must_use]
pub const fn time_multiplier(hour: u32) -> f64 {
    if is_night(hour) {
        1.5
    } else if is_afternoon(hour) {
        1.2
    } else {
        0.8
    }
}

/// Probability multiplier for the day of week (0 = Sunday).
#[must_use]
pub const fn day_multiplier(weekday: u32) -> f64 {
    if is_weekend(weekday) {
        1.3
    } else if weekday == 0 {
        1.1
    } else {
        1.0
    }
}

/// Returns `true` if the incident type contains any violent marker.
#[must_use]
pub fn is_violent(crime_type: &str) -> bool {
    VIOLENT_CRIME_MARKERS
        .iter()
        .any(|marker| crime_type.contains(marker))
}

/// Scores how likely an incident of a type with relative frequency
/// `type_share` is at the given hour and weekday.
#[must_use]
pub fn probability(type_share: f64, hour: u32, weekday: u32) -> f64 {
    (type_share * time_multiplier(hour) * day_multiplier(weekday) * 10.0).min(MAX_PROBABILITY)
}

/// Confidence grows linearly from 0.3 for an unseen type to 0.9 for a type
/// that makes up every record.
#[must_use]
pub fn confidence(type_share: f64) -> f64 {
    // Computed in tenths so both ends land exactly on 0.3 and 0.9.
    ((3.0 + 6.0 * type_share) / 10.0).min(0.9)
}

/// Builds the ordered explanation list for a prediction.
///
/// "Violent crime pattern" uses the full [`VIOLENT_CRIME_MARKERS`] set, the
/// same one that sizes the police estimate, so ROBBERY and KIDNAPPING count.
#[must_use]
pub fn factors(hour: u32, weekday: u32, crime_type: &str, location: &str) -> Vec<String> {
    let mut factors = Vec::new();

    if is_night(hour) {
        factors.push("Night time activity");
    } else if is_afternoon(hour) {
        factors.push("Daylight hours");
    }

    if is_weekend(weekday) {
        factors.push("Weekend pattern");
    }

    if is_violent(crime_type) {
        factors.push("Violent crime pattern");
    }

    if location.contains("Commercial") || location.contains("Market") {
        factors.push("High-traffic area");
    }

    if location.contains("Residential") {
        factors.push("Residential vulnerability");
    }

    factors.push("Historical pattern match");
    factors.push("Statistical probability");

    factors.into_iter().map(str::to_string).collect()
}

/// Produces ranked predictions from one city's [`CrimePatterns`].
pub struct Synthesizer<'a> {
    patterns: &'a CrimePatterns,
    areas: &'a dyn AreaLookup,
    config: &'a ForecastConfig,
}

impl<'a> Synthesizer<'a> {
    /// Creates a synthesizer over `patterns`, placing predictions through
    /// `areas`.
    #[must_use]
    pub fn new(
        patterns: &'a CrimePatterns,
        areas: &'a dyn AreaLookup,
        config: &'a ForecastConfig,
    ) -> Self {
        Self {
            patterns,
            areas,
            config,
        }
    }

    /// Generates `count` predictions for `city` relative to `now`, sorted
    /// by descending `probability * confidence`. Ties keep generation
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::InvalidInput`] if `count` is zero or if the
    /// crime type, weapon, age or gender table carries no weight.
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        city: &str,
        count: usize,
        now: NaiveDateTime,
        rng: &mut R,
    ) -> Result<Vec<Prediction>, ForecastError> {
        if count == 0 {
            return Err(ForecastError::InvalidInput {
                message: "prediction count must be at least 1".to_string(),
            });
        }

        require_weight(&self.patterns.crime_type_frequency, "crime type")?;
        require_weight(&self.patterns.weapon_frequency, "weapon")?;
        require_weight(&self.patterns.age_distribution, "victim age")?;
        require_weight(&self.patterns.gender_distribution, "victim gender")?;

        let now = now.with_nanosecond(0).unwrap_or(now);
        let areas = self.areas.lookup_areas(city);
        if areas.is_empty() {
            log::debug!("No known areas for '{city}', using '{UNKNOWN_AREA}'");
        }

        let mut predictions = (0..count)
            .map(|index| self.synthesize_one(index, now, &areas, rng))
            .collect::<Result<Vec<_>, _>>()?;

        predictions.sort_by(|a, b| b.score().total_cmp(&a.score()));

        log::debug!(
            "Synthesized {} predictions for '{city}' ({} areas)",
            predictions.len(),
            areas.len()
        );

        Ok(predictions)
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn synthesize_one<R: Rng + ?Sized>(
        &self,
        index: usize,
        now: NaiveDateTime,
        areas: &[Area],
        rng: &mut R,
    ) -> Result<Prediction, ForecastError> {
        let offset_ms = self.time_offset_ms(now.hour(), rng);
        let future = now + Duration::milliseconds(offset_ms as i64);
        // Whole seconds only; `now` is already truncated so this never
        // moves the prediction before it.
        let future = future.with_nanosecond(0).unwrap_or(future);
        let hour = future.hour();
        let weekday = future.weekday().num_days_from_sunday();

        let crime_type = draw(&self.patterns.crime_type_frequency, "crime type", rng)?.clone();
        let weapon = draw(&self.patterns.weapon_frequency, "weapon", rng)?.clone();
        let age_bracket = *draw(&self.patterns.age_distribution, "victim age", rng)?;
        let gender = draw(&self.patterns.gender_distribution, "victim gender", rng)?.clone();

        let type_table = &self.patterns.crime_type_frequency;
        let type_share = type_table.count(&crime_type) as f64 / type_table.total() as f64;

        let probability = probability(type_share, hour, weekday);
        let confidence = confidence(type_share);
        let risk_level = RiskLevel::from_score(probability * confidence);

        let (location, coordinates) = if areas.is_empty() {
            (UNKNOWN_AREA.to_string(), Coordinates::new(0.0, 0.0))
        } else {
            let area = &areas[rng.random_range(0..areas.len())];
            (area.name.clone(), area.coordinates)
        };

        let police_needed = if is_violent(&crime_type) {
            rng.random_range(8..=15)
        } else {
            rng.random_range(3..=7)
        };

        let factors = factors(hour, weekday, &crime_type, &location);

        Ok(Prediction {
            id: format!("pred_{}_{}", index + 1, now.and_utc().timestamp_millis()),
            date: future.date(),
            time: future.time(),
            crime_type,
            location,
            coordinates,
            probability,
            confidence,
            victim_age: sample_age(age_bracket, rng),
            victim_gender: gender,
            weapon,
            police_needed,
            risk_level,
            factors,
        })
    }

    /// Uniform offset within the next 24 hours, scaled down when the base
    /// hour is in the evening/night band so those predictions arrive
    /// sooner on average.
    fn time_offset_ms<R: Rng + ?Sized>(&self, base_hour: u32, rng: &mut R) -> f64 {
        let offset = rng.random::<f64>() * HOURS_PER_DAY_MS;
        if is_night(base_hour) {
            offset * self.config.evening_offset_scale
        } else {
            offset
        }
    }
}

/// Samples an age uniformly within the bracket's inclusive bounds.
pub fn sample_age<R: Rng + ?Sized>(bracket: AgeBracket, rng: &mut R) -> u32 {
    let (min, max) = bracket.bounds();
    rng.random_range(min..=max)
}

fn require_weight<K>(table: &FrequencyTable<K>, name: &str) -> Result<(), ForecastError> {
    if table.total() == 0 {
        return Err(ForecastError::InvalidInput {
            message: format!("{name} distribution is empty; at least one usable record is required"),
        });
    }
    Ok(())
}

fn draw<'t, K, R: Rng + ?Sized>(
    table: &'t FrequencyTable<K>,
    name: &str,
    rng: &mut R,
) -> Result<&'t K, ForecastError> {
    select_weighted(table, rng).ok_or_else(|| ForecastError::InvalidInput {
        message: format!("{name} distribution is empty"),
    })
}
