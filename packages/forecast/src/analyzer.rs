//! Pattern analysis: turns historical records into frequency tables.
//!
//! Each record contributes independently to every dimension it has a value
//! for. Empty fields are skipped for that dimension only. Time and date
//! fields that are present but unparseable are handled according to
//! [`ParseFailurePolicy`].

use chrono::{Datelike as _, NaiveDate, NaiveDateTime, NaiveTime, Timelike as _};
use crime_forecast_models::{AgeBracket, CrimePatterns, HistoricalRecord};
use rand::Rng;

use crate::config::{ForecastConfig, ParseFailurePolicy};

const DATETIME_FORMATS: &[&str] = &[
    "%d-%m-%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y"];

const TIME_FORMATS: &[&str] = &[
    "%H:%M:%S",
    "%H:%M:%S%.f",
    "%H:%M",
    "%I:%M:%S %p",
    "%I:%M %p",
];

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Extracts the hour (0-23) from a time-of-day string.
///
/// Accepts bare times (`22:00:00`, `22:00`, `10:15 PM`) as well as full
/// datetimes such as the dataset's `01-01-2020 01:11`.
#[must_use]
pub fn parse_hour(s: &str) -> Option<u32> {
    let s = s.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
        .map(|t| t.hour())
        .or_else(|| parse_datetime(s).map(|dt| dt.hour()))
}

/// Extracts the weekday index (0 = Sunday .. 6 = Saturday) from a date
/// string, with or without a time component.
#[must_use]
pub fn parse_weekday(s: &str) -> Option<u32> {
    let s = s.trim();
    parse_datetime(s)
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        })
        .map(|d| d.weekday().num_days_from_sunday())
}

/// Parses the leading integer of an age field (`"25"`, `" 41 years"`).
fn parse_age(s: &str) -> Option<i64> {
    let s = s.trim();
    let digits_end = s
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
        .map_or(s.len(), |(i, _)| i);
    s[..digits_end].parse().ok()
}

fn is_present(s: &str) -> bool {
    !s.trim().is_empty()
}

fn fallback_bucket<R: Rng + ?Sized>(
    policy: ParseFailurePolicy,
    default: u32,
    buckets: u32,
    rng: &mut R,
) -> Option<u32> {
    match policy {
        ParseFailurePolicy::Randomize => Some(rng.random_range(0..buckets)),
        ParseFailurePolicy::Skip => None,
        ParseFailurePolicy::DefaultValue => Some(default),
    }
}

/// Builds the seven frequency tables for one city's records.
///
/// Never fails: an empty slice yields empty tables, and malformed fields
/// degrade per `config`. The random source is only consulted for
/// [`ParseFailurePolicy::Randomize`].
pub fn analyze<R: Rng + ?Sized>(
    records: &[HistoricalRecord],
    config: &ForecastConfig,
    rng: &mut R,
) -> CrimePatterns {
    let mut patterns = CrimePatterns::default();
    let mut malformed_times = 0_usize;
    let mut malformed_dates = 0_usize;

    for record in records {
        if is_present(&record.time_of_occurrence) {
            let hour = parse_hour(&record.time_of_occurrence).or_else(|| {
                malformed_times += 1;
                log::trace!("Malformed time of occurrence: {:?}", record.time_of_occurrence);
                fallback_bucket(config.on_parse_failure, config.fallback_hour, 24, rng)
            });
            if let Some(hour) = hour {
                patterns.hourly_distribution.increment(hour);
            }
        }

        if is_present(&record.date_of_occurrence) {
            let weekday = parse_weekday(&record.date_of_occurrence).or_else(|| {
                malformed_dates += 1;
                log::trace!("Malformed date of occurrence: {:?}", record.date_of_occurrence);
                fallback_bucket(config.on_parse_failure, config.fallback_weekday, 7, rng)
            });
            if let Some(weekday) = weekday {
                patterns.daily_distribution.increment(weekday);
            }
        }

        if is_present(&record.crime_description) {
            patterns
                .crime_type_frequency
                .increment(record.crime_description.clone());
        }

        if is_present(&record.weapon_used) {
            patterns
                .weapon_frequency
                .increment(record.weapon_used.clone());
        }

        let age = parse_age(&record.victim_age).unwrap_or(config.default_victim_age);
        patterns
            .age_distribution
            .increment(AgeBracket::from_age(age));

        if is_present(&record.victim_gender) {
            patterns
                .gender_distribution
                .increment(record.victim_gender.clone());
        }

        if is_present(&record.location) {
            patterns
                .location_frequency
                .increment(record.location.clone());
        }
    }

    if malformed_times > 0 || malformed_dates > 0 {
        log::warn!(
            "{malformed_times} malformed time(s) and {malformed_dates} malformed date(s) \
             handled with policy '{}'",
            config.on_parse_failure
        );
    }

    log::debug!(
        "Analyzed {} records: {} crime types, {} weapons, {} genders",
        records.len(),
        patterns.crime_type_frequency.len(),
        patterns.weapon_frequency.len(),
        patterns.gender_distribution.len()
    );

    patterns
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn record(time: &str, date: &str, crime: &str, age: &str, gender: &str) -> HistoricalRecord {
        HistoricalRecord {
            city: "Testville".to_string(),
            date_of_occurrence: date.to_string(),
            time_of_occurrence: time.to_string(),
            crime_description: crime.to_string(),
            victim_age: age.to_string(),
            victim_gender: gender.to_string(),
            weapon_used: "NONE".to_string(),
            location: String::new(),
        }
    }

    fn analyze_with(records: &[HistoricalRecord], policy: ParseFailurePolicy) -> CrimePatterns {
        let config = ForecastConfig {
            on_parse_failure: policy,
            fallback_hour: 9,
            fallback_weekday: 2,
            ..ForecastConfig::default()
        };
        analyze(records, &config, &mut ChaCha8Rng::seed_from_u64(3))
    }

    #[test]
    fn parses_supported_time_formats() {
        assert_eq!(parse_hour("22:00:00"), Some(22));
        assert_eq!(parse_hour("07:45"), Some(7));
        assert_eq!(parse_hour("13:05:09.250"), Some(13));
        assert_eq!(parse_hour("10:15 PM"), Some(22));
        assert_eq!(parse_hour("01-01-2020 01:11"), Some(1));
        assert_eq!(parse_hour("2024-03-09T18:30:00"), Some(18));
        assert_eq!(parse_hour("late evening"), None);
        assert_eq!(parse_hour("25:00"), None);
    }

    #[test]
    fn parses_supported_date_formats() {
        // 2024-01-05 was a Friday.
        assert_eq!(parse_weekday("2024-01-05"), Some(5));
        assert_eq!(parse_weekday("05-01-2024"), Some(5));
        assert_eq!(parse_weekday("01/05/2024"), Some(5));
        assert_eq!(parse_weekday("05-01-2024 00:00"), Some(5));
        assert_eq!(parse_weekday("2024-01-07 12:00:00"), Some(0));
        assert_eq!(parse_weekday("2024-13-45"), None);
    }

    #[test]
    fn parses_leading_integer_ages() {
        assert_eq!(parse_age("25"), Some(25));
        assert_eq!(parse_age(" 41 years"), Some(41));
        assert_eq!(parse_age("-3"), Some(-3));
        assert_eq!(parse_age("unknown"), None);
        assert_eq!(parse_age(""), None);
    }

    #[test]
    fn empty_input_yields_empty_tables() {
        let patterns = analyze_with(&[], ParseFailurePolicy::Randomize);
        assert_eq!(patterns, CrimePatterns::default());
        assert!(patterns.crime_type_frequency.is_empty());
        assert!(patterns.age_distribution.is_empty());
    }

    #[test]
    fn table_totals_match_present_values() {
        let records = vec![
            record("22:00:00", "2024-01-05", "THEFT", "25", "M"),
            record("", "2024-01-06", "BURGLARY", "", "F"),
            record("09:30", "", "", "70", ""),
            record("23:10", "2024-01-07", "THEFT", "abc", "M"),
        ];
        let patterns = analyze_with(&records, ParseFailurePolicy::Randomize);

        assert_eq!(patterns.hourly_distribution.total(), 3);
        assert_eq!(patterns.daily_distribution.total(), 3);
        assert_eq!(patterns.crime_type_frequency.total(), 3);
        assert_eq!(patterns.weapon_frequency.total(), 4);
        assert_eq!(patterns.age_distribution.total(), 4);
        assert_eq!(patterns.gender_distribution.total(), 3);
        assert!(patterns.location_frequency.is_empty());

        assert_eq!(patterns.crime_type_frequency.count(&"THEFT".to_string()), 2);
        assert_eq!(patterns.hourly_distribution.count(&22), 1);
        assert_eq!(patterns.daily_distribution.count(&5), 1);
        assert_eq!(patterns.daily_distribution.count(&6), 1);
        assert_eq!(patterns.daily_distribution.count(&0), 1);
    }

    #[test]
    fn missing_or_bad_age_defaults_to_thirty() {
        let records = vec![
            record("", "", "THEFT", "", "M"),
            record("", "", "THEFT", "n/a", "M"),
            record("", "", "THEFT", "65", "M"),
        ];
        let patterns = analyze_with(&records, ParseFailurePolicy::Skip);
        assert_eq!(patterns.age_distribution.count(&AgeBracket::Adult), 2);
        assert_eq!(patterns.age_distribution.count(&AgeBracket::Senior), 1);
    }

    #[test]
    fn randomize_policy_keeps_buckets_in_range() {
        let records: Vec<_> = (0..200)
            .map(|_| record("half past nine", "someday", "THEFT", "25", "M"))
            .collect();
        let patterns = analyze_with(&records, ParseFailurePolicy::Randomize);

        assert_eq!(patterns.hourly_distribution.total(), 200);
        assert_eq!(patterns.daily_distribution.total(), 200);
        assert!(patterns.hourly_distribution.iter().all(|(h, _)| *h < 24));
        assert!(patterns.daily_distribution.iter().all(|(d, _)| *d < 7));
    }

    #[test]
    fn skip_policy_drops_only_the_malformed_dimension() {
        let records = vec![record("noon-ish", "2024-01-05", "THEFT", "25", "M")];
        let patterns = analyze_with(&records, ParseFailurePolicy::Skip);

        assert!(patterns.hourly_distribution.is_empty());
        assert_eq!(patterns.daily_distribution.total(), 1);
        assert_eq!(patterns.crime_type_frequency.total(), 1);
    }

    #[test]
    fn default_value_policy_uses_configured_buckets() {
        let records = vec![record("??", "??", "THEFT", "25", "M")];
        let patterns = analyze_with(&records, ParseFailurePolicy::DefaultValue);

        assert_eq!(patterns.hourly_distribution.count(&9), 1);
        assert_eq!(patterns.daily_distribution.count(&2), 1);
    }

    #[test]
    fn counts_location_when_present() {
        let mut with_location = record("", "", "THEFT", "25", "M");
        with_location.location = "Market Square".to_string();
        let records = vec![with_location, record("", "", "THEFT", "25", "M")];

        let patterns = analyze_with(&records, ParseFailurePolicy::Skip);
        assert_eq!(patterns.location_frequency.total(), 1);
        assert_eq!(
            patterns
                .location_frequency
                .count(&"Market Square".to_string()),
            1
        );
    }

    #[test]
    fn result_is_order_independent() {
        let records = vec![
            record("22:00:00", "2024-01-05", "THEFT", "25", "M"),
            record("08:00:00", "2024-01-06", "ASSAULT", "50", "F"),
            record("22:30:00", "2024-01-05", "THEFT", "19", "M"),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let a = analyze_with(&records, ParseFailurePolicy::Skip);
        let b = analyze_with(&reversed, ParseFailurePolicy::Skip);

        for (key, count) in a.crime_type_frequency.iter() {
            assert_eq!(b.crime_type_frequency.count(key), count);
        }
        for (key, count) in a.hourly_distribution.iter() {
            assert_eq!(b.hourly_distribution.count(key), count);
        }
        for (key, count) in a.age_distribution.iter() {
            assert_eq!(b.age_distribution.count(key), count);
        }
    }
}
