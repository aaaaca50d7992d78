#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Core types for the crime pattern forecaster.
//!
//! Historical incident rows come in as [`HistoricalRecord`]s, get counted
//! into the seven [`FrequencyTable`]s of a [`CrimePatterns`], and come back
//! out as ranked [`Prediction`]s. The [`AreaLookup`] trait is the seam to
//! whatever knows the named areas of a city.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// One past incident, as it appears in the historical dataset.
///
/// Every field is kept as raw text. Empty or whitespace-only values count
/// as absent; parsing into hours, weekdays and ages happens in the
/// analyzer, which decides how to treat malformed values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    /// City the incident was reported in.
    #[serde(rename = "City", default)]
    pub city: String,
    /// Calendar date of the incident.
    #[serde(rename = "Date of Occurrence", default)]
    pub date_of_occurrence: String,
    /// Time of day of the incident.
    #[serde(rename = "Time of Occurrence", default)]
    pub time_of_occurrence: String,
    /// Free-text incident type (e.g. `"BURGLARY"`).
    #[serde(rename = "Crime Description", default)]
    pub crime_description: String,
    /// Victim age, possibly empty or non-numeric.
    #[serde(rename = "Victim Age", default)]
    pub victim_age: String,
    /// Victim gender short code (e.g. `"M"`, `"F"`, `"X"`).
    #[serde(rename = "Victim Gender", default)]
    pub victim_gender: String,
    /// Weapon or method used.
    #[serde(rename = "Weapon Used", default)]
    pub weapon_used: String,
    /// Named sub-area of the city, when the dataset provides one.
    #[serde(rename = "Location", default)]
    pub location: String,
}

/// Count of occurrences per categorical key, in first-seen order.
///
/// Iteration order is insertion order, which weighted sampling relies on
/// for reproducible draws under a fixed seed.
#[derive(Debug, Clone)]
pub struct FrequencyTable<K> {
    entries: Vec<(K, u64)>,
    index: HashMap<K, usize>,
}

impl<K> FrequencyTable<K> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no key has been counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Iterates `(key, count)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.entries.iter().map(|(key, count)| (key, *count))
    }
}

impl<K: Eq + Hash + Clone> FrequencyTable<K> {
    /// Adds one occurrence of `key`.
    pub fn increment(&mut self, key: K) {
        self.add(key, 1);
    }

    /// Adds `count` occurrences of `key`, appending it if unseen.
    pub fn add(&mut self, key: K, count: u64) {
        if let Some(&i) = self.index.get(&key) {
            self.entries[i].1 += count;
        } else {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, count));
        }
    }

    /// Count recorded for `key`, zero if unseen.
    #[must_use]
    pub fn count(&self, key: &K) -> u64 {
        self.index.get(key).map_or(0, |&i| self.entries[i].1)
    }
}

impl<K> Default for FrequencyTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq> PartialEq for FrequencyTable<K> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Eq + Hash + Clone> FromIterator<(K, u64)> for FrequencyTable<K> {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (key, count) in iter {
            table.add(key, count);
        }
        table
    }
}

impl<K: Serialize> Serialize for FrequencyTable<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(key, count)| (key, count)))
    }
}

/// Victim age ranges used to bucket the age distribution.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum AgeBracket {
    /// Ages 0 through 17.
    #[serde(rename = "0-17")]
    #[strum(serialize = "0-17")]
    Minor,
    /// Ages 18 through 29.
    #[serde(rename = "18-29")]
    #[strum(serialize = "18-29")]
    YoungAdult,
    /// Ages 30 through 44.
    #[serde(rename = "30-44")]
    #[strum(serialize = "30-44")]
    Adult,
    /// Ages 45 through 59.
    #[serde(rename = "45-59")]
    #[strum(serialize = "45-59")]
    MiddleAged,
    /// Ages 60 and up.
    #[serde(rename = "60+")]
    #[strum(serialize = "60+")]
    Senior,
}

impl AgeBracket {
    /// Upper bound used when sampling an age from the open-ended `60+`
    /// bracket.
    pub const OPEN_ENDED_MAX_AGE: u32 = 79;

    /// Buckets an age. Negative ages land in [`Self::Minor`].
    #[must_use]
    pub const fn from_age(age: i64) -> Self {
        if age < 18 {
            Self::Minor
        } else if age < 30 {
            Self::YoungAdult
        } else if age < 45 {
            Self::Adult
        } else if age < 60 {
            Self::MiddleAged
        } else {
            Self::Senior
        }
    }

    /// Inclusive `(min, max)` ages for this bracket.
    #[must_use]
    pub const fn bounds(self) -> (u32, u32) {
        match self {
            Self::Minor => (0, 17),
            Self::YoungAdult => (18, 29),
            Self::Adult => (30, 44),
            Self::MiddleAged => (45, 59),
            Self::Senior => (60, Self::OPEN_ENDED_MAX_AGE),
        }
    }

    /// Returns all variants of this enum, youngest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Minor,
            Self::YoungAdult,
            Self::Adult,
            Self::MiddleAged,
            Self::Senior,
        ]
    }
}

/// Empirical distributions extracted from one city's historical records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimePatterns {
    /// Hour of day (0-23).
    pub hourly_distribution: FrequencyTable<u32>,
    /// Day of week, 0 = Sunday through 6 = Saturday.
    pub daily_distribution: FrequencyTable<u32>,
    /// Incident type description.
    pub crime_type_frequency: FrequencyTable<String>,
    /// Weapon or method.
    pub weapon_frequency: FrequencyTable<String>,
    /// Victim age bracket.
    pub age_distribution: FrequencyTable<AgeBracket>,
    /// Victim gender code.
    pub gender_distribution: FrequencyTable<String>,
    /// Named location. Computed for completeness; predictions place
    /// incidents through an [`AreaLookup`] instead.
    pub location_frequency: FrequencyTable<String>,
}

/// Overall risk classification of a prediction.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Score below 0.3.
    Low,
    /// Score in [0.3, 0.5).
    Medium,
    /// Score in [0.5, 0.7).
    High,
    /// Score of 0.7 or more.
    Critical,
}

impl RiskLevel {
    /// Classifies a `probability * confidence` score. Each band includes
    /// its lower bound.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            Self::Critical
        } else if score >= 0.5 {
            Self::High
        } else if score >= 0.3 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

impl Coordinates {
    /// Creates a coordinate pair.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Land-use category of a named area.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AreaCategory {
    /// Shopping and business districts.
    Commercial,
    /// Housing.
    Residential,
    /// Factories and warehouses.
    Industrial,
    /// Parks, monuments, beaches.
    Public,
    /// Stations and transit hubs.
    Transport,
    /// Campuses and schools.
    Educational,
    /// Hospitals and clinics.
    Healthcare,
    /// Nightlife and venues.
    Entertainment,
}

/// A named sub-area of a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    /// Display name (e.g. "Connaught Place").
    pub name: String,
    /// Representative point of the area.
    pub coordinates: Coordinates,
    /// Land-use category.
    pub category: AreaCategory,
}

/// Resolves a city name to the named areas predictions can be placed in.
///
/// Implementations return an empty list for unknown cities rather than
/// failing.
pub trait AreaLookup {
    /// Returns the areas of `city`, possibly none.
    fn lookup_areas(&self, city: &str) -> Vec<Area>;
}

impl<F> AreaLookup for F
where
    F: Fn(&str) -> Vec<Area>,
{
    fn lookup_areas(&self, city: &str) -> Vec<Area> {
        self(city)
    }
}

/// A synthetic future incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Identifier, unique within one batch.
    pub id: String,
    /// Predicted calendar date.
    pub date: NaiveDate,
    /// Predicted time of day, whole seconds.
    pub time: NaiveTime,
    /// Incident type sampled from the type distribution.
    pub crime_type: String,
    /// Area name, or `"Unknown Area"`.
    pub location: String,
    /// Area coordinates, `(0, 0)` for an unknown area.
    pub coordinates: Coordinates,
    /// Likelihood score in `[0, 0.95]`.
    pub probability: f64,
    /// Confidence score in `[0.3, 0.9]`.
    pub confidence: f64,
    /// Victim age sampled within the chosen bracket.
    pub victim_age: u32,
    /// Victim gender code.
    pub victim_gender: String,
    /// Weapon or method.
    pub weapon: String,
    /// Estimated number of officers to deploy.
    pub police_needed: u32,
    /// Classification of `probability * confidence`.
    pub risk_level: RiskLevel,
    /// Human-readable reasons, in a fixed order.
    pub factors: Vec<String>,
}

impl Prediction {
    /// Ranking score, `probability * confidence`.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.probability * self.confidence
    }
}
