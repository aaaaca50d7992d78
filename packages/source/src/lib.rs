#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Historical crime record loading.
//!
//! Reads the flat incident table (one row per past incident, with headers
//! such as `City`, `Date of Occurrence` and `Crime Description`) into
//! [`HistoricalRecord`]s, and answers the per-city questions the API needs:
//! which cities exist, and which records belong to a city.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crime_forecast_models::HistoricalRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column that must be present for rows to be attributable to a city.
pub const CITY_COLUMN: &str = "City";

/// Errors that can occur while loading records.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Opening or reading the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV header could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is missing from the header row.
    #[error("Missing required column '{column}'")]
    MissingColumn {
        /// Name of the missing column.
        column: String,
    },
}

/// Number of records for one city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityCount {
    /// City name, trimmed.
    pub name: String,
    /// Number of records for the city.
    pub crime_count: u64,
}

/// Reads records from CSV data with a header row.
///
/// Unknown columns are ignored and missing optional columns default to
/// empty. Rows that cannot be deserialized are logged and skipped.
///
/// # Errors
///
/// Returns [`SourceError`] if the header row cannot be read or lacks the
/// `City` column.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<HistoricalRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    if !reader.headers()?.iter().any(|h| h == CITY_COLUMN) {
        return Err(SourceError::MissingColumn {
            column: CITY_COLUMN.to_string(),
        });
    }

    let mut records = Vec::new();
    let mut skipped = 0_u64;

    for (i, row) in reader.deserialize::<HistoricalRecord>().enumerate() {
        match row {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                // Row numbers are 1-based and the header is row 1.
                log::warn!("Skipping CSV row {}: {e}", i + 2);
            }
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} unreadable rows");
    }

    Ok(records)
}

/// Loads records from a CSV file.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be opened or its header is
/// unusable.
pub fn load_records(path: &Path) -> Result<Vec<HistoricalRecord>, SourceError> {
    log::info!("Loading historical records from {}", path.display());
    let records = read_records(File::open(path)?)?;
    log::info!("Loaded {} historical records", records.len());
    Ok(records)
}

/// Returns the records whose trimmed city equals the trimmed `city`.
#[must_use]
pub fn records_for_city(records: &[HistoricalRecord], city: &str) -> Vec<HistoricalRecord> {
    let city = city.trim();
    records
        .iter()
        .filter(|r| r.city.trim() == city)
        .cloned()
        .collect()
}

/// Counts records per city, most records first, ties by name.
#[must_use]
pub fn city_counts(records: &[HistoricalRecord]) -> Vec<CityCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records {
        let name = record.city.trim();
        if !name.is_empty() {
            *counts.entry(name).or_default() += 1;
        }
    }

    let mut cities: Vec<CityCount> = counts
        .into_iter()
        .map(|(name, crime_count)| CityCount {
            name: name.to_string(),
            crime_count,
        })
        .collect();

    // BTreeMap iteration is already name-ordered and the sort is stable.
    cities.sort_by(|a, b| b.crime_count.cmp(&a.crime_count));
    cities
}
