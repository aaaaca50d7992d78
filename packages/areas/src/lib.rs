#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Named areas of the cities the forecaster knows about.
//!
//! City definitions are TOML files embedded at compile time (see
//! [`registry`]). [`RegistryAreaLookup`] exposes them through the
//! [`AreaLookup`] trait so predictions can be placed in real
//! neighbourhoods.

pub mod registry;

use crime_forecast_models::{Area, AreaCategory, AreaLookup, Coordinates};
use serde::{Deserialize, Serialize};

pub use registry::{all_cities, find_city};

/// A city and its named areas, deserialized from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityLocation {
    /// Unique identifier (e.g., `"delhi"`).
    pub id: String,
    /// Display name as it appears in the historical records.
    pub name: String,
    /// City centre latitude.
    pub latitude: f64,
    /// City centre longitude.
    pub longitude: f64,
    /// Named sub-areas.
    #[serde(default)]
    pub areas: Vec<AreaDefinition>,
}

/// One named area inside a [`CityLocation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaDefinition {
    /// Display name.
    pub name: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Land-use category.
    pub category: AreaCategory,
}

impl From<&AreaDefinition> for Area {
    fn from(def: &AreaDefinition) -> Self {
        Self {
            name: def.name.clone(),
            coordinates: Coordinates::new(def.latitude, def.longitude),
            category: def.category,
        }
    }
}

impl CityLocation {
    /// Returns the city centre.
    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// [`AreaLookup`] backed by the embedded city registry.
///
/// Parses the registry once on construction.
#[derive(Debug, Clone)]
pub struct RegistryAreaLookup {
    cities: Vec<CityLocation>,
}

impl RegistryAreaLookup {
    /// Loads every registered city.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cities: all_cities(),
        }
    }

    /// Creates a lookup over a custom set of cities.
    #[must_use]
    pub const fn from_cities(cities: Vec<CityLocation>) -> Self {
        Self { cities }
    }

    /// Returns the loaded cities.
    #[must_use]
    pub fn cities(&self) -> &[CityLocation] {
        &self.cities
    }
}

impl Default for RegistryAreaLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl AreaLookup for RegistryAreaLookup {
    fn lookup_areas(&self, city: &str) -> Vec<Area> {
        registry::find_in(&self.cities, city).map_or_else(
            || {
                log::debug!("City '{city}' is not in the area registry");
                Vec::new()
            },
            |found| found.areas.iter().map(Area::from).collect(),
        )
    }
}
