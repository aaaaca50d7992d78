//! Compile-time registry of cities and their named areas.
//!
//! Each entry is a `(id, toml_content)` pair embedded via `include_str!`.
//! Adding a city requires creating a TOML file in `cities/` and adding a
//! corresponding entry here.

use crate::CityLocation;

/// Number of registered cities. Enforced by a test.
#[cfg(test)]
const EXPECTED_CITY_COUNT: usize = 29;

/// Embedded TOML city definitions.
const CITY_TOMLS: &[(&str, &str)] = &[
    ("delhi", include_str!("../cities/delhi.toml")),
    ("mumbai", include_str!("../cities/mumbai.toml")),
    ("chennai", include_str!("../cities/chennai.toml")),
    ("bangalore", include_str!("../cities/bangalore.toml")),
    ("pune", include_str!("../cities/pune.toml")),
    ("hyderabad", include_str!("../cities/hyderabad.toml")),
    ("ahmedabad", include_str!("../cities/ahmedabad.toml")),
    ("kolkata", include_str!("../cities/kolkata.toml")),
    ("jaipur", include_str!("../cities/jaipur.toml")),
    ("lucknow", include_str!("../cities/lucknow.toml")),
    ("kanpur", include_str!("../cities/kanpur.toml")),
    ("surat", include_str!("../cities/surat.toml")),
    ("nagpur", include_str!("../cities/nagpur.toml")),
    ("agra", include_str!("../cities/agra.toml")),
    ("ludhiana", include_str!("../cities/ludhiana.toml")),
    ("visakhapatnam", include_str!("../cities/visakhapatnam.toml")),
    ("indore", include_str!("../cities/indore.toml")),
    ("thane", include_str!("../cities/thane.toml")),
    ("ghaziabad", include_str!("../cities/ghaziabad.toml")),
    ("patna", include_str!("../cities/patna.toml")),
    ("bhopal", include_str!("../cities/bhopal.toml")),
    ("meerut", include_str!("../cities/meerut.toml")),
    ("srinagar", include_str!("../cities/srinagar.toml")),
    ("nashik", include_str!("../cities/nashik.toml")),
    ("vasai", include_str!("../cities/vasai.toml")),
    ("varanasi", include_str!("../cities/varanasi.toml")),
    ("kalyan", include_str!("../cities/kalyan.toml")),
    ("faridabad", include_str!("../cities/faridabad.toml")),
    ("rajkot", include_str!("../cities/rajkot.toml")),
];

/// Returns all registered cities in registry order.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development error
/// and are caught by the tests below.
#[must_use]
pub fn all_cities() -> Vec<CityLocation> {
    CITY_TOMLS
        .iter()
        .map(|(id, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse city definition '{id}': {e}"))
        })
        .collect()
}

/// Finds a city by display name, exact match first, then ignoring ASCII
/// case and surrounding whitespace.
#[must_use]
pub fn find_city(name: &str) -> Option<CityLocation> {
    find_in(&all_cities(), name).cloned()
}

pub(crate) fn find_in<'a>(cities: &'a [CityLocation], name: &str) -> Option<&'a CityLocation> {
    let trimmed = name.trim();
    cities.iter().find(|c| c.name == name).or_else(|| {
        cities
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(trimmed))
    })
}
