//! Weighted random selection over frequency tables.

use crime_forecast_models::FrequencyTable;
use rand::Rng;

/// Picks a key with probability proportional to its count.
///
/// Draws a uniform value in `[0, total)` and walks the non-zero entries in
/// insertion order, subtracting each count; the first entry that brings
/// the running value to zero or below wins. Returns `None` when the table
/// carries no weight.
#[allow(clippy::cast_precision_loss)]
pub fn select_weighted<'a, K, R: Rng + ?Sized>(
    table: &'a FrequencyTable<K>,
    rng: &mut R,
) -> Option<&'a K> {
    let total = table.total();
    if total == 0 {
        return None;
    }

    let mut remaining = rng.random::<f64>() * total as f64;
    let mut last = None;

    for (key, count) in table.iter() {
        if count == 0 {
            continue;
        }
        remaining -= count as f64;
        if remaining <= 0.0 {
            return Some(key);
        }
        last = Some(key);
    }

    // Only reachable through floating point rounding at the very top of the
    // range.
    last
}
