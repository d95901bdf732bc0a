//! Reporting utilities: rounding, per-species summaries and formatted terminal output.

use std::collections::BTreeMap;

use crate::domain::EnrichedRecord;

pub mod format;

pub use format::*;

/// Weather aggregated over all records of one species.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesSummary {
    pub species: String,
    pub observations: usize,
    /// Mean of the records' average temperatures (°F).
    pub mean_temp: f64,
    /// Sum of the records' precipitation (inches).
    pub total_rain: f64,
}

/// Summaries per species, sorted by species name.
pub fn summarize_by_species(records: &[EnrichedRecord]) -> Vec<SpeciesSummary> {
    let mut groups: BTreeMap<&str, (usize, f64, f64)> = BTreeMap::new();
    for r in records {
        let entry = groups.entry(r.species_name.as_str()).or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += r.avg_temp;
        entry.2 += r.rain;
    }

    groups
        .into_iter()
        .map(|(species, (n, temp_sum, rain_sum))| SpeciesSummary {
            species: species.to_string(),
            observations: n,
            mean_temp: temp_sum / n as f64,
            total_rain: rain_sum,
        })
        .collect()
}

/// Round to `decimals` places, ties to even (`34.5 -> 34`, `35.5 -> 36`).
pub fn round_half_even(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round_ties_even() / factor;
    // Avoid printing "-0".
    if rounded == 0.0 { 0.0 } else { rounded }
}
