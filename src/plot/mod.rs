//! Plots of the enriched dataset.
//!
//! - terminal map (`ascii`)
//! - SVG map of observation locations (`map`)
//! - SVG weather graphs: per-species bars and a temperature histogram (`graphs`)

use std::collections::BTreeSet;

use plotters::style::RGBColor;

use crate::domain::EnrichedRecord;
use crate::error::PipelineError;

pub mod ascii;
pub mod graphs;
pub mod map;

pub use ascii::render_ascii_map;
pub use graphs::{HistogramBin, histogram_bins, write_species_weather_svg, write_temperature_histogram_svg};
pub use map::{MapBounds, map_bounds, write_map_svg};

/// The ten "Tableau" colors, in their usual order.
pub const TABLEAU_10: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Distinct species names, sorted.
pub fn species_names(records: &[EnrichedRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.species_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// A color per species (sorted by name), cycling through `TABLEAU_10`.
pub fn species_colors(records: &[EnrichedRecord]) -> Vec<(String, RGBColor)> {
    species_names(records)
        .into_iter()
        .zip(TABLEAU_10.iter().copied().cycle())
        .collect()
}

pub(crate) fn draw_error(what: &str, err: impl std::fmt::Display) -> PipelineError {
    PipelineError::Output(format!("Failed to draw {what}: {err}"))
}
