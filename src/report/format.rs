//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline stages stay free of presentation concerns
//! - output changes are localized (rounding rules live here and in `round_half_even`)

use crate::domain::{DatasetStats, EnrichedRecord, Taxon};
use crate::report::{SpeciesSummary, round_half_even};

/// Header with the taxon and the run's counters.
pub fn format_run_summary(taxon: Option<&Taxon>, stats: &DatasetStats, enriched: usize) -> String {
    let mut out = String::new();

    out.push_str("=== critters - observation weather ===\n");
    if let Some(taxon) = taxon {
        match &taxon.rank {
            Some(rank) => out.push_str(&format!("Taxon: {} [{rank}, id {}]\n", taxon.display_name(), taxon.id)),
            None => out.push_str(&format!("Taxon: {} [id {}]\n", taxon.display_name(), taxon.id)),
        }
    }
    out.push_str(&format!(
        "Observations: requested={} fetched={} enriched={}\n",
        stats.requested, stats.fetched, enriched
    ));
    out.push_str(&format!(
        "Dropped: no_coverage={} deadline={}\n",
        stats.dropped_no_coverage, stats.dropped_deadline
    ));

    out
}

/// Explicit empty-state message, shown instead of tables and plots.
pub fn format_no_data(stats: &DatasetStats) -> String {
    format!(
        "No data: no observations with usable weather data (requested={}, fetched={}).\n",
        stats.requested, stats.fetched
    )
}

/// One row per record: species, avg_temp (°F, integer), rain (in, 2 decimals), location, date, station, place.
pub fn format_records_table(records: &[EnrichedRecord]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<28} {:>8} {:>6} {:>9} {:>10} {:<10} {:<20} {:<24}",
            "species", "avg_temp", "rain", "lat", "lon", "date", "station", "place"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<28} {:-<8} {:-<6} {:-<9} {:-<10} {:-<10} {:-<20} {:-<24}",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in records {
        out.push_str(
            format!(
                "{:<28} {:>8} {:>6} {:>9.4} {:>10.4} {:<10} {:<20} {:<24}",
                truncate(&r.species_name, 28),
                fmt_temp(r.avg_temp),
                fmt_rain(r.rain),
                r.latitude,
                r.longitude,
                r.observed_date,
                truncate(&r.station_id, 20),
                truncate(r.place_guess.as_deref().unwrap_or(""), 24),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Mean temperature and total rain per species.
pub fn format_species_table(summaries: &[SpeciesSummary]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<28} {:>5} {:>8} {:>10}\n",
        "species", "n", "avg_temp", "total_rain"
    ));
    out.push_str(&format!("{:-<28} {:-<5} {:-<8} {:-<10}\n", "", "", "", ""));

    for s in summaries {
        out.push_str(&format!(
            "{:<28} {:>5} {:>8} {:>10}\n",
            truncate(&s.species, 28),
            s.observations,
            fmt_temp(s.mean_temp),
            fmt_rain(s.total_rain),
        ));
    }

    out
}

/// Temperatures are shown as whole degrees.
pub fn fmt_temp(v: f64) -> String {
    format!("{:.0}", round_half_even(v, 0))
}

/// Rain is shown with two decimals.
pub fn fmt_rain(v: f64) -> String {
    format!("{:.2}", round_half_even(v, 2))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
