//! Shared domain types.
//!
//! These types are intentionally kept small and immutable once built so they can be:
//!
//! - passed between pipeline stages (and worker threads) without locking
//! - exported to CSV
//! - rendered by the presenter without further lookups

use std::path::PathBuf;
use std::time::Duration;

use chrono::{Days, NaiveDate};
use serde::Serialize;

/// A taxon resolved from the observation source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxon {
    pub id: u64,
    /// Scientific name (e.g. `Ariolimax buttoni`).
    pub name: String,
    /// Preferred common name, if the source knows one.
    pub common_name: Option<String>,
    pub rank: Option<String>,
}

impl Taxon {
    /// Human-readable label for terminal output.
    pub fn display_name(&self) -> String {
        match &self.common_name {
            Some(common) if !common.trim().is_empty() => format!("{common} ({})", self.name),
            _ => self.name.clone(),
        }
    }
}

/// A single usable sighting: it always has a species, coordinates and a date.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Observation id at the source.
    pub id: u64,
    pub species_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub observed_date: NaiveDate,
    pub place_guess: Option<String>,
}

/// Weather recorded near one observation.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSample {
    /// Average daily temperature (°F).
    pub avg_temp: f64,
    /// Daily precipitation (inches, never negative).
    pub rain: f64,
    pub station_id: String,
    pub station_name: String,
    pub station_distance_km: Option<f64>,
    /// Date the values were recorded on (within the tolerance window).
    pub sample_date: NaiveDate,
}

/// One observation joined with its weather.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    pub observation_id: u64,
    pub species_name: String,
    pub avg_temp: f64,
    pub rain: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub observed_date: NaiveDate,
    pub station_id: String,
    pub station_name: String,
    pub station_distance_km: Option<f64>,
    /// Free-text locality reported by the observer.
    pub place_guess: Option<String>,
}

impl EnrichedRecord {
    /// Column names, in serialization order.
    pub const CSV_HEADER: [&'static str; 11] = [
        "observation_id",
        "species_name",
        "avg_temp",
        "rain",
        "latitude",
        "longitude",
        "observed_date",
        "station_id",
        "station_name",
        "station_distance_km",
        "place_guess",
    ];

    pub fn join(observation: &Observation, sample: &WeatherSample) -> Self {
        Self {
            observation_id: observation.id,
            species_name: observation.species_name.clone(),
            avg_temp: sample.avg_temp,
            rain: sample.rain,
            latitude: observation.latitude,
            longitude: observation.longitude,
            observed_date: observation.observed_date,
            station_id: sample.station_id.clone(),
            station_name: sample.station_name.clone(),
            station_distance_km: sample.station_distance_km,
            place_guess: observation.place_guess.clone(),
        }
    }
}

/// Counters describing how the dataset was produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetStats {
    pub requested: usize,
    pub fetched: usize,
    pub dropped_no_coverage: usize,
    pub dropped_deadline: usize,
}

/// The joined result of a run, in observation order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<EnrichedRecord>,
    pub stats: DatasetStats,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Inclusive date range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// `date ± tolerance_days`.
    pub fn around(date: NaiveDate, tolerance_days: u32) -> Self {
        let days = Days::new(u64::from(tolerance_days));
        Self {
            start: date.checked_sub_days(days).unwrap_or(date),
            end: date.checked_add_days(days).unwrap_or(date),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Whether `[first, last]` overlaps this window. Missing bounds are treated as open.
    pub fn overlaps(&self, first: Option<NaiveDate>, last: Option<NaiveDate>) -> bool {
        first.is_none_or(|first| first <= self.end) && last.is_none_or(|last| last >= self.start)
    }
}

/// Knobs for the station search done by the weather enricher.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichSettings {
    /// Days before/after the observation date that still count as coverage.
    pub tolerance_days: u32,
    /// Radius (km) around the observation searched for stations.
    pub search_radius_km: f64,
    /// How many of the nearest stations are tried before giving up.
    pub max_stations: usize,
}

impl Default for EnrichSettings {
    fn default() -> Self {
        Self {
            tolerance_days: 2,
            search_radius_km: 50.0,
            max_stations: 3,
        }
    }
}

/// Retry schedule for transient request failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for every further attempt.
    pub base_delay: Duration,
    /// Upper bound of the random jitter added to each delay.
    pub max_jitter: Duration,
}

impl RetryPolicy {
    /// Retry without sleeping (used by tests and fakes).
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_jitter: Duration::from_millis(100),
        }
    }
}

/// What the presenter renders and where.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentOptions {
    /// Directory receiving the SVG artifacts.
    pub out_dir: PathBuf,
    /// Write the map and graph images.
    pub images: bool,
    /// Print the character-grid map to the terminal.
    pub terminal_map: bool,
    pub map_width: usize,
    pub map_height: usize,
}

impl Default for PresentOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            images: true,
            terminal_map: true,
            map_width: 80,
            map_height: 24,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus prompts and defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Raw taxon id as entered; validated by the fetcher.
    pub taxon_id: i64,
    /// Number of observations to collect.
    pub count: usize,
    /// Size of the enrichment worker pool.
    pub workers: usize,
    /// Overall run timeout; records not enriched in time are dropped.
    pub run_timeout: Option<Duration>,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    pub enrich: EnrichSettings,
    pub retry: RetryPolicy,
    pub present: PresentOptions,
    /// Optional CSV export of the dataset.
    pub export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_window_spans_tolerance_on_both_sides() {
        let window = DateWindow::around(date(2024, 3, 1), 2);
        assert_eq!(window.start, date(2024, 2, 28));
        assert_eq!(window.end, date(2024, 3, 3));
        assert!(window.contains(date(2024, 2, 29)));
        assert!(!window.contains(date(2024, 3, 4)));
    }

    #[test]
    fn date_window_overlap_treats_missing_bounds_as_open() {
        let window = DateWindow::around(date(2024, 3, 1), 1);
        assert!(window.overlaps(None, None));
        assert!(window.overlaps(Some(date(1990, 1, 1)), Some(date(2024, 2, 29))));
        assert!(!window.overlaps(Some(date(1990, 1, 1)), Some(date(2024, 2, 28))));
        assert!(!window.overlaps(Some(date(2024, 3, 3)), None));
    }

    #[test]
    fn taxon_display_prefers_common_name() {
        let mut taxon = Taxon {
            id: 629866,
            name: "Ariolimax buttoni".to_string(),
            common_name: Some("Button's Banana Slug".to_string()),
            rank: Some("species".to_string()),
        };
        assert_eq!(taxon.display_name(), "Button's Banana Slug (Ariolimax buttoni)");

        taxon.common_name = None;
        assert_eq!(taxon.display_name(), "Ariolimax buttoni");
    }
}
