//! Command-line parsing for the observation weather tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline stages. Missing required values are asked for interactively (`prompt`).

use std::path::PathBuf;

use clap::Parser;

pub mod prompt;

/// Top-level CLI.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "critters",
    version,
    about = "Fetch iNaturalist observations of a taxon and join them with NOAA weather"
)]
pub struct Cli {
    /// iNaturalist taxon id (prompted for when omitted).
    #[arg(short = 't', long, allow_negative_numbers = true)]
    pub taxon_id: Option<i64>,

    /// Number of observations to collect (prompted for when omitted).
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Enrichment worker threads.
    #[arg(short = 'w', long, default_value_t = 4)]
    pub workers: usize,

    /// Overall run timeout in seconds; observations not enriched in time are dropped.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Days before/after the observation date accepted for weather data (at most 30).
    #[arg(long, default_value_t = 2)]
    pub tolerance_days: u32,

    /// Radius (km) searched for weather stations around each observation.
    #[arg(long, default_value_t = 50.0)]
    pub search_radius_km: f64,

    /// Nearest stations tried per observation.
    #[arg(long, default_value_t = 3)]
    pub max_stations: usize,

    /// Attempts per request for transient failures (including the first one).
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,

    /// Directory for the map and graph images.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Export the enriched dataset to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Skip writing the map and graph images.
    #[arg(long)]
    pub no_images: bool,

    /// Skip the terminal map.
    #[arg(long)]
    pub no_map: bool,

    /// Terminal map width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Terminal map height (rows).
    #[arg(long, default_value_t = 24)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_ids_given() {
        let cli = Cli::parse_from(["critters", "--taxon-id", "629866", "--count", "10"]);
        assert_eq!(cli.taxon_id, Some(629866));
        assert_eq!(cli.count, Some(10));
        assert_eq!(cli.workers, 4);
        assert_eq!(cli.http_timeout_secs, 30);
        assert_eq!(cli.tolerance_days, 2);
        assert_eq!(cli.search_radius_km, 50.0);
        assert_eq!(cli.max_stations, 3);
        assert_eq!(cli.max_attempts, 3);
        assert_eq!(cli.out_dir, PathBuf::from("."));
        assert!(cli.timeout_secs.is_none());
        assert!(!cli.no_images);
    }

    #[test]
    fn ids_are_optional() {
        let cli = Cli::parse_from(["critters"]);
        assert!(cli.taxon_id.is_none());
        assert!(cli.count.is_none());
    }

    #[test]
    fn negative_taxon_id_reaches_validation() {
        let cli = Cli::parse_from(["critters", "-t", "-5", "-n", "3"]);
        assert_eq!(cli.taxon_id, Some(-5));
    }
}
