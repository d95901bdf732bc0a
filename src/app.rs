//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments (prompting for missing ones)
//! - builds the HTTP clients
//! - runs fetch -> enrich -> aggregate
//! - prints reports and writes images
//! - writes the optional CSV export

use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::Parser;
use log::info;

use crate::cli::Cli;
use crate::cli::prompt::{prompt_count, prompt_taxon_id};
use crate::data::{INAT_MIN_INTERVAL, INatClient, NOAA_MIN_INTERVAL, NoaaClient, Throttled};
use crate::domain::{EnrichSettings, PresentOptions, RetryPolicy, RunConfig};
use crate::error::AppError;

pub mod pipeline;
pub mod present;

/// A CDO `/data` request returns at most 1000 rows; a ±30 day window of four
/// datatypes stays well inside one page.
pub const MAX_TOLERANCE_DAYS: u32 = 30;

/// Entry point for the `critters` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    let taxon_id = match cli.taxon_id {
        Some(id) => id,
        None => prompt_taxon_id()?,
    };
    let count = match cli.count {
        Some(n) => n,
        None => prompt_count()?,
    };
    let config = run_config_from_args(&cli, taxon_id, count)?;
    let today: NaiveDate = Local::now().date_naive();

    // The token is checked before any request is made. Every worker shares
    // one throttle per service.
    let weather = Throttled::new(NoaaClient::from_env(config.http_timeout)?, NOAA_MIN_INTERVAL);
    let observations = Throttled::new(INatClient::new(config.http_timeout)?, INAT_MIN_INTERVAL);

    let run = pipeline::run_pipeline(&config, &observations, &weather, today)?;

    let presentation = present::present(&run.dataset, run.taxon.as_ref(), &config.present)?;
    println!("{}", presentation.text);
    for path in &presentation.artifacts {
        info!("Wrote {}", path.display());
    }

    if let Some(path) = &config.export {
        crate::io::export::write_records_csv(path, &run.dataset.records)?;
        info!("Exported {} records to {}", run.dataset.len(), path.display());
    }

    Ok(())
}

pub fn run_config_from_args(cli: &Cli, taxon_id: i64, count: usize) -> Result<RunConfig, AppError> {
    if cli.workers == 0 {
        return Err(AppError::new(2, "--workers must be at least 1."));
    }
    if cli.max_attempts == 0 {
        return Err(AppError::new(2, "--max-attempts must be at least 1."));
    }
    if cli.http_timeout_secs == 0 {
        return Err(AppError::new(2, "--http-timeout-secs must be at least 1."));
    }
    if !(cli.search_radius_km.is_finite() && cli.search_radius_km > 0.0) {
        return Err(AppError::new(2, "--search-radius-km must be a positive number."));
    }
    if cli.tolerance_days > MAX_TOLERANCE_DAYS {
        return Err(AppError::new(
            2,
            format!("--tolerance-days must be at most {MAX_TOLERANCE_DAYS}."),
        ));
    }

    Ok(RunConfig {
        taxon_id,
        count,
        workers: cli.workers,
        run_timeout: cli.timeout_secs.map(Duration::from_secs),
        http_timeout: Duration::from_secs(cli.http_timeout_secs),
        enrich: EnrichSettings {
            tolerance_days: cli.tolerance_days,
            search_radius_km: cli.search_radius_km,
            max_stations: cli.max_stations,
        },
        retry: RetryPolicy {
            max_attempts: cli.max_attempts,
            ..RetryPolicy::default()
        },
        present: PresentOptions {
            out_dir: cli.out_dir.clone(),
            images: !cli.no_images,
            terminal_map: !cli.no_map,
            map_width: cli.width,
            map_height: cli.height,
        },
        export: cli.export.clone(),
    })
}
