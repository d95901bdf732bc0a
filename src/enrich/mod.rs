//! Weather enrichment.
//!
//! For each observation: find the nearest GHCND station with data around the
//! observation date, and read that day's average temperature and precipitation.
//!
//! `enrich_all` fans the per-observation work out over a bounded `rayon` pool.
//! Tasks share nothing mutable; each returns its own result and the caller
//! receives them in observation order.

use std::time::Instant;

use chrono::NaiveDate;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::data::{WeatherSource, with_retry};
use crate::domain::{BoundingBox, DateWindow, EnrichSettings, Observation, RetryPolicy, WeatherSample, valid_coordinates};
use crate::error::PipelineError;

pub mod station;

pub use station::{DailyReading, RankedStation, closest_reading, rank_stations};

/// Per-observation enrichment outcome: a sample, or a recoverable drop.
pub type Enrichment = Result<WeatherSample, PipelineError>;

pub struct Enricher<'a> {
    source: &'a dyn WeatherSource,
    settings: EnrichSettings,
    retry: RetryPolicy,
    today: NaiveDate,
}

impl<'a> Enricher<'a> {
    pub fn new(source: &'a dyn WeatherSource, settings: EnrichSettings, retry: RetryPolicy, today: NaiveDate) -> Self {
        Self {
            source,
            settings,
            retry,
            today,
        }
    }

    /// Weather for one observation.
    ///
    /// Fails with `NoCoverage` when no station nearby has a complete reading
    /// inside the tolerance window; `Auth` and exhausted `Transient` failures
    /// are passed through.
    pub fn enrich(&self, obs: &Observation) -> Result<WeatherSample, PipelineError> {
        if !valid_coordinates(obs.latitude, obs.longitude) {
            return Err(PipelineError::NoCoverage(format!(
                "observation {} has invalid coordinates ({}, {})",
                obs.id, obs.latitude, obs.longitude
            )));
        }
        if obs.observed_date >= self.today {
            return Err(PipelineError::NoCoverage(format!(
                "observation {} is dated {}, not in the past",
                obs.id, obs.observed_date
            )));
        }

        let window = DateWindow::around(obs.observed_date, self.settings.tolerance_days);
        let area = BoundingBox::around(obs.latitude, obs.longitude, self.settings.search_radius_km);

        let stations = with_retry(&self.retry, "NOAA station search", || {
            self.source.stations_near(&area, &window)
        })?;
        let ranked = rank_stations(
            stations,
            obs.latitude,
            obs.longitude,
            &window,
            self.settings.search_radius_km,
        );

        for candidate in ranked.into_iter().take(self.settings.max_stations) {
            let values = with_retry(&self.retry, "NOAA daily data", || {
                self.source.daily_values(&candidate.station.id, &window)
            })?;
            match closest_reading(&values, obs.observed_date) {
                Some(reading) => {
                    return Ok(WeatherSample {
                        avg_temp: reading.avg_temp,
                        rain: reading.rain,
                        station_id: candidate.station.id,
                        station_name: candidate.station.name,
                        station_distance_km: Some(candidate.distance_km),
                        sample_date: reading.date,
                    });
                }
                None => debug!(
                    "Station {} has no complete reading near {} for observation {}",
                    candidate.station.id, obs.observed_date, obs.id
                ),
            }
        }

        Err(PipelineError::NoCoverage(format!(
            "no station within {:.0} km of observation {} has data within {} day(s) of {}",
            self.settings.search_radius_km, obs.id, self.settings.tolerance_days, obs.observed_date
        )))
    }
}

/// Enrich every observation on a pool of `workers` threads.
///
/// The outer `Err` is the first fatal failure (auth, exhausted retries);
/// remaining work is abandoned. Otherwise the vector holds one entry per
/// observation, in order: a sample, `NoCoverage`, or `DeadlineExceeded` for
/// work that would have started after `deadline`.
pub fn enrich_all(
    enricher: &Enricher<'_>,
    observations: &[Observation],
    workers: usize,
    deadline: Option<Instant>,
) -> Result<Vec<Enrichment>, PipelineError> {
    if observations.is_empty() {
        return Ok(Vec::new());
    }
    info!("Enriching {} observations with {} worker(s)", observations.len(), workers.max(1));

    let run = || {
        observations
            .par_iter()
            .map(|obs| enrich_one(enricher, obs, deadline))
            .collect::<Result<Vec<_>, _>>()
    };

    match rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("enrich-{i}"))
        .build()
    {
        Ok(pool) => pool.install(run),
        Err(e) => {
            warn!("Failed to start the enrichment pool ({e}); enriching sequentially");
            observations
                .iter()
                .map(|obs| enrich_one(enricher, obs, deadline))
                .collect()
        }
    }
}

/// Split the outcome: recoverable failures become data, fatal ones abort.
fn enrich_one(
    enricher: &Enricher<'_>,
    obs: &Observation,
    deadline: Option<Instant>,
) -> Result<Enrichment, PipelineError> {
    if deadline.is_some_and(|d| Instant::now() >= d) {
        return Ok(Err(PipelineError::DeadlineExceeded(format!("observation {}", obs.id))));
    }
    match enricher.enrich(obs) {
        Ok(sample) => Ok(Ok(sample)),
        Err(err) if err.is_recoverable() => {
            debug!("Dropping observation {}: {err}", obs.id);
            Ok(Err(err))
        }
        Err(err) => Err(err),
    }
}
