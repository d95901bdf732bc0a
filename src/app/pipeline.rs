//! The fetch -> enrich -> aggregate workflow, independent of the real services.
//!
//! Sources are passed in as trait objects so the same code runs against the
//! HTTP clients in the binary and against in-memory fakes in tests.

use std::time::Instant;

use chrono::{Days, NaiveDate};
use log::info;

use crate::aggregate::aggregate;
use crate::data::{ObservationSource, WeatherSource};
use crate::domain::{Dataset, RunConfig, Taxon};
use crate::enrich::{Enricher, enrich_all};
use crate::error::PipelineError;
use crate::fetch::{FetchRequest, fetch_observations};

/// Daily summaries lag real time; newer observations are not requested.
pub const OBSERVATION_LAG_DAYS: u64 = 2;

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// `None` when nothing was requested.
    pub taxon: Option<Taxon>,
    pub dataset: Dataset,
}

/// Execute the full pipeline.
///
/// `today` anchors the observation cutoff and the "date in the past" check.
pub fn run_pipeline(
    config: &RunConfig,
    observations: &dyn ObservationSource,
    weather: &dyn WeatherSource,
    today: NaiveDate,
) -> Result<RunOutput, PipelineError> {
    let deadline = config.run_timeout.map(|t| Instant::now() + t);
    let observed_before = today.checked_sub_days(Days::new(OBSERVATION_LAG_DAYS)).unwrap_or(today);

    // 1) Fetch observations.
    let request = FetchRequest {
        taxon_id: config.taxon_id,
        count: config.count,
        observed_before,
        deadline,
    };
    let fetched = fetch_observations(observations, &request, &config.retry)?;

    // 2) Enrich with weather.
    let enricher = Enricher::new(weather, config.enrich.clone(), config.retry.clone(), today);
    let enrichments = enrich_all(&enricher, &fetched.observations, config.workers, deadline)?;

    // 3) Join.
    let mut dataset = aggregate(fetched.observations, enrichments)?;
    dataset.stats.requested = config.count;

    info!(
        "Run complete: {} of {} requested observations enriched",
        dataset.len(),
        config.count
    );
    Ok(RunOutput {
        taxon: fetched.taxon,
        dataset,
    })
}
