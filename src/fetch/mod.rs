//! Taxon observation fetcher.
//!
//! Resolves the taxon, then pages through its observations until enough
//! usable ones (species + coordinates + date) are collected.

use std::collections::HashSet;
use std::time::Instant;

use chrono::NaiveDate;
use log::{debug, info, warn};

use crate::data::{ObservationQuery, ObservationRecord, ObservationSource, with_retry};
use crate::domain::{Observation, RetryPolicy, Taxon, valid_coordinates};
use crate::error::PipelineError;

/// Largest page size the observation API serves.
pub const MAX_PER_PAGE: usize = 200;

/// The API refuses to page past this many results.
pub const MAX_RESULT_WINDOW: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    /// Raw id as entered; must be a positive integer.
    pub taxon_id: i64,
    pub count: usize,
    /// Latest acceptable observation date.
    pub observed_before: NaiveDate,
    /// Stop paging once this instant has passed.
    pub deadline: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct Fetched {
    /// `None` only when no lookup was needed (`count == 0`).
    pub taxon: Option<Taxon>,
    pub observations: Vec<Observation>,
}

/// Fetch up to `request.count` usable observations for a taxon.
///
/// Fails with `Lookup` for an invalid or unknown taxon, before any observation
/// is requested. Never returns more than `count` observations.
pub fn fetch_observations(
    source: &dyn ObservationSource,
    request: &FetchRequest,
    retry: &RetryPolicy,
) -> Result<Fetched, PipelineError> {
    let taxon_id = u64::try_from(request.taxon_id)
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            PipelineError::Lookup(format!(
                "Invalid taxon id {}; expected a positive integer.",
                request.taxon_id
            ))
        })?;

    if request.count == 0 {
        return Ok(Fetched::default());
    }

    let taxon = with_retry(retry, "iNaturalist taxon lookup", || source.lookup_taxon(taxon_id))?
        .ok_or_else(|| PipelineError::Lookup(format!("Unknown taxon id {taxon_id}.")))?;
    info!("Fetching up to {} observations of {}", request.count, taxon.display_name());

    let per_page = request.count.min(MAX_PER_PAGE);
    let mut observations = Vec::with_capacity(request.count);
    let mut seen = HashSet::new();
    let mut page = 1;

    while observations.len() < request.count {
        if (page - 1) * per_page >= MAX_RESULT_WINDOW {
            info!("Reached the {MAX_RESULT_WINDOW}-result paging limit");
            break;
        }
        if page > 1 && request.deadline.is_some_and(|d| Instant::now() >= d) {
            warn!("Run deadline reached while paging; continuing with {} observations", observations.len());
            break;
        }

        let query = ObservationQuery {
            taxon_id,
            page,
            per_page,
            observed_before: request.observed_before,
        };
        let batch = with_retry(retry, "iNaturalist observations page", || source.list_observations(&query))?;
        let received = batch.records.len();

        for record in batch.records {
            if observations.len() >= request.count {
                break;
            }
            let id = record.id;
            match usable_observation(record, &taxon, request.observed_before) {
                Ok(obs) if seen.insert(obs.id) => observations.push(obs),
                Ok(_) => debug!("Skipping duplicate observation {id}"),
                Err(reason) => debug!("Skipping observation {id}: {reason}"),
            }
        }
        debug!("Page {page}: {received} records, {} usable so far", observations.len());

        if received == 0 || !batch.has_more {
            break;
        }
        page += 1;
    }

    info!("Fetched {} usable observations", observations.len());
    Ok(Fetched {
        taxon: Some(taxon),
        observations,
    })
}

/// Validate a raw record, returning why it is unusable otherwise.
fn usable_observation(
    record: ObservationRecord,
    taxon: &Taxon,
    observed_before: NaiveDate,
) -> Result<Observation, &'static str> {
    let (latitude, longitude) = record.coordinates.ok_or("no coordinates")?;
    if !valid_coordinates(latitude, longitude) {
        return Err("coordinates out of range");
    }
    let observed_date = record.observed_on.ok_or("no observation date")?;
    if observed_date > observed_before {
        return Err("observed too recently for weather data");
    }
    let species_name = record
        .species_guess
        .or(record.taxon_common_name)
        .or_else(|| taxon.common_name.clone())
        .or(record.taxon_name)
        .unwrap_or_else(|| taxon.name.clone());
    if species_name.trim().is_empty() {
        return Err("no species name");
    }

    Ok(Observation {
        id: record.id,
        species_name,
        latitude,
        longitude,
        observed_date,
        place_guess: record.place_guess,
    })
}
