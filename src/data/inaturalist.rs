//! iNaturalist API integration (taxa + observations).

use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::data::{ObservationPage, ObservationQuery, ObservationRecord, ObservationSource, USER_AGENT, request_error};
use crate::domain::Taxon;
use crate::error::PipelineError;

const BASE_URL: &str = "https://api.inaturalist.org/v1";

pub struct INatClient {
    client: Client,
    base_url: String,
}

impl INatClient {
    pub fn new(http_timeout: Duration) -> Result<Self, PipelineError> {
        Self::with_base_url(BASE_URL, http_timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, http_timeout: Duration) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(http_timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build iNaturalist HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// GET `path` and decode the JSON body; `Ok(None)` on 404.
    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, PipelineError> {
        let url = format!("{}{path}", self.base_url);
        debug!("GET {url} {query:?}");

        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| request_error("iNaturalist", &e))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(classify_status(status));
        }

        resp.json::<T>()
            .map(Some)
            .map_err(|e| request_error("iNaturalist", &e))
    }
}

impl ObservationSource for INatClient {
    fn lookup_taxon(&self, taxon_id: u64) -> Result<Option<Taxon>, PipelineError> {
        let body: Option<TaxaResponse> = self.get_json(&format!("/taxa/{taxon_id}"), &[])?;
        Ok(body
            .and_then(|b| b.results.into_iter().find(|t| t.id == taxon_id))
            .map(|t| Taxon {
                id: t.id,
                name: t.name,
                common_name: t.preferred_common_name,
                rank: t.rank,
            }))
    }

    fn list_observations(&self, query: &ObservationQuery) -> Result<ObservationPage, PipelineError> {
        let params = [
            ("taxon_id", query.taxon_id.to_string()),
            ("per_page", query.per_page.to_string()),
            ("page", query.page.to_string()),
            ("geo", "true".to_string()),
            ("d2", query.observed_before.format("%Y-%m-%d").to_string()),
            ("order_by", "observed_on".to_string()),
            ("order", "desc".to_string()),
        ];
        let body: ObservationsResponse = self
            .get_json("/observations", &params)?
            .ok_or_else(|| PipelineError::Lookup(format!("No observations endpoint for taxon {}", query.taxon_id)))?;

        Ok(body.into_page(query))
    }
}

/// Map a non-success HTTP status to the error taxonomy.
///
/// Rate limiting and server errors are retryable; anything else means the
/// service has nothing for this request.
fn classify_status(status: StatusCode) -> PipelineError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        PipelineError::Transient(format!("iNaturalist request failed with status {status}."))
    } else {
        PipelineError::Lookup(format!("iNaturalist request failed with status {status}."))
    }
}

#[derive(Debug, Deserialize)]
struct TaxaResponse {
    #[serde(default)]
    results: Vec<TaxonJson>,
}

#[derive(Debug, Deserialize)]
struct TaxonJson {
    id: u64,
    name: String,
    preferred_common_name: Option<String>,
    rank: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    total_results: usize,
    #[serde(default)]
    results: Vec<ObservationJson>,
}

impl ObservationsResponse {
    fn into_page(self, query: &ObservationQuery) -> ObservationPage {
        let has_more = !self.results.is_empty() && query.page * query.per_page < self.total_results;
        ObservationPage {
            records: self.results.into_iter().map(ObservationJson::into_record).collect(),
            has_more,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ObservationJson {
    id: u64,
    species_guess: Option<String>,
    observed_on: Option<String>,
    time_observed_at: Option<String>,
    /// `"lat,lon"`.
    location: Option<String>,
    geojson: Option<GeoJsonPoint>,
    place_guess: Option<String>,
    taxon: Option<ObservationTaxonJson>,
}

#[derive(Debug, Deserialize)]
struct GeoJsonPoint {
    /// `[lon, lat]`.
    #[serde(default)]
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ObservationTaxonJson {
    name: Option<String>,
    preferred_common_name: Option<String>,
}

impl ObservationJson {
    fn into_record(self) -> ObservationRecord {
        let coordinates = self
            .location
            .as_deref()
            .and_then(parse_location)
            .or_else(|| match self.geojson.as_ref().map(|g| g.coordinates.as_slice()) {
                Some(&[lon, lat]) => Some((lat, lon)),
                _ => None,
            });
        let observed_on = self
            .observed_on
            .as_deref()
            .and_then(parse_date)
            .or_else(|| self.time_observed_at.as_deref().and_then(parse_timestamp_date));
        let (taxon_name, taxon_common_name) = self
            .taxon
            .map(|t| (t.name, t.preferred_common_name))
            .unwrap_or_default();

        ObservationRecord {
            id: self.id,
            species_guess: non_empty(self.species_guess),
            taxon_name: non_empty(taxon_name),
            taxon_common_name: non_empty(taxon_common_name),
            coordinates,
            observed_on,
            place_guess: non_empty(self.place_guess),
        }
    }
}

/// Parse iNaturalist's `"lat,lon"` location string.
fn parse_location(raw: &str) -> Option<(f64, f64)> {
    let (lat, lon) = raw.split_once(',')?;
    let lat = lat.trim().parse::<f64>().ok()?;
    let lon = lon.trim().parse::<f64>().ok()?;
    (lat.is_finite() && lon.is_finite()).then_some((lat, lon))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Date part of an RFC 3339 timestamp, in the observer's own offset.
fn parse_timestamp_date(raw: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(raw.trim()).ok().map(|dt| dt.date_naive())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
