//! Upstream data sources.
//!
//! The pipeline only talks to the two services through the traits below, so
//! the fetcher and enricher can be exercised against in-memory sources:
//!
//! - `ObservationSource`: taxon lookup + paginated observations (iNaturalist)
//! - `WeatherSource`: station search + daily summaries (NOAA CDO, GHCND)

use chrono::NaiveDate;

use crate::domain::{BoundingBox, DateWindow, Taxon};
use crate::error::PipelineError;

pub mod inaturalist;
pub mod noaa;
pub mod retry;
pub mod throttle;

pub use inaturalist::INatClient;
pub use noaa::{NoaaClient, NoaaToken};
pub use retry::with_retry;
pub use throttle::{INAT_MIN_INTERVAL, NOAA_MIN_INTERVAL, Throttle, Throttled};

/// User-Agent sent to both services.
pub const USER_AGENT: &str = concat!("critter-weather/", env!("CARGO_PKG_VERSION"));

/// One page request for a taxon's observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationQuery {
    pub taxon_id: u64,
    /// 1-based page number.
    pub page: usize,
    pub per_page: usize,
    /// Only observations made on or before this date are requested.
    pub observed_before: NaiveDate,
}

/// An observation as delivered by the source; every field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationRecord {
    pub id: u64,
    pub species_guess: Option<String>,
    pub taxon_name: Option<String>,
    pub taxon_common_name: Option<String>,
    /// `(latitude, longitude)`.
    pub coordinates: Option<(f64, f64)>,
    pub observed_on: Option<NaiveDate>,
    pub place_guess: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationPage {
    pub records: Vec<ObservationRecord>,
    pub has_more: bool,
}

pub trait ObservationSource {
    /// Resolve a taxon id; `Ok(None)` when the source does not know it.
    fn lookup_taxon(&self, taxon_id: u64) -> Result<Option<Taxon>, PipelineError>;

    fn list_observations(&self, query: &ObservationQuery) -> Result<ObservationPage, PipelineError>;
}

/// A weather station with its period of record.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

/// GHCND daily datatypes the enricher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Datatype {
    /// Average temperature.
    Tavg,
    /// Maximum temperature.
    Tmax,
    /// Minimum temperature.
    Tmin,
    /// Precipitation.
    Prcp,
}

impl Datatype {
    pub const ALL: [Datatype; 4] = [Datatype::Tavg, Datatype::Tmax, Datatype::Tmin, Datatype::Prcp];

    pub fn code(self) -> &'static str {
        match self {
            Datatype::Tavg => "TAVG",
            Datatype::Tmax => "TMAX",
            Datatype::Tmin => "TMIN",
            Datatype::Prcp => "PRCP",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.code() == code)
    }
}

/// One daily value reported by a station (standard units: °F, inches).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyValue {
    pub date: NaiveDate,
    pub datatype: Datatype,
    pub value: f64,
}

/// Weather source shared across enrichment workers.
pub trait WeatherSource: Sync {
    /// Stations inside `area` reporting data that overlaps `window`.
    fn stations_near(&self, area: &BoundingBox, window: &DateWindow) -> Result<Vec<Station>, PipelineError>;

    /// Daily values recorded by `station_id` during `window`.
    fn daily_values(&self, station_id: &str, window: &DateWindow) -> Result<Vec<DailyValue>, PipelineError>;
}

/// Classify a failed `send()` / body read. All of these are worth retrying.
pub(crate) fn request_error(service: &str, err: &reqwest::Error) -> PipelineError {
    if err.is_timeout() {
        PipelineError::Transient(format!("{service} request timed out"))
    } else if err.is_decode() {
        PipelineError::Transient(format!("{service} returned an unreadable body: {err}"))
    } else {
        PipelineError::Transient(format!("{service} request failed: {err}"))
    }
}
