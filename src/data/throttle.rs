//! Minimum spacing between requests to a rate-limited service.
//!
//! NOAA CDO allows 5 requests per second per token, and every enrichment
//! worker shares the same token. iNaturalist asks clients to stay near one
//! request per second. A `Throttle` hands out request slots at least
//! `min_interval` apart, across all threads holding it.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::data::{
    DailyValue, ObservationPage, ObservationQuery, ObservationSource, Station, WeatherSource,
};
use crate::domain::{BoundingBox, DateWindow, Taxon};
use crate::error::PipelineError;

/// 5 req/sec
pub const NOAA_MIN_INTERVAL: Duration = Duration::from_millis(200);
/// 1 req/sec
pub const INAT_MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Block until this caller's slot comes up.
    ///
    /// The slot is reserved under the lock and slept for outside it, so
    /// concurrent callers queue behind each other instead of waking together.
    pub fn wait(&self) {
        let slot = {
            let mut next = self.next_slot.lock().unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now();
            let slot = next.map_or(now, |n| n.max(now));
            *next = Some(slot + self.min_interval);
            slot
        };
        let now = Instant::now();
        if slot > now {
            thread::sleep(slot - now);
        }
    }
}

/// A source whose every request goes through a shared `Throttle`.
#[derive(Debug)]
pub struct Throttled<S> {
    inner: S,
    throttle: Throttle,
}

impl<S> Throttled<S> {
    pub fn new(inner: S, min_interval: Duration) -> Self {
        Self {
            inner,
            throttle: Throttle::new(min_interval),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: WeatherSource> WeatherSource for Throttled<S> {
    fn stations_near(&self, area: &BoundingBox, window: &DateWindow) -> Result<Vec<Station>, PipelineError> {
        self.throttle.wait();
        self.inner.stations_near(area, window)
    }

    fn daily_values(&self, station_id: &str, window: &DateWindow) -> Result<Vec<DailyValue>, PipelineError> {
        self.throttle.wait();
        self.inner.daily_values(station_id, window)
    }
}

impl<S: ObservationSource> ObservationSource for Throttled<S> {
    fn lookup_taxon(&self, taxon_id: u64) -> Result<Option<Taxon>, PipelineError> {
        self.throttle.wait();
        self.inner.lookup_taxon(taxon_id)
    }

    fn list_observations(&self, query: &ObservationQuery) -> Result<ObservationPage, PipelineError> {
        self.throttle.wait();
        self.inner.list_observations(query)
    }
}
