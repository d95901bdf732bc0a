//! In-memory sources shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::data::{
    DailyValue, Datatype, ObservationPage, ObservationQuery, ObservationRecord, ObservationSource, Station,
    WeatherSource,
};
use crate::domain::{BoundingBox, DateWindow, Taxon};
use crate::error::PipelineError;

pub(crate) fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn slug_taxon() -> Taxon {
    Taxon {
        id: 629866,
        name: "Ariolimax buttoni".to_string(),
        common_name: Some("Button's Banana Slug".to_string()),
        rank: Some("species".to_string()),
    }
}

/// A usable slug sighting near Berkeley on 2024-01-14.
pub(crate) fn record(id: u64) -> ObservationRecord {
    ObservationRecord {
        id,
        species_guess: Some("Button's Banana Slug".to_string()),
        taxon_name: Some("Ariolimax buttoni".to_string()),
        taxon_common_name: Some("Button's Banana Slug".to_string()),
        coordinates: Some((37.87 + id as f64 * 0.0001, -122.26)),
        observed_on: Some(ymd(2024, 1, 14)),
        place_guess: None,
    }
}

pub(crate) struct FakeObservationSource {
    taxa: Vec<Taxon>,
    records: Vec<ObservationRecord>,
    fail_first: usize,
    calls: AtomicUsize,
    list_calls: AtomicUsize,
    pages: AtomicUsize,
}

impl FakeObservationSource {
    pub(crate) fn new(taxa: Vec<Taxon>, records: Vec<ObservationRecord>) -> Self {
        Self {
            taxa,
            records,
            fail_first: 0,
            calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            pages: AtomicUsize::new(0),
        }
    }

    /// Fail the first `n` page requests with a transient error.
    pub(crate) fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    /// Total requests (lookups + pages, including failed ones).
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Pages successfully served.
    pub(crate) fn pages_served(&self) -> usize {
        self.pages.load(Ordering::SeqCst)
    }
}

impl ObservationSource for FakeObservationSource {
    fn lookup_taxon(&self, taxon_id: u64) -> Result<Option<Taxon>, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.taxa.iter().find(|t| t.id == taxon_id).cloned())
    }

    fn list_observations(&self, query: &ObservationQuery) -> Result<ObservationPage, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.list_calls.fetch_add(1, Ordering::SeqCst) < self.fail_first {
            return Err(PipelineError::Transient("simulated timeout".to_string()));
        }
        self.pages.fetch_add(1, Ordering::SeqCst);

        let start = ((query.page - 1) * query.per_page).min(self.records.len());
        let end = (start + query.per_page).min(self.records.len());
        Ok(ObservationPage {
            records: self.records[start..end].to_vec(),
            has_more: end < self.records.len(),
        })
    }
}

pub(crate) fn station(id: &str, latitude: f64, longitude: f64) -> Station {
    Station {
        id: id.to_string(),
        name: id.to_string(),
        latitude,
        longitude,
        min_date: Some(ymd(1990, 1, 1)),
        max_date: Some(ymd(2024, 5, 1)),
    }
}

pub(crate) fn daily(date: NaiveDate, datatype: Datatype, value: f64) -> DailyValue {
    DailyValue { date, datatype, value }
}

pub(crate) struct FakeWeatherSource {
    stations: Vec<Station>,
    values: HashMap<String, Vec<DailyValue>>,
    reject_token: bool,
    calls: AtomicUsize,
}

impl FakeWeatherSource {
    pub(crate) fn new(stations: Vec<Station>) -> Self {
        Self {
            stations,
            values: HashMap::new(),
            reject_token: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_values(mut self, station_id: &str, values: Vec<DailyValue>) -> Self {
        self.values.insert(station_id.to_string(), values);
        self
    }

    /// Answer every request like CDO does for a bad token.
    pub(crate) fn rejecting_token(mut self) -> Self {
        self.reject_token = true;
        self
    }

    /// One station next to the slug fixtures reporting 35°F and 1.58in on 2024-01-14.
    pub(crate) fn berkeley() -> Self {
        Self::new(vec![station("GHCND:USC00040693", 37.8744, -122.2605)]).with_values(
            "GHCND:USC00040693",
            vec![
                daily(ymd(2024, 1, 14), Datatype::Tavg, 35.0),
                daily(ymd(2024, 1, 14), Datatype::Prcp, 1.58),
            ],
        )
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl WeatherSource for FakeWeatherSource {
    fn stations_near(&self, area: &BoundingBox, window: &DateWindow) -> Result<Vec<Station>, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_token {
            return Err(PipelineError::Auth("NOAA rejected the token (status 400 Bad Request).".to_string()));
        }
        Ok(self
            .stations
            .iter()
            .filter(|s| area.contains(s.latitude, s.longitude) && window.overlaps(s.min_date, s.max_date))
            .cloned()
            .collect())
    }

    fn daily_values(&self, station_id: &str, window: &DateWindow) -> Result<Vec<DailyValue>, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_token {
            return Err(PipelineError::Auth("NOAA rejected the token (status 400 Bad Request).".to_string()));
        }
        Ok(self
            .values
            .get(station_id)
            .map(|values| values.iter().filter(|v| window.contains(v.date)).copied().collect())
            .unwrap_or_default())
    }
}

/// Rejects a request with 429 when `limit` requests already arrived in the
/// last `window`, like CDO's per-token limit.
pub(crate) struct BurstLimitedWeatherSource {
    inner: FakeWeatherSource,
    limit: usize,
    window: Duration,
    recent: Mutex<VecDeque<Instant>>,
    rejected: AtomicUsize,
}

impl BurstLimitedWeatherSource {
    pub(crate) fn new(inner: FakeWeatherSource, limit: usize, window: Duration) -> Self {
        Self {
            inner,
            limit,
            window,
            recent: Mutex::new(VecDeque::new()),
            rejected: AtomicUsize::new(0),
        }
    }

    pub(crate) fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }

    fn admit(&self) -> Result<(), PipelineError> {
        let mut recent = self.recent.lock().unwrap();
        let now = Instant::now();
        while recent.front().is_some_and(|t| now.duration_since(*t) >= self.window) {
            recent.pop_front();
        }
        if recent.len() >= self.limit {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(PipelineError::Transient(
                "NOAA request failed with status 429 Too Many Requests.".to_string(),
            ));
        }
        recent.push_back(now);
        Ok(())
    }
}

impl WeatherSource for BurstLimitedWeatherSource {
    fn stations_near(&self, area: &BoundingBox, window: &DateWindow) -> Result<Vec<Station>, PipelineError> {
        self.admit()?;
        self.inner.stations_near(area, window)
    }

    fn daily_values(&self, station_id: &str, window: &DateWindow) -> Result<Vec<DailyValue>, PipelineError> {
        self.admit()?;
        self.inner.daily_values(station_id, window)
    }
}
