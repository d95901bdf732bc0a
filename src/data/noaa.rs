//! NOAA Climate Data Online (CDO v2) integration for GHCND daily summaries.
//!
//! Two endpoints are used:
//! - `/stations`: GHCND stations inside a lat/lon extent with data in a date range
//! - `/data`: daily values for one station (standard units: °F, inches)
//!
//! Every request carries the account token in the `token` header.

use std::time::Duration;

use chrono::NaiveDate;
use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::data::{DailyValue, Datatype, Station, USER_AGENT, WeatherSource, request_error};
use crate::domain::{BoundingBox, DateWindow};
use crate::error::PipelineError;

const BASE_URL: &str = "https://www.ncei.noaa.gov/cdo-web/api/v2";
const DATASET_ID: &str = "GHCND";
const RESULT_LIMIT: usize = 1000;
const TOKEN_ENV: &str = "NOAA_TOKEN";

/// NOAA CDO access token. Never printed: `Debug` is redacted and there is no `Display`.
#[derive(Clone)]
pub struct NoaaToken(String);

impl NoaaToken {
    pub fn new(raw: impl Into<String>) -> Result<Self, PipelineError> {
        let raw = raw.into().trim().to_string();
        if raw.is_empty() {
            return Err(PipelineError::Auth("NOAA token is empty.".to_string()));
        }
        Ok(Self(raw))
    }

    /// Read `NOAA_TOKEN` from the environment (after loading `.env`, if present).
    pub fn from_env() -> Result<Self, PipelineError> {
        dotenvy::dotenv().ok();
        let raw = std::env::var(TOKEN_ENV)
            .map_err(|_| PipelineError::Auth(format!("Missing {TOKEN_ENV} in environment (.env).")))?;
        Self::new(raw)
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for NoaaToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NoaaToken(<redacted>)")
    }
}

pub struct NoaaClient {
    client: Client,
    token: NoaaToken,
    base_url: String,
}

impl NoaaClient {
    pub fn from_env(http_timeout: Duration) -> Result<Self, PipelineError> {
        Self::new(NoaaToken::from_env()?, http_timeout)
    }

    pub fn new(token: NoaaToken, http_timeout: Duration) -> Result<Self, PipelineError> {
        Self::with_base_url(token, BASE_URL, http_timeout)
    }

    pub fn with_base_url(
        token: NoaaToken,
        base_url: impl Into<String>,
        http_timeout: Duration,
    ) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(http_timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build NOAA HTTP client: {e}")))?;
        Ok(Self {
            client,
            token,
            base_url: base_url.into(),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, PipelineError> {
        let url = format!("{}{path}", self.base_url);
        // Query only: the token travels in a header and must not reach the logs.
        debug!("GET {url} {query:?}");

        let resp = self
            .client
            .get(&url)
            .header("token", self.token.expose())
            .query(query)
            .send()
            .map_err(|e| request_error("NOAA", &e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        resp.json::<T>().map_err(|e| request_error("NOAA", &e))
    }
}

impl WeatherSource for NoaaClient {
    fn stations_near(&self, area: &BoundingBox, window: &DateWindow) -> Result<Vec<Station>, PipelineError> {
        let params = [
            ("datasetid", DATASET_ID.to_string()),
            ("datatypeid", Datatype::Prcp.code().to_string()),
            ("extent", area.extent_param()),
            ("startdate", fmt_date(window.start)),
            ("enddate", fmt_date(window.end)),
            ("limit", RESULT_LIMIT.to_string()),
        ];
        let body: StationsResponse = self.get_json("/stations", &params)?;
        Ok(body.results.into_iter().filter_map(StationJson::into_station).collect())
    }

    fn daily_values(&self, station_id: &str, window: &DateWindow) -> Result<Vec<DailyValue>, PipelineError> {
        let mut params = vec![
            ("datasetid", DATASET_ID.to_string()),
            ("stationid", station_id.to_string()),
            ("startdate", fmt_date(window.start)),
            ("enddate", fmt_date(window.end)),
            ("units", "standard".to_string()),
            ("limit", RESULT_LIMIT.to_string()),
        ];
        for datatype in Datatype::ALL {
            params.push(("datatypeid", datatype.code().to_string()));
        }
        let body: DataResponse = self.get_json("/data", &params)?;
        Ok(body.results.into_iter().filter_map(DataJson::into_value).collect())
    }
}

/// Map a non-success HTTP status to the error taxonomy.
///
/// CDO answers a missing or unknown token with 400 and a message naming the
/// token; 401/403 are treated the same way.
fn classify_status(status: StatusCode, body: &str) -> PipelineError {
    let mentions_token = body.to_ascii_lowercase().contains("token");
    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || (status == StatusCode::BAD_REQUEST && mentions_token)
    {
        PipelineError::Auth(format!("NOAA rejected the token (status {status})."))
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        PipelineError::Transient(format!("NOAA request failed with status {status}."))
    } else {
        PipelineError::NoCoverage(format!("NOAA request failed with status {status}."))
    }
}

fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// CDO dates are either `YYYY-MM-DD` or `YYYY-MM-DDT00:00:00`.
fn parse_cdo_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

// CDO returns `{}` (no `results` key) when nothing matches.
#[derive(Debug, Deserialize)]
struct StationsResponse {
    #[serde(default)]
    results: Vec<StationJson>,
}

#[derive(Debug, Deserialize)]
struct StationJson {
    id: String,
    #[serde(default)]
    name: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    mindate: Option<String>,
    maxdate: Option<String>,
}

impl StationJson {
    fn into_station(self) -> Option<Station> {
        Some(Station {
            latitude: self.latitude.filter(|v| v.is_finite())?,
            longitude: self.longitude.filter(|v| v.is_finite())?,
            min_date: self.mindate.as_deref().and_then(parse_cdo_date),
            max_date: self.maxdate.as_deref().and_then(parse_cdo_date),
            id: self.id,
            name: self.name,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DataResponse {
    #[serde(default)]
    results: Vec<DataJson>,
}

#[derive(Debug, Deserialize)]
struct DataJson {
    date: String,
    datatype: String,
    value: Option<f64>,
}

impl DataJson {
    fn into_value(self) -> Option<DailyValue> {
        Some(DailyValue {
            date: parse_cdo_date(&self.date)?,
            datatype: Datatype::from_code(&self.datatype)?,
            value: self.value.filter(|v| v.is_finite())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_debug_is_redacted() {
        let token = NoaaToken::new("sekrit-value").unwrap();
        assert_eq!(format!("{token:?}"), "NoaaToken(<redacted>)");
        assert!(matches!(NoaaToken::new("   "), Err(PipelineError::Auth(_))));
    }

    #[test]
    fn parses_station_list() {
        let body = r#"{
            "metadata": { "resultset": { "offset": 1, "count": 2, "limit": 1000 } },
            "results": [
                {
                    "elevation": 13.1, "mindate": "1893-01-01", "maxdate": "2024-05-28",
                    "latitude": 37.8744, "name": "BERKELEY, CA US", "datacoverage": 0.99,
                    "id": "GHCND:USC00040693", "elevationUnit": "METERS", "longitude": -122.2605
                },
                { "id": "GHCND:BROKEN", "name": "NO COORDS" }
            ]
        }"#;
        let parsed: StationsResponse = serde_json::from_str(body).unwrap();
        let stations: Vec<Station> = parsed.results.into_iter().filter_map(StationJson::into_station).collect();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].id, "GHCND:USC00040693");
        assert_eq!(stations[0].min_date, NaiveDate::from_ymd_opt(1893, 1, 1));
        assert_eq!(stations[0].max_date, NaiveDate::from_ymd_opt(2024, 5, 28));
    }

    #[test]
    fn empty_object_means_no_results() {
        let parsed: StationsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.results.is_empty());
        let parsed: DataResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.results.is_empty());
    }

    #[test]
    fn parses_daily_values_and_skips_unknown_datatypes() {
        let body = r#"{ "results": [
            { "date": "2024-01-14T00:00:00", "datatype": "PRCP", "station": "GHCND:USC00040693", "attributes": ",,7,0800", "value": 1.58 },
            { "date": "2024-01-14T00:00:00", "datatype": "TAVG", "station": "GHCND:USC00040693", "attributes": "H,,S,", "value": 35 },
            { "date": "2024-01-14T00:00:00", "datatype": "SNOW", "station": "GHCND:USC00040693", "attributes": ",,7,", "value": 0 }
        ] }"#;
        let parsed: DataResponse = serde_json::from_str(body).unwrap();
        let values: Vec<DailyValue> = parsed.results.into_iter().filter_map(DataJson::into_value).collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].datatype, Datatype::Prcp);
        assert_eq!(values[0].value, 1.58);
        assert_eq!(values[1].datatype, Datatype::Tavg);
        assert_eq!(values[1].date, NaiveDate::from_ymd_opt(2024, 1, 14).unwrap());
    }

    #[test]
    fn status_classification() {
        let bad_token = r#"{"status":"400","message":"Token parameter is required."}"#;
        assert!(matches!(classify_status(StatusCode::BAD_REQUEST, bad_token), PipelineError::Auth(_)));
        assert!(matches!(classify_status(StatusCode::UNAUTHORIZED, ""), PipelineError::Auth(_)));
        assert!(matches!(classify_status(StatusCode::SERVICE_UNAVAILABLE, ""), PipelineError::Transient(_)));
        assert!(matches!(classify_status(StatusCode::TOO_MANY_REQUESTS, ""), PipelineError::Transient(_)));
        assert!(matches!(classify_status(StatusCode::BAD_REQUEST, "bad extent"), PipelineError::NoCoverage(_)));
    }

    #[test]
    fn auth_error_message_does_not_contain_token() {
        let err = classify_status(StatusCode::BAD_REQUEST, "invalid token sekrit-value");
        assert!(!err.to_string().contains("sekrit-value"));
    }
}
