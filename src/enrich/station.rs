//! Station ranking and daily-reading selection.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::data::{DailyValue, Datatype, Station};
use crate::domain::{DateWindow, haversine_km};

/// A candidate station and its distance from the observation.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedStation {
    pub station: Station,
    pub distance_km: f64,
}

/// Stations within `radius_km` covering `window`, nearest first (ties by id).
pub fn rank_stations(
    stations: Vec<Station>,
    lat: f64,
    lon: f64,
    window: &DateWindow,
    radius_km: f64,
) -> Vec<RankedStation> {
    let mut ranked: Vec<RankedStation> = stations
        .into_iter()
        .filter(|s| window.overlaps(s.min_date, s.max_date))
        .map(|station| RankedStation {
            distance_km: haversine_km(lat, lon, station.latitude, station.longitude),
            station,
        })
        .filter(|r| r.distance_km.is_finite() && r.distance_km <= radius_km)
        .collect();

    ranked.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| a.station.id.cmp(&b.station.id))
    });
    ranked
}

/// Temperature and rain recorded on one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyReading {
    pub date: NaiveDate,
    pub avg_temp: f64,
    pub rain: f64,
}

#[derive(Debug, Default)]
struct DayValues {
    tavg: Option<f64>,
    tmax: Option<f64>,
    tmin: Option<f64>,
    prcp: Option<f64>,
}

impl DayValues {
    fn reading(&self, date: NaiveDate) -> Option<DailyReading> {
        let avg_temp = self.tavg.or(match (self.tmax, self.tmin) {
            (Some(max), Some(min)) => Some((max + min) / 2.0),
            _ => None,
        })?;
        Some(DailyReading {
            date,
            avg_temp,
            rain: self.prcp?,
        })
    }
}

/// The complete reading closest to `target` (ties go to the earlier day).
///
/// A day is complete when it has a temperature (`TAVG`, else the `TMAX`/`TMIN`
/// midpoint) and a precipitation value. Non-finite values and negative
/// precipitation are ignored.
pub fn closest_reading(values: &[DailyValue], target: NaiveDate) -> Option<DailyReading> {
    let mut days: BTreeMap<NaiveDate, DayValues> = BTreeMap::new();
    for v in values {
        if !v.value.is_finite() {
            continue;
        }
        let day = days.entry(v.date).or_default();
        match v.datatype {
            Datatype::Tavg => day.tavg = Some(v.value),
            Datatype::Tmax => day.tmax = Some(v.value),
            Datatype::Tmin => day.tmin = Some(v.value),
            Datatype::Prcp if v.value >= 0.0 => day.prcp = Some(v.value),
            Datatype::Prcp => {}
        }
    }

    // BTreeMap iterates in date order, so `min_by_key` keeps the earlier day on ties.
    days.iter()
        .filter_map(|(date, day)| day.reading(*date))
        .min_by_key(|r| (r.date - target).num_days().abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{daily, station, ymd};

    #[test]
    fn ranks_by_distance_within_radius() {
        let window = DateWindow::around(ymd(2024, 1, 14), 2);
        let stations = vec![
            station("FAR", 38.5, -122.26),
            station("NEAR", 37.88, -122.26),
            station("MID", 37.95, -122.26),
        ];
        let ranked = rank_stations(stations, 37.87, -122.26, &window, 50.0);
        let ids: Vec<&str> = ranked.iter().map(|r| r.station.id.as_str()).collect();
        assert_eq!(ids, vec!["NEAR", "MID"]);
        assert!(ranked[0].distance_km < 2.0);
    }

    #[test]
    fn equal_distance_breaks_ties_by_id() {
        let window = DateWindow::around(ymd(2024, 1, 14), 2);
        let stations = vec![station("B", 37.9, -122.26), station("A", 37.9, -122.26)];
        let ranked = rank_stations(stations, 37.87, -122.26, &window, 50.0);
        assert_eq!(ranked[0].station.id, "A");
        assert_eq!(ranked[1].station.id, "B");
    }

    #[test]
    fn drops_stations_without_coverage() {
        let window = DateWindow::around(ymd(2024, 1, 14), 2);
        let mut retired = station("RETIRED", 37.88, -122.26);
        retired.max_date = Some(ymd(2010, 12, 31));
        let ranked = rank_stations(vec![retired], 37.87, -122.26, &window, 50.0);
        assert!(ranked.is_empty());
    }

    #[test]
    fn picks_closest_complete_day() {
        let target = ymd(2024, 1, 14);
        let values = vec![
            daily(ymd(2024, 1, 13), Datatype::Tavg, 40.0),
            daily(ymd(2024, 1, 13), Datatype::Prcp, 0.2),
            // Target day has temperature but no rain: incomplete.
            daily(ymd(2024, 1, 14), Datatype::Tavg, 35.0),
            daily(ymd(2024, 1, 15), Datatype::Tavg, 30.0),
            daily(ymd(2024, 1, 15), Datatype::Prcp, 0.0),
        ];
        let reading = closest_reading(&values, target).unwrap();
        // 13th and 15th are both one day away; the earlier day wins.
        assert_eq!(reading.date, ymd(2024, 1, 13));
        assert_eq!(reading.avg_temp, 40.0);
        assert_eq!(reading.rain, 0.2);
    }

    #[test]
    fn falls_back_to_min_max_midpoint() {
        let target = ymd(2024, 1, 14);
        let values = vec![
            daily(target, Datatype::Tmax, 50.0),
            daily(target, Datatype::Tmin, 31.0),
            daily(target, Datatype::Prcp, 1.58),
        ];
        let reading = closest_reading(&values, target).unwrap();
        assert_eq!(reading.avg_temp, 40.5);
        assert_eq!(reading.rain, 1.58);
    }

    #[test]
    fn rejects_negative_and_non_finite_values() {
        let target = ymd(2024, 1, 14);
        let values = vec![
            daily(target, Datatype::Tavg, f64::NAN),
            daily(target, Datatype::Prcp, -0.1),
        ];
        assert_eq!(closest_reading(&values, target), None);
    }
}
