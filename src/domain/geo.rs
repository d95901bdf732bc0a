//! Small geographic helpers (WGS84 degrees, spherical earth).

/// Mean earth radius (km).
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Kilometres per degree of latitude.
const KM_PER_DEG_LAT: f64 = 111.32;

/// Whether `(lat, lon)` is a finite coordinate pair inside the usual ranges.
pub fn valid_coordinates(lat: f64, lon: f64) -> bool {
    lat.is_finite() && lon.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

/// Great-circle distance between two points (haversine formula).
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Latitude/longitude box, used as the NOAA station search `extent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Box enclosing the circle of `radius_km` around `(lat, lon)`, clamped to valid ranges.
    pub fn around(lat: f64, lon: f64, radius_km: f64) -> Self {
        let dlat = radius_km / KM_PER_DEG_LAT;
        // Near the poles a degree of longitude shrinks to nothing; cap the widening.
        let dlon = radius_km / (KM_PER_DEG_LAT * lat.to_radians().cos().max(0.01));

        Self {
            min_lat: (lat - dlat).max(-90.0),
            min_lon: (lon - dlon).max(-180.0),
            max_lat: (lat + dlat).min(90.0),
            max_lon: (lon + dlon).min(180.0),
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }

    /// `minlat,minlon,maxlat,maxlon`, the format NOAA's `extent` parameter expects.
    pub fn extent_param(&self) -> String {
        format!(
            "{:.4},{:.4},{:.4},{:.4}",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}
