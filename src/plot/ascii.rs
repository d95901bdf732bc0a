//! ASCII map for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid, plate carrée), optimized for:
//! - a quick look at where the sightings are without opening an image
//! - deterministic output (helpful for golden tests)
//!
//! Each species gets a letter (`A`, `B`, ...) in species-name order; cells
//! shared by different species show `*`.

use crate::domain::EnrichedRecord;
use crate::plot::species_names;

/// Render the records' locations on a `width` x `height` character grid, with a legend.
pub fn render_ascii_map(records: &[EnrichedRecord], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (lon_min, lon_max) = range(records.iter().map(|r| r.longitude)).unwrap_or((-180.0, 180.0));
    let (lat_min, lat_max) = range(records.iter().map(|r| r.latitude)).unwrap_or((-90.0, 90.0));
    let (lon_min, lon_max) = pad_range(lon_min, lon_max, 0.05);
    let (lat_min, lat_max) = pad_range(lat_min, lat_max, 0.05);

    let species = species_names(records);
    let mut grid = vec![vec![' '; width]; height];

    for r in records {
        let x = map_x(r.longitude, lon_min, lon_max, width);
        let y = map_y(r.latitude, lat_min, lat_max, height);
        let glyph = species
            .iter()
            .position(|s| *s == r.species_name)
            .map(glyph_for)
            .unwrap_or('?');

        let cell = &mut grid[y][x];
        *cell = if *cell == ' ' || *cell == glyph { glyph } else { '*' };
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Map: lon=[{lon_min:.3}, {lon_max:.3}] | lat=[{lat_min:.3}, {lat_max:.3}]\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    for (i, name) in species.iter().enumerate() {
        out.push_str(&format!("  {} = {name}\n", glyph_for(i)));
    }

    out
}

/// `A`..`Z`, then `a`..`z`, then `#`.
fn glyph_for(index: usize) -> char {
    const GLYPHS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
    GLYPHS.get(index).map(|&b| b as char).unwrap_or('#')
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    // A single location still gets a visible frame around it.
    let pad = if span > 0.0 { span * frac } else { 0.05 };
    (min - pad, max + pad)
}

fn map_x(v: f64, min: f64, max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((v - min) / (max - min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(v: f64, min: f64, max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((v - min) / (max - min)).clamp(0.0, 1.0);
    // North is up: max latitude -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ymd;

    fn rec(species: &str, lat: f64, lon: f64) -> EnrichedRecord {
        EnrichedRecord {
            observation_id: 1,
            species_name: species.to_string(),
            avg_temp: 35.0,
            rain: 1.58,
            latitude: lat,
            longitude: lon,
            observed_date: ymd(2024, 1, 14),
            station_id: "GHCND:TEST".to_string(),
            station_name: "TEST STATION".to_string(),
            station_distance_km: None,
            place_guess: None,
        }
    }

    #[test]
    fn map_golden_snapshot_small() {
        let records = vec![rec("Alpha", 10.0, 0.0), rec("Beta", 20.0, 10.0)];

        let txt = render_ascii_map(&records, 10, 5);
        let expected = concat!(
            "Map: lon=[-0.500, 10.500] | lat=[9.500, 20.500]\n",
            "         B\n",
            "          \n",
            "          \n",
            "          \n",
            "A         \n",
            "  A = Alpha\n",
            "  B = Beta\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn shared_cell_is_marked() {
        let records = vec![
            rec("Alpha", 10.0, 0.0),
            rec("Beta", 10.0, 0.0),
            rec("Alpha", 20.0, 10.0),
        ];
        let txt = render_ascii_map(&records, 10, 5);
        assert_eq!(txt.lines().nth(5), Some("*         "));
        assert_eq!(txt.lines().nth(1), Some("         A"));
    }

    #[test]
    fn single_location_is_centered() {
        let txt = render_ascii_map(&[rec("Alpha", 37.0, -122.0)], 11, 5);
        assert_eq!(txt.lines().nth(3), Some("     A     "));
    }
}
