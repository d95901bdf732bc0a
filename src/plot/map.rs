//! SVG map of observation locations.
//!
//! Longitude is plotted linearly; latitude goes through the Web-Mercator
//! projection so the picture matches what people expect from web maps. Tick
//! labels are converted back to degrees.

use std::f64::consts::PI;
use std::path::Path;

use plotters::prelude::*;

use crate::domain::EnrichedRecord;
use crate::error::PipelineError;
use crate::plot::{draw_error, species_colors};

/// Latitude limit of the Web-Mercator projection.
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Fraction of the data span added around the points.
const PADDING: f64 = 0.25;
/// Longitudes get a wider frame: maps are wider than they are tall.
const LON_PADDING_FACTOR: f64 = 4.0;
/// Span used when all points share a latitude (or longitude).
const MIN_SPAN: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

/// Padded bounds around the records, or `None` for an empty slice.
pub fn map_bounds(records: &[EnrichedRecord]) -> Option<MapBounds> {
    let first = records.first()?;
    // Points beyond the projection's limit are drawn on its edge.
    let lat_of = |r: &EnrichedRecord| r.latitude.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let mut b = MapBounds {
        lat_min: lat_of(first),
        lat_max: lat_of(first),
        lon_min: first.longitude,
        lon_max: first.longitude,
    };
    for r in &records[1..] {
        b.lat_min = b.lat_min.min(lat_of(r));
        b.lat_max = b.lat_max.max(lat_of(r));
        b.lon_min = b.lon_min.min(r.longitude);
        b.lon_max = b.lon_max.max(r.longitude);
    }

    let lat_span = span_or_min(b.lat_max - b.lat_min);
    let lon_span = span_or_min(b.lon_max - b.lon_min);
    let lat_pad = lat_span * PADDING;
    let lon_pad = lon_span * PADDING * LON_PADDING_FACTOR;

    Some(MapBounds {
        lat_min: (b.lat_min - lat_pad).max(-MAX_MERCATOR_LAT),
        lat_max: (b.lat_max + lat_pad).min(MAX_MERCATOR_LAT),
        lon_min: (b.lon_min - lon_pad).max(-180.0),
        lon_max: (b.lon_max + lon_pad).min(180.0),
    })
}

fn span_or_min(span: f64) -> f64 {
    if span > 0.0 { span } else { MIN_SPAN }
}

/// Web-Mercator y (in degrees) for a latitude.
pub fn mercator_y(lat: f64) -> f64 {
    let phi = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    (PI / 4.0 + phi / 2.0).tan().ln().to_degrees()
}

/// Latitude for a Web-Mercator y (in degrees).
pub fn inverse_mercator_y(y: f64) -> f64 {
    (2.0 * y.to_radians().exp().atan() - PI / 2.0).to_degrees()
}

/// Draw every record as a marker colored by species, with a legend.
pub fn write_map_svg(path: &Path, records: &[EnrichedRecord], title: &str) -> Result<(), PipelineError> {
    let bounds = map_bounds(records).ok_or_else(|| PipelineError::Output("no records to map".to_string()))?;
    let colors = species_colors(records);

    let root = SVGBackend::new(path, (1200, 1000)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| draw_error("map", e))?;

    let y_range = mercator_y(bounds.lat_min)..mercator_y(bounds.lat_max);
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(bounds.lon_min..bounds.lon_max, y_range)
        .map_err(|e| draw_error("map", e))?;

    chart
        .plotting_area()
        .fill(&RGBColor(173, 216, 230))
        .map_err(|e| draw_error("map", e))?;

    chart
        .configure_mesh()
        .x_desc("longitude")
        .y_desc("latitude")
        .x_labels(8)
        .y_labels(8)
        .x_label_formatter(&|v| format!("{v:.2}"))
        .y_label_formatter(&|v| format!("{:.2}", inverse_mercator_y(*v)))
        .light_line_style(&WHITE.mix(0.4))
        .draw()
        .map_err(|e| draw_error("map", e))?;

    for (species, color) in &colors {
        let color = *color;
        chart
            .draw_series(
                records
                    .iter()
                    .filter(|r| r.species_name == *species)
                    .map(move |r| Circle::new((r.longitude, mercator_y(r.latitude)), 6, color.filled())),
            )
            .map_err(|e| draw_error("map", e))?
            .label(species.as_str())
            .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerLeft)
        .background_style(&WHITE.mix(0.9))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| draw_error("map legend", e))?;

    root.present().map_err(|e| draw_error("map", e))?;
    Ok(())
}
