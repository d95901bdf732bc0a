//! SVG weather graphs.
//!
//! - `weather_by_species.svg`: mean temperature and total precipitation per
//!   species, as two stacked bar charts
//! - `temperature_histogram.svg`: distribution of the records' temperatures

use std::path::Path;

use plotters::prelude::*;

use crate::error::PipelineError;
use crate::plot::draw_error;
use crate::report::SpeciesSummary;

const TEMP_COLOR: RGBColor = RGBColor(135, 206, 235);
const RAIN_COLOR: RGBColor = RGBColor(144, 238, 144);

/// Two bar charts (temperature on top, precipitation below), one bar per species.
pub fn write_species_weather_svg(path: &Path, summaries: &[SpeciesSummary]) -> Result<(), PipelineError> {
    if summaries.is_empty() {
        return Err(PipelineError::Output("no species to graph".to_string()));
    }

    let names: Vec<&str> = summaries.iter().map(|s| s.species.as_str()).collect();
    let temps: Vec<f64> = summaries.iter().map(|s| s.mean_temp).collect();
    let rains: Vec<f64> = summaries.iter().map(|s| s.total_rain).collect();

    let root = SVGBackend::new(path, (1200, 900)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| draw_error("species graph", e))?;
    let (upper, lower) = root.split_vertically(450);

    draw_bars(&upper, &names, &temps, "Average temperature by species", "°F", TEMP_COLOR)?;
    draw_bars(&lower, &names, &rains, "Total precipitation by species", "inches", RAIN_COLOR)?;

    root.present().map_err(|e| draw_error("species graph", e))?;
    Ok(())
}

fn draw_bars(
    area: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    names: &[&str],
    values: &[f64],
    caption: &str,
    unit: &str,
    color: RGBColor,
) -> Result<(), PipelineError> {
    let (y_min, y_max) = value_range(values);

    // One segment per species, so every bar gets its own tick.
    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 20))
        .margin(15)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d((0..names.len()).into_segmented(), y_min..y_max)
        .map_err(|e| draw_error(caption, e))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(names.len() + 1)
        .x_label_formatter(&|x| segment_label(names, x))
        .y_desc(unit)
        .draw()
        .map_err(|e| draw_error(caption, e))?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, &v)| {
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), v)],
                color.filled(),
            );
            bar.set_margin(0, 0, 12, 12);
            bar
        }))
        .map_err(|e| draw_error(caption, e))?;

    Ok(())
}

/// Y range covering zero and all values, with 10% headroom.
fn value_range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(0.0_f64, f64::min);
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    let span = max - min;
    if span <= 0.0 {
        return (0.0, 1.0);
    }
    let lower = if min < 0.0 { min - span * 0.1 } else { 0.0 };
    (lower, max + span * 0.1)
}

/// Species name at the center of its segment; blank elsewhere.
fn segment_label(names: &[&str], x: &SegmentValue<usize>) -> String {
    match x {
        SegmentValue::CenterOf(i) => names.get(*i).map(|s| s.to_string()).unwrap_or_default(),
        _ => String::new(),
    }
}

/// One histogram bar: values in `[lower, upper)` (the last bin also takes `upper`).
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width bins over the finite values.
///
/// All-equal values produce a single bin one unit wide centered on the value.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max <= min {
        return vec![HistogramBin {
            lower: min - 0.5,
            upper: min + 0.5,
            count: finite.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in finite {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Sturges' rule, kept between 1 and 20 bins.
pub fn default_bin_count(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    let k = (n as f64).log2().ceil() as usize + 1;
    k.clamp(1, 20)
}

/// Histogram of average temperatures.
pub fn write_temperature_histogram_svg(path: &Path, temps: &[f64]) -> Result<(), PipelineError> {
    let bins = histogram_bins(temps, default_bin_count(temps.len()));
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Err(PipelineError::Output("no temperatures to graph".to_string()));
    };
    let x_range = first.lower..last.upper;
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0) as u32;

    let root = SVGBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| draw_error("temperature histogram", e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Temperature at observations", ("sans-serif", 22))
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 50)
        .set_label_area_size(LabelAreaPosition::Bottom, 45)
        .build_cartesian_2d(x_range, 0u32..(max_count + 1))
        .map_err(|e| draw_error("temperature histogram", e))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("average temperature (°F)")
        .y_desc("observations")
        .x_label_formatter(&|v| format!("{v:.0}"))
        .draw()
        .map_err(|e| draw_error("temperature histogram", e))?;

    chart
        .draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.lower, 0u32), (b.upper, b.count as u32)], TEMP_COLOR.filled())
        }))
        .map_err(|e| draw_error("temperature histogram", e))?;
    chart
        .draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.lower, 0u32), (b.upper, b.count as u32)], BLACK.stroke_width(1))
        }))
        .map_err(|e| draw_error("temperature histogram", e))?;

    root.present().map_err(|e| draw_error("temperature histogram", e))?;
    Ok(())
}
