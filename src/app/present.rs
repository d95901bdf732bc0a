//! Render a finished dataset: terminal text plus image files.

use std::fs;
use std::path::PathBuf;

use log::debug;

use crate::domain::{Dataset, PresentOptions, Taxon};
use crate::error::PipelineError;
use crate::plot::{render_ascii_map, write_map_svg, write_species_weather_svg, write_temperature_histogram_svg};
use crate::report::{format_no_data, format_records_table, format_run_summary, format_species_table, summarize_by_species};

pub const MAP_FILE: &str = "observations_map.svg";
pub const SPECIES_GRAPH_FILE: &str = "weather_by_species.svg";
pub const HISTOGRAM_FILE: &str = "temperature_histogram.svg";

/// What was shown and written.
#[derive(Debug, Clone, Default)]
pub struct Presentation {
    /// Text for the terminal.
    pub text: String,
    /// Image files written, in creation order.
    pub artifacts: Vec<PathBuf>,
}

/// Build the terminal report and write the images.
///
/// An empty dataset produces the "No data" message and no files.
pub fn present(dataset: &Dataset, taxon: Option<&Taxon>, options: &PresentOptions) -> Result<Presentation, PipelineError> {
    let mut out = Presentation {
        text: format_run_summary(taxon, &dataset.stats, dataset.len()),
        artifacts: Vec::new(),
    };

    if dataset.is_empty() {
        out.text.push('\n');
        out.text.push_str(&format_no_data(&dataset.stats));
        return Ok(out);
    }

    let summaries = summarize_by_species(&dataset.records);

    out.text.push('\n');
    out.text.push_str(&format_records_table(&dataset.records));
    out.text.push('\n');
    out.text.push_str(&format_species_table(&summaries));

    if options.terminal_map {
        out.text.push('\n');
        out.text.push_str(&render_ascii_map(&dataset.records, options.map_width, options.map_height));
    }

    if !options.images {
        debug!("Image output disabled");
        return Ok(out);
    }

    fs::create_dir_all(&options.out_dir).map_err(|e| {
        PipelineError::Output(format!(
            "Failed to create output directory '{}': {e}",
            options.out_dir.display()
        ))
    })?;

    let title = match taxon {
        Some(t) => format!("Observations of {}", t.display_name()),
        None => "Observations".to_string(),
    };
    let map_path = options.out_dir.join(MAP_FILE);
    write_map_svg(&map_path, &dataset.records, &title)?;
    out.artifacts.push(map_path);

    let graph_path = options.out_dir.join(SPECIES_GRAPH_FILE);
    write_species_weather_svg(&graph_path, &summaries)?;
    out.artifacts.push(graph_path);

    let temps: Vec<f64> = dataset.records.iter().map(|r| r.avg_temp).collect();
    let hist_path = options.out_dir.join(HISTOGRAM_FILE);
    write_temperature_histogram_svg(&hist_path, &temps)?;
    out.artifacts.push(hist_path);

    Ok(out)
}
