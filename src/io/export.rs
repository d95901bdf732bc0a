//! Export the enriched dataset to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts:
//! one row per record, full precision (rounding is a display concern).

use std::path::Path;

use crate::domain::EnrichedRecord;
use crate::error::PipelineError;

/// Write one CSV row per record, with a header row.
pub fn write_records_csv(path: &Path, records: &[EnrichedRecord]) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| PipelineError::Output(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    // An empty dataset still gets a header.
    if records.is_empty() {
        writer
            .write_record(EnrichedRecord::CSV_HEADER)
            .map_err(|e| PipelineError::Output(format!("Failed to write export CSV header: {e}")))?;
    }

    for r in records {
        writer
            .serialize(r)
            .map_err(|e| PipelineError::Output(format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| PipelineError::Output(format!("Failed to write export CSV '{}': {e}", path.display())))?;
    Ok(())
}
