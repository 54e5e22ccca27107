//! Reading simulator metrics logs.
//!
//! The simulator writes one CSV per run with the header
//! `request_type,filename,file_size,arrival_time_ns,start_time_ns,finish_time_ns,response_time_ms,waiting_time_ms`.
//! Only the three timestamp columns are required. The precomputed `*_ms`
//! columns are ignored; durations are always recomputed during validation.

use crate::record::RawRecord;
use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Read every row of a metrics CSV at `path`.
pub fn load_raw_records(path: &Path) -> Result<Vec<RawRecord>> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open metrics file {}", path.display()))?;
    let rows = read_rows(reader).with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!(path = %path.display(), rows = rows.len(), "Loaded metrics file");
    Ok(rows)
}

/// Read rows from any CSV source with a header line.
pub fn load_raw_records_from_reader<R: Read>(source: R) -> Result<Vec<RawRecord>> {
    read_rows(csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(source))
}

fn read_rows<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<RawRecord>> {
    let mut rows = Vec::new();
    for (line, row) in reader.deserialize::<RawRecord>().enumerate() {
        // Line 1 is the header.
        rows.push(row.with_context(|| format!("Malformed row at line {}", line + 2))?);
    }
    Ok(rows)
}
