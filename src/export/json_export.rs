use std::fs::File;
use std::io::{BufWriter, Write};

use serde::Serialize;

use crate::error::ExportError;
use crate::models::MatchReport;
use crate::summary::RunSummary;

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a RunSummary,
    report: &'a MatchReport,
}

/// Machine-readable run output: the full report plus the run summary in
/// one document.
pub fn export_report_json(
    path: &str,
    report: &MatchReport,
    summary: &RunSummary,
) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::with_capacity(512 * 1024, file);
    serde_json::to_writer_pretty(&mut writer, &JsonReport { summary, report })?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
