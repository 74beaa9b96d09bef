use std::io::Write;

use super::Report;
use crate::error::JtlError;

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Write the report table through a CSV writer.
///
/// Quoting is disabled so the bytes match [`Report::render`] exactly; labels
/// come from comma-split input and can never contain a delimiter.
pub fn write_csv<W: Write>(report: &Report, out: W) -> Result<(), JtlError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);

    writer.write_record(report.header())?;
    for summary in &report.labels {
        writer.write_record(report.record(summary))?;
    }
    writer.flush()?;
    Ok(())
}

/// Render the report as CSV into a `String`.
pub fn export_csv(report: &Report) -> Result<String, JtlError> {
    let mut buf = Vec::new();
    write_csv(report, &mut buf)?;
    String::from_utf8(buf).map_err(|e| JtlError::Validation(format!("report is not UTF-8: {e}")))
}

// ---------------------------------------------------------------------------
// JSON export
// ---------------------------------------------------------------------------

/// Export the report as pretty-printed JSON.
///
/// Non-finite metrics (for example the throughput of a single-sample label)
/// serialize as `null`.
pub fn export_json(report: &Report) -> Result<String, JtlError> {
    Ok(serde_json::to_string_pretty(report)?)
}
