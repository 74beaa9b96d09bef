use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::engine::{Aggregator, EngineConfig};
use crate::error::JtlError;
use crate::report::Report;

/// Pull every line from `reader` through a fresh [`Aggregator`] and return
/// the finalized report.
///
/// Lines are processed one at a time as they arrive. Bytes that are not
/// valid UTF-8 (Latin-1 labels are common in JMeter logs) are replaced with
/// U+FFFD instead of failing the run. A read error from the source aborts the
/// run and is returned as-is.
pub async fn aggregate<R>(mut reader: R, config: EngineConfig) -> Result<Report, JtlError>
where
    R: AsyncBufRead + Unpin,
{
    let mut aggregator = Aggregator::new(config);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let raw = buf.strip_suffix(b"\n").unwrap_or(&buf);
        aggregator.observe(&String::from_utf8_lossy(raw))?;
    }
    tracing::debug!(lines = aggregator.lines_seen(), "Input exhausted");
    Ok(aggregator.finalize())
}

/// Write the header row and one row per label, each newline-terminated.
///
/// Flushing and closing the sink is left to the caller.
pub async fn write_report<W>(report: &Report, writer: &mut W) -> Result<(), JtlError>
where
    W: AsyncWrite + Unpin,
{
    for line in report.lines() {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    Ok(())
}

/// Aggregate `reader` and write the summary table to `writer`.
///
/// The returned future completes once the last row has been handed to the
/// sink.
pub async fn generate_report<R, W>(
    reader: R,
    writer: &mut W,
    config: EngineConfig,
) -> Result<Report, JtlError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let report = aggregate(reader, config).await?;
    write_report(&report, writer).await?;
    Ok(report)
}
