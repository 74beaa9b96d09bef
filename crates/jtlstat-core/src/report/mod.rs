pub mod export;
pub mod format;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::percentile::{percentile_desc, sort_descending};
use crate::engine::LabelStats;
use crate::schema::{Column, Schema};

use format::{format_metric, round2};

/// Finalized metrics for one label.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LabelSummary {
    pub label: String,
    pub samples: u64,
    pub errors: u64,
    /// Share of samples whose status was not 200, in `[0, 1]`.
    pub error_ratio: f64,
    pub apdex: f64,
    pub satisfied: u64,
    pub tolerating: u64,
    pub frustrated: u64,
    pub elapsed_min: u64,
    pub elapsed_max: u64,
    pub elapsed_avg: f64,
    pub p50: Option<u64>,
    pub p90: Option<u64>,
    pub p99: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_min: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_max: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_avg: Option<f64>,
    pub duration_ms: i64,
    pub duration_s: f64,
    /// Samples per second over `[first start, last end]`.
    pub throughput: f64,
    pub first_sample_at: Option<DateTime<Utc>>,
    pub last_sample_at: Option<DateTime<Utc>>,
}

impl LabelSummary {
    /// Derive all summary metrics from a label's running statistics.
    ///
    /// Callers only hold stats for labels that have seen at least one sample.
    pub fn from_stats(mut stats: LabelStats) -> Self {
        let samples = stats.samples as f64;
        let (time_start, time_end) = (stats.time_start, stats.time_end);
        let duration_ms = time_end.saturating_sub(time_start);
        let duration_s = duration_ms as f64 / 1000.0;

        sort_descending(&mut stats.elapsed);
        let sorted = &stats.elapsed;

        let bytes_range = stats.bytes_range();

        Self {
            samples: stats.samples,
            errors: stats.errors,
            error_ratio: round2(stats.errors as f64 / samples),
            apdex: round2(stats.apdex.score()),
            satisfied: stats.apdex.satisfied,
            tolerating: stats.apdex.tolerating,
            frustrated: stats.apdex.frustrated,
            elapsed_min: stats.elapsed_min,
            elapsed_max: stats.elapsed_max,
            elapsed_avg: round2(stats.elapsed_total as f64 / samples),
            p50: percentile_desc(sorted, 50.0),
            p90: percentile_desc(sorted, 90.0),
            p99: percentile_desc(sorted, 99.0),
            bytes_min: bytes_range.map(|(min, _)| min),
            bytes_max: bytes_range.map(|(_, max)| max),
            bytes_avg: bytes_range.map(|_| round2(stats.bytes_total as f64 / samples)),
            duration_ms,
            duration_s: round2(duration_s),
            throughput: round2(samples / duration_s),
            first_sample_at: DateTime::from_timestamp_millis(time_start),
            last_sample_at: DateTime::from_timestamp_millis(time_end),
            label: stats.label().to_string(),
        }
    }

    /// Render one output cell.
    pub fn cell(&self, column: Column) -> String {
        fn opt<T: ToString>(value: Option<T>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }

        match column {
            Column::Label => self.label.clone(),
            Column::Samples => self.samples.to_string(),
            Column::Apdex => format_metric(self.apdex),
            Column::Satisfied => self.satisfied.to_string(),
            Column::Tolerating => self.tolerating.to_string(),
            Column::Frustrated => self.frustrated.to_string(),
            Column::BytesMin => opt(self.bytes_min),
            Column::BytesMax => opt(self.bytes_max),
            Column::BytesAvg => self.bytes_avg.map(format_metric).unwrap_or_default(),
            Column::DurationSecs => format_metric(self.duration_s),
            Column::DurationMillis => self.duration_ms.to_string(),
            Column::Throughput => format_metric(self.throughput),
            Column::ElapsedMax => self.elapsed_max.to_string(),
            Column::ElapsedMin => self.elapsed_min.to_string(),
            Column::ElapsedAvg => format_metric(self.elapsed_avg),
            Column::P50 => opt(self.p50),
            Column::P90 => opt(self.p90),
            Column::P99 => opt(self.p99),
            Column::ErrorRatio => format_metric(self.error_ratio),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Per-label summary table produced by [`Aggregator::finalize`].
///
/// [`Aggregator::finalize`]: crate::engine::Aggregator::finalize
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Report {
    pub schema: Schema,
    /// One entry per label, in first-seen order.
    pub labels: Vec<LabelSummary>,
    /// Malformed lines that were skipped while reading.
    pub skipped_lines: u64,
}

impl Report {
    pub(crate) fn from_stats(schema: Schema, stats: Vec<LabelStats>, skipped_lines: u64) -> Self {
        Self {
            schema,
            labels: stats.into_iter().map(LabelSummary::from_stats).collect(),
            skipped_lines,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&LabelSummary> {
        self.labels.iter().find(|s| s.label == label)
    }

    pub fn header(&self) -> Vec<&'static str> {
        self.schema.header()
    }

    /// Cells of one data row, in column order.
    pub fn record(&self, summary: &LabelSummary) -> Vec<String> {
        self.schema
            .columns()
            .iter()
            .map(|(_, column)| summary.cell(*column))
            .collect()
    }

    /// Header row followed by one row per label, comma-joined, without
    /// trailing newlines. Values are never quoted.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.header().join(","))
            .chain(self.labels.iter().map(|s| self.record(s).join(",")))
    }

    /// Whole table as text, every row newline-terminated.
    pub fn render(&self) -> String {
        self.lines().fold(String::new(), |mut out, line| {
            out.push_str(&line);
            out.push('\n');
            out
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
