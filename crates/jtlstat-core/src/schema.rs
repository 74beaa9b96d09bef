use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::JtlError;

/// Positional field indices shared by both JTL layouts.
pub const TIMESTAMP_FIELD: usize = 0;
pub const ELAPSED_FIELD: usize = 1;
pub const LABEL_FIELD: usize = 2;
pub const STATUS_FIELD: usize = 3;
/// Only present in the byte-aware layout.
pub const BYTES_FIELD: usize = 8;

// ---------------------------------------------------------------------------
// Column — a single metric in the output table
// ---------------------------------------------------------------------------

/// A metric that can appear in a report row.
///
/// The header text of a column is schema-specific, see [`Schema::columns`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Label,
    Samples,
    Apdex,
    Satisfied,
    Tolerating,
    Frustrated,
    BytesMin,
    BytesMax,
    BytesAvg,
    DurationSecs,
    DurationMillis,
    Throughput,
    ElapsedMax,
    ElapsedMin,
    ElapsedAvg,
    P50,
    P90,
    P99,
    ErrorRatio,
}

const BYTE_AWARE_COLUMNS: &[(&str, Column)] = &[
    ("label", Column::Label),
    ("count", Column::Samples),
    ("apdex", Column::Apdex),
    ("apdex_warn", Column::Tolerating),
    ("apdex_fail", Column::Frustrated),
    ("apdex_ok", Column::Satisfied),
    ("bytes_min", Column::BytesMin),
    ("bytes_max", Column::BytesMax),
    ("bytes_avg", Column::BytesAvg),
    ("duration_s", Column::DurationSecs),
    ("throughput", Column::Throughput),
    ("responsetime_max", Column::ElapsedMax),
    ("responsetime_min", Column::ElapsedMin),
    ("responsetime_avg", Column::ElapsedAvg),
    ("responsetime_p50", Column::P50),
    ("responsetime_p90", Column::P90),
    ("responsetime_p99", Column::P99),
    ("error %", Column::ErrorRatio),
];

const REDUCED_COLUMNS: &[(&str, Column)] = &[
    ("label", Column::Label),
    ("samples", Column::Samples),
    ("duration", Column::DurationMillis),
    ("throughput (rps)", Column::Throughput),
    ("average", Column::ElapsedAvg),
    ("%50 line", Column::P50),
    ("%90 line", Column::P90),
    ("%99 line", Column::P99),
    ("% error", Column::ErrorRatio),
    ("apdex", Column::Apdex),
    ("satisfied", Column::Satisfied),
    ("tolerating", Column::Tolerating),
    ("frustrated", Column::Frustrated),
];

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Layout of the input log and the matching output column set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schema {
    /// `timestamp,elapsed,label,statusCode,_,_,_,_,bytes,...`
    #[default]
    ByteAware,
    /// `timestamp,elapsed,label,statusCode,...`
    Reduced,
}

impl Schema {
    /// Minimum number of comma-separated fields a record must carry.
    pub fn min_fields(self) -> usize {
        match self {
            Schema::ByteAware => BYTES_FIELD + 1,
            Schema::Reduced => STATUS_FIELD + 1,
        }
    }

    pub fn bytes_field(self) -> Option<usize> {
        match self {
            Schema::ByteAware => Some(BYTES_FIELD),
            Schema::Reduced => None,
        }
    }

    /// Output columns as `(header, metric)` pairs, in emission order.
    pub fn columns(self) -> &'static [(&'static str, Column)] {
        match self {
            Schema::ByteAware => BYTE_AWARE_COLUMNS,
            Schema::Reduced => REDUCED_COLUMNS,
        }
    }

    pub fn header(self) -> Vec<&'static str> {
        self.columns().iter().map(|(name, _)| *name).collect()
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Schema::ByteAware => "byte-aware",
            Schema::Reduced => "reduced",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Schema {
    type Err = JtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "byte-aware" | "byte_aware" | "bytes" | "full" => Ok(Schema::ByteAware),
            "reduced" | "basic" => Ok(Schema::Reduced),
            other => Err(JtlError::Validation(format!(
                "unknown schema '{other}' (expected 'byte-aware' or 'reduced')"
            ))),
        }
    }
}
