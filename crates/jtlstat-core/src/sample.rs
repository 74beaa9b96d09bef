use serde::{Deserialize, Serialize};

use crate::schema::{Schema, ELAPSED_FIELD, LABEL_FIELD, STATUS_FIELD, TIMESTAMP_FIELD};

/// JMeter writes this column name first in its CSV header row.
pub const HEADER_PREFIX: &str = "timeStamp,";

// ---------------------------------------------------------------------------
// LineKind
// ---------------------------------------------------------------------------

/// What a raw input line turned out to be before any field is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Empty,
    Header,
    Record,
}

/// Classify a raw line. A trailing `\r` left over from CRLF input is ignored.
pub fn classify_line(line: &str) -> LineKind {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() {
        LineKind::Empty
    } else if line.starts_with(HEADER_PREFIX) {
        LineKind::Header
    } else {
        LineKind::Record
    }
}

// ---------------------------------------------------------------------------
// ParseError
// ---------------------------------------------------------------------------

/// Why a record line could not be turned into a [`Sample`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },

    #[error("{field} is not a valid number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// StatusCode
// ---------------------------------------------------------------------------

/// Response code column of a sample.
///
/// JMeter records transport failures with free text such as
/// `Non HTTP response code: java.net.ConnectException`, so the column is not
/// guaranteed to be numeric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    Code(u16),
    Other(String),
}

impl StatusCode {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<u16>() {
            Ok(code) => StatusCode::Code(code),
            Err(_) => StatusCode::Other(raw.to_string()),
        }
    }

    /// Only a plain `200` counts as success.
    pub fn is_success(&self) -> bool {
        matches!(self, StatusCode::Code(200))
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusCode::Code(code) => write!(f, "{code}"),
            StatusCode::Other(text) => write!(f, "{text}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sample
// ---------------------------------------------------------------------------

/// One executed request as recorded in the results log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Sample {
    /// Request start, milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Request duration in milliseconds.
    pub elapsed: u64,
    pub label: String,
    pub status: StatusCode,
    /// Response size; `None` for the reduced schema.
    pub bytes: Option<u64>,
}

impl Sample {
    /// Parse a record line positionally. Fields are split on `,` with no
    /// quoting support; fields beyond the schema's needs are ignored.
    pub fn parse(line: &str, schema: Schema) -> Result<Self, ParseError> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < schema.min_fields() {
            return Err(ParseError::TooFewFields {
                expected: schema.min_fields(),
                found: fields.len(),
            });
        }

        // JMeter leaves the size empty for some failed samples; count those
        // as zero bytes rather than losing the sample.
        let bytes = match schema.bytes_field() {
            Some(idx) if fields[idx].trim().is_empty() => Some(0),
            Some(idx) => Some(parse_number::<u64>("bytes", fields[idx])?),
            None => None,
        };

        Ok(Self {
            timestamp: parse_number::<i64>("timestamp", fields[TIMESTAMP_FIELD])?,
            elapsed: parse_number::<u64>("elapsed", fields[ELAPSED_FIELD])?,
            label: fields[LABEL_FIELD].to_string(),
            status: StatusCode::parse(fields[STATUS_FIELD]),
            bytes,
        })
    }

    /// Instant the request finished, in epoch milliseconds.
    pub fn end(&self) -> i64 {
        self.timestamp.saturating_add_unsigned(self.elapsed)
    }
}

fn parse_number<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, ParseError> {
    raw.trim().parse::<T>().map_err(|_| ParseError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}
