use serde::Serialize;

use crate::sample::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum JtlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed line {line_number}: {source}")]
    MalformedLine {
        line_number: u64,
        source: ParseError,
    },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl Serialize for JtlError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn too_few(line_number: u64) -> JtlError {
        JtlError::MalformedLine {
            line_number,
            source: ParseError::TooFewFields {
                expected: 9,
                found: 4,
            },
        }
    }

    #[test]
    fn malformed_line_display() {
        let err = JtlError::MalformedLine {
            line_number: 7,
            source: ParseError::InvalidNumber {
                field: "elapsed",
                value: "abc".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "Malformed line 7: elapsed is not a valid number: 'abc'"
        );
    }

    #[test]
    fn malformed_line_exposes_source() {
        use std::error::Error;
        let err = too_few(2);
        let source = err.source().expect("parse error should be the source");
        assert_eq!(source.to_string(), "expected at least 9 fields, found 4");
    }

    #[test]
    fn validation_error_display() {
        let err = JtlError::Validation("unknown schema 'full'".to_string());
        assert_eq!(err.to_string(), "Validation error: unknown schema 'full'");
    }

    #[test]
    fn io_error_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "results.jtl");
        let err: JtlError = io_err.into();
        let msg = err.to_string();
        assert!(msg.contains("IO error"));
        assert!(msg.contains("results.jtl"));
    }

    #[test]
    fn serde_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: JtlError = json_err.into();
        assert!(err.to_string().starts_with("Serialization error"));
    }

    #[test]
    fn serialize_produces_string() {
        let err = too_few(3);
        let json = serde_json::to_string(&err).expect("serialize should succeed");
        assert_eq!(
            json,
            "\"Malformed line 3: expected at least 9 fields, found 4\""
        );
    }

    #[test]
    fn malformed_line_matches_by_fields() {
        let err = too_few(12);
        assert!(matches!(
            err,
            JtlError::MalformedLine { line_number: 12, .. }
        ));
    }
}
