//! Visitor record model and the archived line format.
//!
//! Snapshots are stored as one record per line in literal pair notation:
//! `("1.1.1.1", 24)`. The format is append-only archive data, so parsing
//! must reproduce serialized records exactly (order preserved).

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

lazy_static! {
    /// Grammar for one archived line: `("identifier", count)`.
    static ref RECORD_LINE: Regex =
        Regex::new(r#"^\("(?P<id>[^"]*)",\s*(?P<count>\d+)\)$"#).expect("invalid record regex");
}

/// Errors that can occur while parsing archived snapshot text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed record on line {line}: {text:?}")]
    MalformedLine { line: usize, text: String },

    #[error("visit count out of range on line {line}: {text:?}")]
    CountOutOfRange { line: usize, text: String },
}

/// A single visitor row as captured from the visitor log.
///
/// Immutable once captured; the row source is the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorRecord {
    /// Visitor identifier (typically an IP address). Must not contain `"`
    /// or line breaks; the line format does no escaping, so such an
    /// identifier would not round-trip. The capture phase refuses records
    /// that fail [`VisitorRecord::is_line_safe`].
    pub identifier: String,
    /// Number of visits attributed to the identifier. Never negative.
    pub visit_count: u64,
}

impl VisitorRecord {
    pub fn new(identifier: impl Into<String>, visit_count: u64) -> Self {
        Self {
            identifier: identifier.into(),
            visit_count,
        }
    }

    /// Whether this record survives a serialize/parse round trip.
    ///
    /// The line grammar has no escaping, so a `"` or line break inside the
    /// identifier would produce an unparseable archive line.
    pub fn is_line_safe(&self) -> bool {
        !self.identifier.contains(&['"', '\n', '\r'][..])
    }

    /// Render this record as one archived line.
    pub fn to_line(&self) -> String {
        format!("(\"{}\", {})", self.identifier, self.visit_count)
    }

    /// Parse one archived line back into a record.
    pub fn from_line(line_no: usize, line: &str) -> Result<Self, ParseError> {
        let caps = RECORD_LINE
            .captures(line.trim_end())
            .ok_or_else(|| ParseError::MalformedLine {
                line: line_no,
                text: line.to_string(),
            })?;

        let visit_count: u64 =
            caps["count"]
                .parse()
                .map_err(|_| ParseError::CountOutOfRange {
                    line: line_no,
                    text: line.to_string(),
                })?;

        Ok(Self {
            identifier: caps["id"].to_string(),
            visit_count,
        })
    }
}

/// Serialize records deterministically (stable source order), newline-joined.
pub fn serialize_records(records: &[VisitorRecord]) -> String {
    records
        .iter()
        .map(VisitorRecord::to_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse archived snapshot text back into records, order preserved.
///
/// Empty text is a valid snapshot with zero visitors.
pub fn parse_records(text: &str) -> Result<Vec<VisitorRecord>, ParseError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }

    text.lines()
        .enumerate()
        .map(|(i, line)| VisitorRecord::from_line(i + 1, line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::IPv4;
    use fake::Fake;

    #[test]
    fn test_to_line_pair_notation() {
        let record = VisitorRecord::new("1.1.1.1", 24);
        assert_eq!(record.to_line(), "(\"1.1.1.1\", 24)");
    }

    #[test]
    fn test_serialize_two_records() {
        let records = vec![
            VisitorRecord::new("1.1.1.1", 24),
            VisitorRecord::new("2.2.2.2", 1),
        ];
        assert_eq!(
            serialize_records(&records),
            "(\"1.1.1.1\", 24)\n(\"2.2.2.2\", 1)"
        );
    }

    #[test]
    fn test_round_trip_preserves_records_and_order() {
        let records: Vec<VisitorRecord> = (0..20)
            .map(|i| {
                let ip: String = IPv4().fake();
                VisitorRecord::new(ip, (0..10_000u64).fake::<u64>() + i)
            })
            .collect();

        let text = serialize_records(&records);
        let parsed = parse_records(&text).expect("round trip failed");
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_parse_empty_text_is_zero_records() {
        assert_eq!(parse_records("").unwrap(), Vec::new());
    }

    #[test]
    fn test_parse_rejects_malformed_line() {
        let err = parse_records("(\"1.1.1.1\", 24)\nnot a record").unwrap_err();
        assert_eq!(
            err,
            ParseError::MalformedLine {
                line: 2,
                text: "not a record".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_negative_count() {
        // Negative counts never match the digit-only grammar.
        let err = parse_records("(\"1.1.1.1\", -3)").unwrap_err();
        assert!(matches!(err, ParseError::MalformedLine { line: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_count_overflow() {
        let err = parse_records("(\"1.1.1.1\", 99999999999999999999999)").unwrap_err();
        assert!(matches!(err, ParseError::CountOutOfRange { line: 1, .. }));
    }

    #[test]
    fn test_line_safety() {
        assert!(VisitorRecord::new("1.1.1.1", 1).is_line_safe());
        assert!(VisitorRecord::new("2001:db8::1", 1).is_line_safe());
        assert!(!VisitorRecord::new("a\"b", 1).is_line_safe());
        assert!(!VisitorRecord::new("a\nb", 1).is_line_safe());
        assert!(!VisitorRecord::new("a\rb", 1).is_line_safe());
    }

    #[test]
    fn test_unsafe_identifier_does_not_round_trip() {
        // The grammar cannot reparse an embedded quote; the capture phase
        // must refuse such records before they reach the archive.
        let record = VisitorRecord::new("a\"b", 1);
        assert!(parse_records(&record.to_line()).is_err());
    }

    #[test]
    fn test_zero_count_is_valid() {
        let record = VisitorRecord::from_line(1, "(\"10.0.0.1\", 0)").unwrap();
        assert_eq!(record.visit_count, 0);
    }
}
