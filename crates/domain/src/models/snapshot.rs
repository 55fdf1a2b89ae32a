//! Dated, immutable snapshot of visitor records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::visitor::{parse_records, serialize_records, ParseError, VisitorRecord};

/// A day's archived visitor records.
///
/// Created once per capture run and never mutated after the write; the store
/// refuses to overwrite an existing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Calendar date the records were captured for.
    pub date: NaiveDate,
    /// Records in source order.
    pub records: Vec<VisitorRecord>,
    /// Deterministic textual form, one record per line.
    pub serialized: String,
}

impl Snapshot {
    /// Build a snapshot from a live row-source read.
    pub fn from_records(date: NaiveDate, records: Vec<VisitorRecord>) -> Self {
        let serialized = serialize_records(&records);
        Self {
            date,
            records,
            serialized,
        }
    }

    /// Rehydrate a snapshot from archived text.
    pub fn from_serialized(date: NaiveDate, text: &str) -> Result<Self, ParseError> {
        let records = parse_records(text)?;
        Ok(Self {
            date,
            records,
            serialized: text.to_string(),
        })
    }

    /// Storage key for a date: `visitors{YYYYMMDD}`.
    ///
    /// Both phases derive keys through this function; the capture and
    /// analysis schedules are coupled only by this naming convention.
    pub fn key_for(date: NaiveDate) -> String {
        format!("visitors{}", date.format("%Y%m%d"))
    }

    /// Storage key for this snapshot.
    pub fn key(&self) -> String {
        Self::key_for(self.date)
    }
}

/// Storage key for a run's status blob: `smoketests_{YYYYMMDD}`.
///
/// Status blobs live in a separate namespace from snapshots.
pub fn status_key_for(date: NaiveDate) -> String {
    format!("smoketests_{}", date.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_key_format() {
        assert_eq!(Snapshot::key_for(day(2026, 8, 25)), "visitors20260825");
        assert_eq!(Snapshot::key_for(day(2026, 1, 3)), "visitors20260103");
    }

    #[test]
    fn test_status_key_format() {
        assert_eq!(status_key_for(day(2026, 8, 25)), "smoketests_20260825");
    }

    #[test]
    fn test_from_records_serializes_in_source_order() {
        let snapshot = Snapshot::from_records(
            day(2026, 8, 25),
            vec![
                VisitorRecord::new("1.1.1.1", 24),
                VisitorRecord::new("2.2.2.2", 1),
            ],
        );
        assert_eq!(snapshot.serialized, "(\"1.1.1.1\", 24)\n(\"2.2.2.2\", 1)");
        assert_eq!(snapshot.key(), "visitors20260825");
    }

    #[test]
    fn test_empty_day_is_valid() {
        let snapshot = Snapshot::from_records(day(2026, 8, 25), Vec::new());
        assert_eq!(snapshot.serialized, "");
        assert!(snapshot.records.is_empty());
    }

    #[test]
    fn test_from_serialized_round_trip() {
        let original = Snapshot::from_records(
            day(2026, 8, 25),
            vec![
                VisitorRecord::new("1.1.1.1", 30),
                VisitorRecord::new("3.3.3.3", 10),
            ],
        );
        let rehydrated = Snapshot::from_serialized(original.date, &original.serialized).unwrap();
        assert_eq!(rehydrated, original);
    }
}
