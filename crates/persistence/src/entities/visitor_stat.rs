//! Visitor statistics entity definitions.
//!
//! Maps to the archived `visitor_stats` table. The schema belongs to the
//! upstream logging pipeline; this service only reads it.

use domain::models::VisitorRecord;
use sqlx::FromRow;

/// Database entity for one visitor_stats row.
#[derive(Debug, Clone, FromRow)]
pub struct VisitorStatEntity {
    /// Visitor identifier column (IP address in the archived schema).
    pub identifier: String,
    /// Visit count. Stored as BIGINT; negative values do not occur but the
    /// conversion clamps rather than trusting the archive.
    pub visit_count: i64,
}

impl From<VisitorStatEntity> for VisitorRecord {
    fn from(entity: VisitorStatEntity) -> Self {
        VisitorRecord::new(entity.identifier, entity.visit_count.max(0) as u64)
    }
}
