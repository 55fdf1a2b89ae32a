//! Visitor log repository.
//!
//! Provides the fixed top-N read over the archived visitor_stats table and
//! implements the domain `RowSource` capability.

use domain::models::VisitorRecord;
use domain::services::{RowSource, RowSourceError};
use sqlx::PgPool;
use tracing::debug;

use crate::entities::VisitorStatEntity;

/// Repository for the archived visitor log.
pub struct VisitorLogRepository {
    pool: PgPool,
    top_n: i64,
}

impl VisitorLogRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool, top_n: i64) -> Self {
        Self { pool, top_n }
    }

    /// Fetch the top-N visitors by visit count.
    ///
    /// The connection checkout lives for exactly this call; drop returns it
    /// to the pool on success, error, and cancellation alike.
    pub async fn fetch_top(&self) -> Result<Vec<VisitorStatEntity>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let entities = sqlx::query_as::<_, VisitorStatEntity>(
            r#"
            SELECT ip_address AS identifier, visit_count
            FROM visitor_stats
            ORDER BY visit_count DESC, ip_address
            LIMIT $1
            "#,
        )
        .bind(self.top_n)
        .fetch_all(&mut *conn)
        .await?;

        debug!(rows = entities.len(), limit = self.top_n, "Visitor query completed");
        Ok(entities)
    }
}

/// Classify a sqlx error for the retry policy: connection-level faults are
/// transient, everything else is a rejected query.
fn classify(err: sqlx::Error) -> RowSourceError {
    match &err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => RowSourceError::Transient(err.to_string()),
        sqlx::Error::Database(db_err) => {
            RowSourceError::Rejected(format!("database error: {}", db_err))
        }
        _ => RowSourceError::Rejected(err.to_string()),
    }
}

#[async_trait::async_trait]
impl RowSource for VisitorLogRepository {
    async fn top_visitors(&self) -> Result<Vec<VisitorRecord>, RowSourceError> {
        let entities = self.fetch_top().await.map_err(classify)?;
        Ok(entities.into_iter().map(VisitorRecord::from).collect())
    }
}
