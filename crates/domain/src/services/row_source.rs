//! Row source capability: the fixed top-N visitor query.

use thiserror::Error;

use crate::models::VisitorRecord;

/// Errors surfaced by a row source.
///
/// The split matters to the capture retry policy: transient connection
/// faults are retried, rejected queries are terminal.
#[derive(Debug, Error)]
pub enum RowSourceError {
    /// Timeout, connection reset, pool exhaustion. Retryable.
    #[error("transient connection failure: {0}")]
    Transient(String),

    /// Malformed query, permission denied. Never retried.
    #[error("query rejected: {0}")]
    Rejected(String),
}

/// Source of the day's visitor rows.
///
/// Implementations own connection scoping: a connection acquired for the
/// query must be released on every exit path, including cancellation.
#[async_trait::async_trait]
pub trait RowSource: Send + Sync {
    /// Execute the fixed top-N query and return records in source order.
    ///
    /// An empty result is a valid day with zero visitors, not an error.
    async fn top_visitors(&self) -> Result<Vec<VisitorRecord>, RowSourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            RowSourceError::Transient("connection reset".to_string()).to_string(),
            "transient connection failure: connection reset"
        );
        assert_eq!(
            RowSourceError::Rejected("permission denied".to_string()).to_string(),
            "query rejected: permission denied"
        );
    }
}
