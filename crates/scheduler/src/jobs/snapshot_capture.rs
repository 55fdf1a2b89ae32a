//! Daily snapshot capture background job.
//!
//! Queries the visitor database for the day's top rows and archives them as
//! a write-once dated blob.

use std::sync::Arc;

use chrono::Utc;
use domain::services::{JobError, SnapshotJob};
use tracing::info;

use super::scheduler::{Job, JobFrequency};

/// Background job wrapping the capture phase of the snapshot pipeline.
pub struct SnapshotCaptureJob {
    pipeline: Arc<SnapshotJob>,
    hour_utc: u32,
}

impl SnapshotCaptureJob {
    /// Create a new capture job firing daily at the given UTC hour.
    pub fn new(pipeline: Arc<SnapshotJob>, hour_utc: u32) -> Self {
        Self { pipeline, hour_utc }
    }
}

#[async_trait::async_trait]
impl Job for SnapshotCaptureJob {
    fn name(&self) -> &'static str {
        "snapshot_capture"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::DailyAt {
            hour: self.hour_utc,
        }
    }

    async fn execute(&self) -> Result<(), String> {
        let today = Utc::now().date_naive();

        match self.pipeline.capture(today).await {
            Ok(snapshot) => {
                info!(
                    key = %snapshot.key(),
                    rows = snapshot.records.len(),
                    "Snapshot captured"
                );
                Ok(())
            }
            // The day's blob already exists; a rerun has nothing to add.
            Err(JobError::DuplicateSnapshot(key)) => {
                info!(key = %key, "Snapshot already archived, skipping");
                Ok(())
            }
            Err(e) => Err(format!("Snapshot capture failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_capture_job_fires_at_configured_hour() {
        let freq = JobFrequency::DailyAt { hour: 1 };
        let now = chrono::Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        assert_eq!(freq.next_delay(now), Duration::from_secs(3600));
    }
}
