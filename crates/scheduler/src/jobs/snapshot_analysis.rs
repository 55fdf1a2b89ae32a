//! Daily snapshot analysis background job.
//!
//! Reads the current and prior snapshots, asks the narrative engine for a
//! diff summary, and emails the report to the operator.

use std::sync::Arc;

use chrono::Utc;
use domain::services::{AnalysisOutcome, SnapshotJob};
use tracing::{info, warn};

use super::scheduler::{Job, JobFrequency};

/// Background job wrapping the analysis phase of the snapshot pipeline.
pub struct SnapshotAnalysisJob {
    pipeline: Arc<SnapshotJob>,
    hour_utc: u32,
    lookback_days: u32,
}

impl SnapshotAnalysisJob {
    /// Create a new analysis job firing daily at the given UTC hour.
    pub fn new(pipeline: Arc<SnapshotJob>, hour_utc: u32, lookback_days: u32) -> Self {
        Self {
            pipeline,
            hour_utc,
            lookback_days,
        }
    }
}

#[async_trait::async_trait]
impl Job for SnapshotAnalysisJob {
    fn name(&self) -> &'static str {
        "snapshot_analysis"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::DailyAt {
            hour: self.hour_utc,
        }
    }

    async fn execute(&self) -> Result<(), String> {
        let today = Utc::now().date_naive();

        match self.pipeline.analyze(today, self.lookback_days).await {
            Ok(AnalysisOutcome::Report(report)) => {
                info!(
                    prior = %report.prior_key,
                    current = %report.current_key,
                    "Analysis report sent"
                );
                Ok(())
            }
            // Not enough archived days yet; the run is a no-op, not a failure.
            Ok(AnalysisOutcome::InsufficientHistory { missing_key }) => {
                warn!(missing = %missing_key, "Insufficient snapshot history, skipping analysis");
                Ok(())
            }
            Err(e) => Err(format!("Snapshot analysis failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_analysis_job_fires_after_capture() {
        let capture = JobFrequency::DailyAt { hour: 1 };
        let analysis = JobFrequency::DailyAt { hour: 6 };
        let midnight = chrono::Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        assert!(analysis.next_delay(midnight) > capture.next_delay(midnight));
        assert_eq!(analysis.next_delay(midnight), Duration::from_secs(6 * 3600));
    }
}
