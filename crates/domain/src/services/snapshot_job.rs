//! Snapshot capture and analysis orchestration.
//!
//! The two phases run on separate schedules and share nothing but the
//! store's key convention. Capture retries transient faults up to the
//! configured budget, redoing the whole attempt each time. Analysis attempts
//! each external call exactly once. Every external call records a checkpoint
//! in the run log, and the closed log is written to the status namespace
//! best-effort.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::models::snapshot::status_key_for;
use crate::models::{Checkpoint, DiffReport, RunLog, Snapshot};

use super::narrative::{build_diff_prompt, EngineError, NarrativeEngine};
use super::notifier::{Delivery, Notifier, NotifyError};
use super::retry::RetryPolicy;
use super::row_source::{RowSource, RowSourceError};
use super::snapshot_store::{SnapshotStore, StoreError};

/// Terminal classification of a failed run.
#[derive(Debug, Error)]
pub enum JobError {
    /// Timeout or connection reset talking to a collaborator. Retryable in
    /// the capture phase only.
    #[error("transient transport failure: {0}")]
    Transient(String),

    /// The day's snapshot is already archived. Intentional
    /// idempotence-by-refusal, not a bug: a rerun must not overwrite the
    /// archival record.
    #[error("snapshot already captured: {0}")]
    DuplicateSnapshot(String),

    /// Malformed query or permission denied. Never retried.
    #[error("query rejected: {0}")]
    Rejected(String),

    /// Catch-all for faults outside the expected taxonomy.
    #[error("unexpected fault: {0}")]
    Unexpected(String),
}

impl JobError {
    pub fn is_transient(&self) -> bool {
        matches!(self, JobError::Transient(_))
    }
}

/// Result of an analysis run.
#[derive(Debug)]
pub enum AnalysisOutcome {
    /// Both snapshots were present; the report was produced and delivered.
    Report(DiffReport),
    /// A required snapshot is missing. Common when the service has not been
    /// running for the full lookback window; reported, not an error. Neither
    /// the narrative engine nor the notifier is invoked.
    InsufficientHistory { missing_key: String },
}

/// Tunables for both phases.
#[derive(Debug, Clone)]
pub struct JobSettings {
    /// Fixed operator recipient for analysis emails.
    pub recipient: String,
    /// Capture-phase retry budget.
    pub retry: RetryPolicy,
    /// Response-size bound passed to the narrative engine.
    pub max_narrative_tokens: Option<u32>,
    /// Append the run's status checklist to the email body.
    pub include_status_in_email: bool,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            recipient: String::new(),
            retry: RetryPolicy::default(),
            max_narrative_tokens: Some(1024),
            include_status_in_email: true,
        }
    }
}

/// Orchestrates the snapshot-diff-and-notify pipeline.
///
/// Collaborators are constructed per-process and injected; the job holds no
/// ambient state and each run's data is run-local.
pub struct SnapshotJob {
    rows: Arc<dyn RowSource>,
    snapshots: Arc<dyn SnapshotStore>,
    status: Option<Arc<dyn SnapshotStore>>,
    engine: Arc<dyn NarrativeEngine>,
    notifier: Arc<dyn Notifier>,
    settings: JobSettings,
}

impl SnapshotJob {
    pub fn new(
        rows: Arc<dyn RowSource>,
        snapshots: Arc<dyn SnapshotStore>,
        status: Option<Arc<dyn SnapshotStore>>,
        engine: Arc<dyn NarrativeEngine>,
        notifier: Arc<dyn Notifier>,
        settings: JobSettings,
    ) -> Self {
        Self {
            rows,
            snapshots,
            status,
            engine,
            notifier,
            settings,
        }
    }

    /// Capture phase: query, serialize, archive today's snapshot.
    ///
    /// Transient faults redo the whole attempt (steps 1-4) up to the retry
    /// budget. A duplicate snapshot or a rejected query ends the run on
    /// first occurrence.
    pub async fn capture(&self, today: NaiveDate) -> Result<Snapshot, JobError> {
        let mut log = RunLog::capture();
        let run_id = log.run_id();
        info!(run_id = %run_id, date = %today, "Capture run starting");

        let mut attempt = 1u32;
        let outcome = loop {
            match self.capture_attempt(today, &mut log).await {
                Ok(snapshot) => break Ok(snapshot),
                Err(err) if self.settings.retry.should_retry(&err, attempt) => {
                    warn!(
                        run_id = %run_id,
                        attempt = attempt,
                        max_attempts = self.settings.retry.max_attempts,
                        error = %err,
                        "Capture attempt failed, retrying"
                    );
                    self.settings.retry.wait().await;
                    attempt += 1;
                }
                Err(err) => break Err(err),
            }
        };

        log.close();
        self.write_status(today, &log).await;

        match &outcome {
            Ok(snapshot) => info!(
                run_id = %run_id,
                key = %snapshot.key(),
                records = snapshot.records.len(),
                attempts = attempt,
                "Capture run completed"
            ),
            Err(err) => error!(
                run_id = %run_id,
                attempts = attempt,
                error = %err,
                "Capture run failed"
            ),
        }

        outcome
    }

    /// One full capture attempt: steps 1-4 of the pipeline.
    async fn capture_attempt(
        &self,
        today: NaiveDate,
        log: &mut RunLog,
    ) -> Result<Snapshot, JobError> {
        // Steps 1-2: scoped connection and the fixed top-N query. The row
        // source owns connection scoping; a transient fault here is a
        // connection-level failure, a rejection is a query-level one.
        let records = match self.rows.top_visitors().await {
            Ok(records) => {
                log.success(Checkpoint::Connect, "");
                log.success(Checkpoint::Query, format!("{} rows", records.len()));
                records
            }
            Err(RowSourceError::Transient(msg)) => {
                log.failure(Checkpoint::Connect, msg.clone());
                return Err(JobError::Transient(msg));
            }
            Err(RowSourceError::Rejected(msg)) => {
                log.success(Checkpoint::Connect, "");
                log.failure(Checkpoint::Query, msg.clone());
                return Err(JobError::Rejected(msg));
            }
        };

        // Step 3: deterministic serialization, stable source order. An
        // identifier the line grammar cannot round-trip would corrupt the
        // archive, so the run refuses it instead of writing it.
        if let Some(bad) = records.iter().find(|r| !r.is_line_safe()) {
            let msg = format!("identifier breaks line grammar: {:?}", bad.identifier);
            log.failure(Checkpoint::Serialize, msg.clone());
            return Err(JobError::Rejected(msg));
        }
        let snapshot = Snapshot::from_records(today, records);
        log.success(
            Checkpoint::Serialize,
            format!("{} bytes", snapshot.serialized.len()),
        );

        // Step 4: write-once upload.
        match self
            .snapshots
            .write(&snapshot.key(), &snapshot.serialized)
            .await
        {
            Ok(()) => {
                log.success(Checkpoint::Upload, snapshot.key());
                Ok(snapshot)
            }
            Err(StoreError::AlreadyExists(key)) => {
                log.failure(Checkpoint::Upload, format!("blob already exists: {}", key));
                Err(JobError::DuplicateSnapshot(key))
            }
            Err(StoreError::Transport(msg)) => {
                log.failure(Checkpoint::Upload, msg.clone());
                Err(JobError::Transient(msg))
            }
            Err(StoreError::NotFound(key)) => {
                log.failure(Checkpoint::Upload, format!("store rejected key: {}", key));
                Err(JobError::Unexpected(format!(
                    "store reported not-found on write: {}",
                    key
                )))
            }
        }
    }

    /// Analysis phase: read two snapshots, diff through the narrative
    /// engine, deliver the report exactly once.
    pub async fn analyze(
        &self,
        today: NaiveDate,
        lookback_days: u32,
    ) -> Result<AnalysisOutcome, JobError> {
        let mut log = RunLog::analysis();
        let run_id = log.run_id();

        let prior_date = today - chrono::Duration::days(i64::from(lookback_days));
        let prior_key = Snapshot::key_for(prior_date);
        let current_key = Snapshot::key_for(today);

        info!(
            run_id = %run_id,
            prior_key = %prior_key,
            current_key = %current_key,
            "Analysis run starting"
        );

        let outcome = self
            .analyze_steps(&prior_key, &current_key, &mut log)
            .await;

        log.close();
        self.write_status(today, &log).await;

        match &outcome {
            Ok(AnalysisOutcome::Report(report)) => info!(
                run_id = %run_id,
                current_key = %report.current_key,
                narrative_chars = report.narrative.len(),
                "Analysis run completed, report delivered"
            ),
            Ok(AnalysisOutcome::InsufficientHistory { missing_key }) => info!(
                run_id = %run_id,
                missing_key = %missing_key,
                "Analysis run ended: insufficient history"
            ),
            Err(err) => error!(run_id = %run_id, error = %err, "Analysis run failed"),
        }

        outcome
    }

    async fn analyze_steps(
        &self,
        prior_key: &str,
        current_key: &str,
        log: &mut RunLog,
    ) -> Result<AnalysisOutcome, JobError> {
        let prior_text = match self
            .read_snapshot(prior_key, Checkpoint::ReadPrior, log)
            .await?
        {
            Some(text) => text,
            None => {
                return Ok(AnalysisOutcome::InsufficientHistory {
                    missing_key: prior_key.to_string(),
                })
            }
        };

        let current_text = match self
            .read_snapshot(current_key, Checkpoint::ReadCurrent, log)
            .await?
        {
            Some(text) => text,
            None => {
                return Ok(AnalysisOutcome::InsufficientHistory {
                    missing_key: current_key.to_string(),
                })
            }
        };

        // One completion call, no retry.
        let prompt = build_diff_prompt(prior_key, &prior_text, current_key, &current_text);
        let narrative = match self
            .engine
            .complete(&prompt, self.settings.max_narrative_tokens)
            .await
        {
            Ok(text) => {
                log.success(Checkpoint::Narrative, format!("{} chars", text.len()));
                text
            }
            Err(EngineError::Transport(msg)) => {
                log.failure(Checkpoint::Narrative, msg.clone());
                return Err(JobError::Transient(msg));
            }
        };

        // One delivery, no retry: a duplicate email is worse than a missed
        // report.
        let subject = format!("Visitor analysis for {}", current_key);
        let body = if self.settings.include_status_in_email {
            format!("{}\n\nRun checklist:\n{}", narrative, log.render())
        } else {
            narrative.clone()
        };

        match self
            .notifier
            .send(&self.settings.recipient, &subject, &body)
            .await
        {
            Ok(Delivery::Sent) => log.success(Checkpoint::Notify, self.settings.recipient.clone()),
            Ok(Delivery::Skipped(reason)) => {
                warn!(run_id = %log.run_id(), reason = %reason, "Report delivery skipped");
                log.success(Checkpoint::Notify, format!("skipped: {}", reason));
            }
            Err(NotifyError::Transport(msg)) => {
                log.failure(Checkpoint::Notify, msg.clone());
                return Err(JobError::Transient(msg));
            }
        }

        Ok(AnalysisOutcome::Report(DiffReport {
            prior_key: prior_key.to_string(),
            current_key: current_key.to_string(),
            narrative,
        }))
    }

    /// Read one snapshot, distinguishing missing history from transport
    /// faults. `Ok(None)` means the key was never written.
    async fn read_snapshot(
        &self,
        key: &str,
        checkpoint: Checkpoint,
        log: &mut RunLog,
    ) -> Result<Option<String>, JobError> {
        match self.snapshots.read(key).await {
            Ok(text) => {
                log.success(checkpoint, key.to_string());
                Ok(Some(text))
            }
            Err(StoreError::NotFound(_)) => {
                log.failure(checkpoint, format!("insufficient history: {} missing", key));
                Ok(None)
            }
            Err(StoreError::Transport(msg)) => {
                log.failure(checkpoint, msg.clone());
                Err(JobError::Transient(msg))
            }
            Err(StoreError::AlreadyExists(key)) => {
                log.failure(checkpoint, format!("store fault reading {}", key));
                Err(JobError::Unexpected(format!(
                    "store reported already-exists on read: {}",
                    key
                )))
            }
        }
    }

    /// Write the closed run log to the status namespace, best-effort.
    ///
    /// Both phases share the day's status key; the write-once store keeps
    /// whichever ran first. The blob opens with a phase header so the
    /// operator can tell which phase won the key, and a blocked write emits
    /// the losing phase's full trail to the log instead. Failures here never
    /// affect the run's outcome.
    async fn write_status(&self, date: NaiveDate, log: &RunLog) {
        let Some(store) = &self.status else {
            return;
        };

        let key = status_key_for(date);
        let blob = format!("{} run {}\n{}", log.phase(), log.run_id(), log.render());
        match store.write(&key, &blob).await {
            Ok(()) => {
                tracing::debug!(run_id = %log.run_id(), key = %key, "Status blob written")
            }
            Err(StoreError::AlreadyExists(_)) => info!(
                run_id = %log.run_id(),
                key = %key,
                phase = log.phase(),
                trail = %log.render(),
                "Status key already taken for today; run trail kept in the log"
            ),
            Err(err) => warn!(
                run_id = %log.run_id(),
                key = %key,
                error = %err,
                "Status blob write failed"
            ),
        }
    }
}
