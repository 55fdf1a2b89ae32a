//! Per-run status accumulation.
//!
//! Every external call in a run maps to a declared checkpoint. A run log is
//! born empty at job start, collects exactly one entry per checkpoint, and is
//! closed at job end: checkpoints the run never reached are filled in as
//! failures so a partially failed run still yields a complete ordered audit
//! trail instead of stopping silently at the first fault.

use uuid::Uuid;

/// Named point in the pipeline whose outcome is always recorded.
///
/// Ids are stable across releases; status blobs are archive data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    Connect,
    Query,
    Serialize,
    Upload,
    ReadPrior,
    ReadCurrent,
    Narrative,
    Notify,
}

impl Checkpoint {
    /// Stable numeric id for archived status records.
    pub fn id(&self) -> u8 {
        match self {
            Checkpoint::Connect => 1,
            Checkpoint::Query => 2,
            Checkpoint::Serialize => 3,
            Checkpoint::Upload => 4,
            Checkpoint::ReadPrior => 5,
            Checkpoint::ReadCurrent => 6,
            Checkpoint::Narrative => 7,
            Checkpoint::Notify => 8,
        }
    }

    /// Stable symbolic name for logs and status blobs.
    pub fn name(&self) -> &'static str {
        match self {
            Checkpoint::Connect => "connect",
            Checkpoint::Query => "query",
            Checkpoint::Serialize => "serialize",
            Checkpoint::Upload => "upload",
            Checkpoint::ReadPrior => "read_prior",
            Checkpoint::ReadCurrent => "read_current",
            Checkpoint::Narrative => "narrative",
            Checkpoint::Notify => "notify",
        }
    }
}

/// Outcome of one checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Failure => write!(f, "failure"),
        }
    }
}

/// One recorded checkpoint outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatus {
    pub checkpoint: Checkpoint,
    pub outcome: Outcome,
    pub detail: String,
}

impl RunStatus {
    /// Render as one status line, e.g. `4 upload: failure - blob already exists`.
    pub fn to_line(&self) -> String {
        if self.detail.is_empty() {
            format!(
                "{} {}: {}",
                self.checkpoint.id(),
                self.checkpoint.name(),
                self.outcome
            )
        } else {
            format!(
                "{} {}: {} - {}",
                self.checkpoint.id(),
                self.checkpoint.name(),
                self.outcome,
                self.detail
            )
        }
    }
}

/// Ordered audit trail for a single run.
#[derive(Debug)]
pub struct RunLog {
    run_id: Uuid,
    phase: &'static str,
    declared: &'static [Checkpoint],
    entries: Vec<Option<RunStatus>>,
}

/// Checkpoints of the capture phase, in stage order.
pub const CAPTURE_CHECKPOINTS: &[Checkpoint] = &[
    Checkpoint::Connect,
    Checkpoint::Query,
    Checkpoint::Serialize,
    Checkpoint::Upload,
];

/// Checkpoints of the analysis phase, in stage order.
pub const ANALYSIS_CHECKPOINTS: &[Checkpoint] = &[
    Checkpoint::ReadPrior,
    Checkpoint::ReadCurrent,
    Checkpoint::Narrative,
    Checkpoint::Notify,
];

impl RunLog {
    /// Start a capture-phase run log.
    pub fn capture() -> Self {
        Self::with_checkpoints("capture", CAPTURE_CHECKPOINTS)
    }

    /// Start an analysis-phase run log.
    pub fn analysis() -> Self {
        Self::with_checkpoints("analysis", ANALYSIS_CHECKPOINTS)
    }

    fn with_checkpoints(phase: &'static str, declared: &'static [Checkpoint]) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            phase,
            declared,
            entries: vec![None; declared.len()],
        }
    }

    /// Unique id for this run, carried through log events.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Which pipeline phase this run belongs to.
    pub fn phase(&self) -> &'static str {
        self.phase
    }

    /// Record a successful checkpoint.
    pub fn success(&mut self, checkpoint: Checkpoint, detail: impl Into<String>) {
        self.record(checkpoint, Outcome::Success, detail.into());
    }

    /// Record a failed checkpoint.
    pub fn failure(&mut self, checkpoint: Checkpoint, detail: impl Into<String>) {
        self.record(checkpoint, Outcome::Failure, detail.into());
    }

    /// Record an outcome for a declared checkpoint.
    ///
    /// Re-recording overwrites: under capture retries the entry reflects the
    /// final attempt, keeping the one-entry-per-checkpoint invariant.
    fn record(&mut self, checkpoint: Checkpoint, outcome: Outcome, detail: String) {
        let slot = self
            .declared
            .iter()
            .position(|c| *c == checkpoint)
            .unwrap_or_else(|| panic!("checkpoint {} not declared for this run", checkpoint.name()));

        tracing::debug!(
            run_id = %self.run_id,
            checkpoint = checkpoint.name(),
            outcome = %outcome,
            detail = %detail,
            "Checkpoint recorded"
        );

        self.entries[slot] = Some(RunStatus {
            checkpoint,
            outcome,
            detail,
        });
    }

    /// Close the run: fill checkpoints the run never reached with a failure
    /// entry naming where the run ended.
    pub fn close(&mut self) {
        let ended_at = self
            .declared
            .iter()
            .zip(&self.entries)
            .filter(|(_, e)| e.is_some())
            .map(|(c, _)| c.name())
            .last()
            .unwrap_or("start");

        for (slot, checkpoint) in self.declared.iter().enumerate() {
            if self.entries[slot].is_none() {
                self.entries[slot] = Some(RunStatus {
                    checkpoint: *checkpoint,
                    outcome: Outcome::Failure,
                    detail: format!("not reached (run ended at {})", ended_at),
                });
            }
        }
    }

    /// Recorded entries in declared stage order.
    ///
    /// After `close` this holds exactly one entry per declared checkpoint.
    pub fn entries(&self) -> Vec<&RunStatus> {
        self.entries.iter().flatten().collect()
    }

    /// Whether every recorded checkpoint succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.entries
            .iter()
            .flatten()
            .all(|s| s.outcome == Outcome::Success)
    }

    /// Render the recorded entries as newline-joined status lines.
    pub fn render(&self) -> String {
        self.entries()
            .iter()
            .map(|s| s.to_line())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
