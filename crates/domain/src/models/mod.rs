//! Domain models for the Visitor Monitor backend.

pub mod diff_report;
pub mod run_status;
pub mod snapshot;
pub mod visitor;

pub use diff_report::DiffReport;
pub use run_status::{Checkpoint, Outcome, RunLog, RunStatus};
pub use snapshot::{status_key_for, Snapshot};
pub use visitor::{ParseError, VisitorRecord};
