//! Domain services for the Visitor Monitor backend.
//!
//! The capability traits here are the seams to the external collaborators
//! (database, object storage, completion API, mail). Concrete clients live in
//! the scheduler crate; in-memory implementations for development and tests
//! live beside their traits.

pub mod narrative;
pub mod notifier;
pub mod retry;
pub mod row_source;
pub mod snapshot_job;
pub mod snapshot_store;

pub use narrative::{build_diff_prompt, EngineError, NarrativeEngine};
pub use notifier::{Delivery, Notifier, NotifyError};
pub use retry::RetryPolicy;
pub use row_source::{RowSource, RowSourceError};
pub use snapshot_job::{AnalysisOutcome, JobError, JobSettings, SnapshotJob};
pub use snapshot_store::{InMemorySnapshotStore, SnapshotStore, StoreError};
