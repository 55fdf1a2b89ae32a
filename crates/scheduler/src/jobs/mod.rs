//! Background jobs for the daily snapshot pipeline.

pub mod scheduler;
pub mod snapshot_analysis;
pub mod snapshot_capture;

pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use snapshot_analysis::SnapshotAnalysisJob;
pub use snapshot_capture::SnapshotCaptureJob;
