//! Domain layer for the Visitor Monitor backend.
//!
//! This crate contains:
//! - Domain models (VisitorRecord, Snapshot, DiffReport, RunStatus)
//! - The capability traits for external collaborators
//! - The snapshot capture/analysis orchestration

pub mod models;
pub mod services;
