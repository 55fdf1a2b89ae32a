//! Repository implementations.

pub mod visitor_log;

pub use visitor_log::VisitorLogRepository;
