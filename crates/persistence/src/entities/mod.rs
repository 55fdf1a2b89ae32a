//! Database entity definitions.

pub mod visitor_stat;

pub use visitor_stat::VisitorStatEntity;
