//! Notifier capability: message delivery to the fixed operator recipient.

use thiserror::Error;

/// Errors surfaced by a notifier.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Delivery failure. Never retried: a duplicate send to the operator is
    /// worse than a missed report for this workload.
    #[error("notification transport failure: {0}")]
    Transport(String),
}

/// What happened to an accepted message.
///
/// A skip is a deliberate non-send (delivery disabled in config, for
/// instance); the reason lands in the run's status trail so the operator can
/// tell it apart from a delivered report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the transport.
    Sent,
    /// Deliberately not sent, with the reason.
    Skipped(String),
}

/// Delivery of a finished report to an operator.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Send one message. Implementations must not retry internally.
    async fn send(&self, recipient: &str, subject: &str, body: &str)
        -> Result<Delivery, NotifyError>;
}
