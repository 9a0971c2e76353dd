//! Application-level errors

use thiserror::Error;

/// Errors that can occur in the application layer
///
/// Delivery problems never surface here: storage and mail failures are
/// recorded in the [`DeliveryReport`](domain::DeliveryReport) instead.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Background processing task died before finishing
    #[error("Submission processing aborted: {0}")]
    TaskAborted(String),
}
