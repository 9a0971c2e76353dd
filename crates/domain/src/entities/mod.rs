//! Domain entities - Objects with identity and lifecycle

mod delivery;
mod submission;

pub use delivery::{
    AttemptOutcome, DegradedReason, DeliveryAttempt, DeliveryChannel, DeliveryOutcome,
    DeliveryReport,
};
pub use submission::{ConsultationDetails, Submission, SubmissionDetails};
