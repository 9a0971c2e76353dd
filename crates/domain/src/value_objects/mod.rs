//! Value Objects - Immutable, identity-less domain primitives

mod email_address;
mod request_id;
mod submission_kind;
mod submission_status;

pub use email_address::EmailAddress;
pub use request_id::RequestId;
pub use submission_kind::SubmissionKind;
pub use submission_status::SubmissionStatus;
