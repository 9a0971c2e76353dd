//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod mail_port;
mod submission_store_port;

#[cfg(test)]
pub use mail_port::MockMailPort;
pub use mail_port::{MailError, MailPort, MessageId, OutgoingMail};
#[cfg(test)]
pub use submission_store_port::MockSubmissionStorePort;
pub use submission_store_port::{
    RecordId, SUBMISSIONS_TABLE, StorageError, StorageRecord, StoredSubmission,
    SubmissionStorePort,
};
