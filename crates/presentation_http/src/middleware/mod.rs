//! HTTP middleware components
//!
//! Request correlation and request body extraction.

pub mod form_payload;
pub mod request_id;

pub use form_payload::{FormPayload, PayloadError, PayloadRejection};
pub use request_id::{REQUEST_ID_HEADER, RequestIdLayer};
