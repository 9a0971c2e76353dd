//! Domain layer for formrelay
//!
//! Contains the submission model, the intake validator, delivery
//! attempt/outcome types and domain errors. This layer performs no I/O.

pub mod entities;
pub mod errors;
pub mod intake;
pub mod value_objects;

pub use entities::*;
pub use errors::{DomainError, ValidationError, ValidationReason};
pub use intake::{RawSubmission, validate};
pub use value_objects::*;
