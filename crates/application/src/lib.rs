//! Application layer - Use cases and orchestration
//!
//! Contains the port definitions, the message composer, the delivery
//! orchestrator and the submission service that ties intake to delivery.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
