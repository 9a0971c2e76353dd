//! Application services - Use case implementations

pub mod delivery_orchestrator;
mod health_service;
pub mod message_composer;
mod submission_service;

pub use delivery_orchestrator::{
    DEFAULT_SEND_TIMEOUT_SECS, DeliveryOrchestrator, MAX_NOTIFICATION_SENDS, submission_record,
};
pub use health_service::{HealthService, ReadinessReport, ServiceHealth};
pub use message_composer::{MessageComposer, NotificationSettings, escape_html};
pub use submission_service::SubmissionService;
