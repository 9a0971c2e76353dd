//! Application state shared across handlers

use std::sync::Arc;

use application::{HealthService, SubmissionService};
use infrastructure::AppConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Intake and delivery of form submissions
    pub submission_service: Arc<SubmissionService>,
    /// Dependency probes for readiness
    pub health_service: Arc<HealthService>,
    /// Application configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Whether responses may carry diagnostics
    #[must_use]
    pub fn expose_diagnostics(&self) -> bool {
        !self.config.is_production()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("environment", &self.config.environment)
            .finish_non_exhaustive()
    }
}
