//! Readiness checks
//!
//! Probes the submission store and the primary mail transport with bounded
//! timeouts. The service is ready when the store is reachable; the mail
//! transport is reported but does not gate readiness, since a submission is
//! still stored when mail is down.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::ports::{MailPort, SubmissionStorePort};

/// Default timeout for each probe in seconds
const DEFAULT_HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;

/// Status of an individual dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
    /// Whether the dependency responded
    pub healthy: bool,
    /// Response time in milliseconds (if the probe completed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    /// Error message if unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceHealth {
    /// Create a healthy status
    #[must_use]
    pub const fn healthy() -> Self {
        Self {
            healthy: true,
            response_time_ms: None,
            error: None,
        }
    }

    /// Create an unhealthy status
    #[must_use]
    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            response_time_ms: None,
            error: Some(error.into()),
        }
    }

    /// Create an unhealthy status due to timeout
    #[must_use]
    pub fn timeout() -> Self {
        Self::unhealthy("Health check timed out")
    }

    /// Add response time to the status
    #[must_use]
    pub const fn with_response_time(mut self, ms: u64) -> Self {
        self.response_time_ms = Some(ms);
        self
    }
}

/// Readiness of the whole service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessReport {
    /// True if the database is reachable
    pub ready: bool,
    /// Individual dependency statuses
    pub services: HashMap<String, ServiceHealth>,
    /// Timestamp of the check
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl ReadinessReport {
    /// Status of a specific dependency
    #[must_use]
    pub fn service_status(&self, name: &str) -> Option<&ServiceHealth> {
        self.services.get(name)
    }
}

/// Probes the dependencies a submission needs
pub struct HealthService {
    store: Arc<dyn SubmissionStorePort>,
    mail: Arc<dyn MailPort>,
    probe_timeout: Duration,
}

impl std::fmt::Debug for HealthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthService")
            .field("probe_timeout", &self.probe_timeout)
            .finish_non_exhaustive()
    }
}

impl HealthService {
    /// Create a health service over the store and primary transport
    #[must_use]
    pub fn new(store: Arc<dyn SubmissionStorePort>, mail: Arc<dyn MailPort>) -> Self {
        Self {
            store,
            mail,
            probe_timeout: Duration::from_secs(DEFAULT_HEALTH_CHECK_TIMEOUT_SECS),
        }
    }

    /// Override the per-probe timeout
    #[must_use]
    pub const fn with_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    /// Check all dependencies
    #[instrument(skip(self))]
    pub async fn check_all(&self) -> ReadinessReport {
        let (database, mail) = tokio::join!(self.check_database(), self.check_mail());
        let ready = database.healthy;

        let mut services = HashMap::new();
        services.insert("database".to_string(), database);
        services.insert("mail".to_string(), mail);

        ReadinessReport {
            ready,
            services,
            checked_at: chrono::Utc::now(),
        }
    }

    /// Probe the submission store
    #[instrument(skip(self))]
    pub async fn check_database(&self) -> ServiceHealth {
        self.probe("database", self.store.is_available()).await
    }

    /// Probe the primary mail transport
    #[instrument(skip(self))]
    pub async fn check_mail(&self) -> ServiceHealth {
        self.probe("mail", self.mail.is_available()).await
    }

    async fn probe(
        &self,
        name: &str,
        check: impl std::future::Future<Output = bool>,
    ) -> ServiceHealth {
        let start = Instant::now();

        let Ok(available) = timeout(self.probe_timeout, check).await else {
            warn!(service = name, "Health check timed out");
            return ServiceHealth::timeout();
        };

        // Probe timeouts are seconds, far below u64::MAX milliseconds
        #[allow(clippy::cast_possible_truncation)]
        let response_time = start.elapsed().as_millis() as u64;
        if available {
            debug!(service = name, response_time_ms = response_time, "Dependency healthy");
            ServiceHealth::healthy().with_response_time(response_time)
        } else {
            warn!(service = name, response_time_ms = response_time, "Dependency unhealthy");
            ServiceHealth::unhealthy(format!("{name} unavailable"))
                .with_response_time(response_time)
        }
    }
}
