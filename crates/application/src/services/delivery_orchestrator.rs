//! Delivery orchestrator
//!
//! Brings a validated submission to a terminal [`DeliveryOutcome`] through two
//! independent channels:
//!
//! 1. **Storage**: one insert into the submissions table.
//! 2. **Email**: a notification through the primary transport. A transient
//!    failure is retried exactly once, through the alternate transport when one
//!    is registered. Without an alternate the one retry goes back through the
//!    primary, so a single-transport deployment still gets its second attempt.
//!    If every send fails, a single best-effort alert goes to the operator.
//!
//! Both channels run concurrently and are always both awaited. A valid
//! submission never ends in a hard failure: losing a channel yields
//! `Degraded`.

use std::{fmt, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use domain::{
    DeliveryAttempt, DeliveryChannel, DeliveryOutcome, DeliveryReport, RequestId, Submission,
    SubmissionStatus,
};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    ports::{
        MailError, MailPort, MessageId, OutgoingMail, SUBMISSIONS_TABLE, StorageRecord,
        SubmissionStorePort,
    },
    services::message_composer::MessageComposer,
};

/// Default per-send timeout in seconds
pub const DEFAULT_SEND_TIMEOUT_SECS: u64 = 15;

/// Upper bound on notification sends for one submission
pub const MAX_NOTIFICATION_SENDS: u8 = 2;

/// Row written for a submission
pub fn submission_record(
    submission: &Submission,
    request_id: RequestId,
    received_at: DateTime<Utc>,
) -> StorageRecord {
    let consultation = submission.consultation();

    StorageRecord::new(SUBMISSIONS_TABLE)
        .with("request_id", request_id.to_string())
        .with("kind", submission.kind().as_str())
        .with("name", submission.name())
        .with("email", submission.email().as_str())
        .with_opt("phone", submission.phone())
        .with("subject", submission.record_subject())
        .with("message", submission.body())
        .with_opt("company", consultation.and_then(|c| c.company.as_deref()))
        .with_opt(
            "project_type",
            consultation.and_then(|c| c.project_type.as_deref()),
        )
        .with_opt("budget", consultation.and_then(|c| c.budget.as_deref()))
        .with_opt("timeline", consultation.and_then(|c| c.timeline.as_deref()))
        .with("created_at", received_at.to_rfc3339())
        .with("status", SubmissionStatus::Unread.as_str())
}

/// Runs the storage and notification channels for each submission
pub struct DeliveryOrchestrator {
    store: Arc<dyn SubmissionStorePort>,
    primary: Arc<dyn MailPort>,
    alternate: Option<Arc<dyn MailPort>>,
    composer: MessageComposer,
    send_timeout: Duration,
}

impl fmt::Debug for DeliveryOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryOrchestrator")
            .field("has_alternate", &self.alternate.is_some())
            .field("composer", &self.composer)
            .field("send_timeout", &self.send_timeout)
            .finish_non_exhaustive()
    }
}

impl DeliveryOrchestrator {
    /// Create an orchestrator with a primary transport only
    pub fn new(
        store: Arc<dyn SubmissionStorePort>,
        primary: Arc<dyn MailPort>,
        composer: MessageComposer,
    ) -> Self {
        Self {
            store,
            primary,
            alternate: None,
            composer,
            send_timeout: Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
        }
    }

    /// Register the transport used for the transient-failure retry
    #[must_use]
    pub fn with_alternate(mut self, alternate: Arc<dyn MailPort>) -> Self {
        self.alternate = Some(alternate);
        self
    }

    /// Bound each notification send
    #[must_use]
    pub const fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Primary transport, for readiness checks
    pub fn primary(&self) -> Arc<dyn MailPort> {
        Arc::clone(&self.primary)
    }

    /// Deliver a submission and return its outcome
    pub async fn deliver(&self, submission: Submission) -> DeliveryOutcome {
        self.process(submission, RequestId::new()).await.outcome
    }

    /// Deliver a submission and return the full report
    #[instrument(
        skip(self, submission, request_id),
        fields(request_id = %request_id, kind = %submission.kind())
    )]
    pub async fn process(&self, submission: Submission, request_id: RequestId) -> DeliveryReport {
        let received_at = Utc::now();

        let (storage, email) = tokio::join!(
            self.store_record(&submission, request_id, received_at),
            self.notify(&submission, request_id, received_at),
        );

        let outcome = DeliveryOutcome::from_channels(storage.is_success(), email.is_success());
        let kind = submission.kind();

        match &outcome {
            DeliveryOutcome::Delivered => {
                info!(%request_id, %kind, outcome = outcome.label(), "Submission delivered");
            },
            DeliveryOutcome::Degraded(reason) => {
                warn!(%request_id, %kind, %reason, "Submission delivery degraded");
            },
            DeliveryOutcome::Rejected(_) => {},
        }

        DeliveryReport {
            request_id,
            kind,
            outcome,
            attempts: vec![storage, email],
        }
    }

    async fn store_record(
        &self,
        submission: &Submission,
        request_id: RequestId,
        received_at: DateTime<Utc>,
    ) -> DeliveryAttempt {
        let started_at = Utc::now();
        let record = submission_record(submission, request_id, received_at);

        let attempt = match self.store.insert(&record).await {
            Ok(id) => {
                DeliveryAttempt::succeeded(DeliveryChannel::Storage, started_at, id.to_string(), 1)
            },
            Err(e) => {
                error!(error = %e, transient = e.is_transient(), "Failed to store submission");
                DeliveryAttempt::failed(DeliveryChannel::Storage, started_at, e.to_string(), 1)
            },
        };
        log_attempt(&attempt);
        attempt
    }

    async fn notify(
        &self,
        submission: &Submission,
        request_id: RequestId,
        received_at: DateTime<Utc>,
    ) -> DeliveryAttempt {
        let started_at = Utc::now();
        let mail = self.composer.compose(submission, request_id, received_at);
        let mut failures = Vec::new();

        let first = match self.send_via(&*self.primary, &mail).await {
            Ok(id) => {
                let attempt = DeliveryAttempt::succeeded(
                    DeliveryChannel::Email,
                    started_at,
                    id.to_string(),
                    1,
                );
                log_attempt(&attempt);
                return attempt;
            },
            Err(e) => e,
        };
        warn!(transport = %self.primary.name(), error = %first, "Notification send failed");
        failures.push(format!("{}: {first}", self.primary.name()));

        if first.is_transient() {
            let retry = self.alternate.as_ref().unwrap_or(&self.primary);
            debug!(transport = %retry.name(), "Retrying notification");

            match self.send_via(&**retry, &mail).await {
                Ok(id) => {
                    let attempt = DeliveryAttempt::succeeded(
                        DeliveryChannel::Email,
                        started_at,
                        id.to_string(),
                        MAX_NOTIFICATION_SENDS,
                    );
                    log_attempt(&attempt);
                    return attempt;
                },
                Err(e) => {
                    warn!(transport = %retry.name(), error = %e, "Notification retry failed");
                    failures.push(format!("{}: {e}", retry.name()));
                },
            }
        }

        self.alert_operator(submission, request_id, &failures).await;

        let tries = if failures.len() > 1 {
            MAX_NOTIFICATION_SENDS
        } else {
            1
        };
        let attempt =
            DeliveryAttempt::failed(DeliveryChannel::Email, started_at, failures.join("; "), tries);
        log_attempt(&attempt);
        attempt
    }

    /// One bounded send; elapsing the timeout counts as transient
    async fn send_via(
        &self,
        transport: &dyn MailPort,
        mail: &OutgoingMail,
    ) -> Result<MessageId, MailError> {
        timeout(self.send_timeout, transport.send(mail))
            .await
            .unwrap_or_else(|_| {
                Err(MailError::Transient(format!(
                    "send timed out after {}ms",
                    self.send_timeout.as_millis()
                )))
            })
    }

    /// Best-effort operator alert; failures are logged and swallowed
    async fn alert_operator(
        &self,
        submission: &Submission,
        request_id: RequestId,
        failures: &[String],
    ) {
        let Some(alert) = self.composer.compose_alert(submission, request_id, failures) else {
            debug!("No operator address configured, skipping failure alert");
            return;
        };

        let transport = self.alternate.as_ref().unwrap_or(&self.primary);
        match self.send_via(&**transport, &alert).await {
            Ok(id) => info!(message_id = %id, "Operator failure alert sent"),
            Err(e) => error!(error = %e, "Operator failure alert could not be sent"),
        }
    }
}

fn log_attempt(attempt: &DeliveryAttempt) {
    match &attempt.outcome {
        domain::AttemptOutcome::Success { reference } => info!(
            channel = %attempt.channel,
            tries = attempt.tries,
            reference = %reference,
            "Delivery attempt succeeded"
        ),
        domain::AttemptOutcome::Failure { reason } => warn!(
            channel = %attempt.channel,
            tries = attempt.tries,
            reason = %reason,
            "Delivery attempt failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use domain::{DegradedReason, RawSubmission, SubmissionKind, validate};
    use mockall::predicate::function;

    use super::*;
    use crate::ports::{MockMailPort, MockSubmissionStorePort, RecordId, StorageError};
    use crate::services::message_composer::NotificationSettings;

    fn contact() -> Submission {
        let raw = RawSubmission::new()
            .with("name", "A")
            .with("email", "a@b.com")
            .with("subject", "S")
            .with("message", "M");
        validate(SubmissionKind::ContactMessage, &raw).unwrap()
    }

    fn composer() -> MessageComposer {
        MessageComposer::new(NotificationSettings::new("noreply@x.com", "owner@x.com"))
    }

    fn composer_with_operator() -> MessageComposer {
        MessageComposer::new(
            NotificationSettings::new("noreply@x.com", "owner@x.com").with_operator("ops@x.com"),
        )
    }

    fn healthy_store() -> MockSubmissionStorePort {
        let mut store = MockSubmissionStorePort::new();
        store.expect_insert().times(1).returning(|_| Ok(RecordId(1)));
        store
    }

    fn failing_store() -> MockSubmissionStorePort {
        let mut store = MockSubmissionStorePort::new();
        store
            .expect_insert()
            .times(1)
            .returning(|_| Err(StorageError::Unavailable("database is locked".to_string())));
        store
    }

    fn transport(name: &'static str) -> MockMailPort {
        let mut mail = MockMailPort::new();
        mail.expect_name().returning(move || name.to_string());
        mail
    }

    fn is_alert(mail: &OutgoingMail) -> bool {
        mail.subject.starts_with("[Delivery Failure]")
    }

    #[tokio::test]
    async fn both_channels_ok_is_delivered() {
        let mut primary = transport("primary");
        primary
            .expect_send()
            .times(1)
            .returning(|_| Ok(MessageId::new("m-1")));

        let orchestrator =
            DeliveryOrchestrator::new(Arc::new(healthy_store()), Arc::new(primary), composer());
        let report = orchestrator.process(contact(), RequestId::new()).await;

        assert_eq!(report.outcome, DeliveryOutcome::Delivered);
        assert_eq!(report.attempts.len(), 2);
        assert_eq!(report.attempts[0].channel, DeliveryChannel::Storage);
        assert_eq!(report.attempts[1].channel, DeliveryChannel::Email);
        assert_eq!(report.attempts[1].tries, 1);
    }

    #[tokio::test]
    async fn stored_row_carries_submission_fields() {
        let request_id = RequestId::new();
        let expected_id = request_id.to_string();

        let mut store = MockSubmissionStorePort::new();
        store
            .expect_insert()
            .with(function(move |r: &StorageRecord| {
                r.table == SUBMISSIONS_TABLE
                    && r.get("request_id") == Some(expected_id.as_str())
                    && r.get("kind") == Some("contact_message")
                    && r.get("subject") == Some("S")
                    && r.get("message") == Some("M")
                    && r.get("status") == Some("unread")
                    && r.get("phone").is_none()
            }))
            .times(1)
            .returning(|_| Ok(RecordId(9)));

        let mut primary = transport("primary");
        primary.expect_send().returning(|_| Ok(MessageId::new("m-1")));

        let orchestrator =
            DeliveryOrchestrator::new(Arc::new(store), Arc::new(primary), composer());
        let report = orchestrator.process(contact(), request_id).await;
        let storage = report.attempt(DeliveryChannel::Storage).unwrap();
        assert_eq!(
            storage.outcome,
            domain::AttemptOutcome::Success { reference: "9".to_string() }
        );
    }

    #[tokio::test]
    async fn transient_failure_retries_on_alternate() {
        let mut primary = transport("primary");
        primary
            .expect_send()
            .times(1)
            .returning(|_| Err(MailError::Transient("connection reset".to_string())));
        let mut alternate = transport("alternate");
        alternate
            .expect_send()
            .times(1)
            .returning(|_| Ok(MessageId::new("m-2")));

        let orchestrator =
            DeliveryOrchestrator::new(Arc::new(healthy_store()), Arc::new(primary), composer())
                .with_alternate(Arc::new(alternate));
        let report = orchestrator.process(contact(), RequestId::new()).await;

        assert_eq!(report.outcome, DeliveryOutcome::Delivered);
        assert_eq!(report.attempt(DeliveryChannel::Email).unwrap().tries, 2);
    }

    #[tokio::test]
    async fn transient_failure_without_alternate_retries_primary_once() {
        let mut primary = transport("primary");
        primary
            .expect_send()
            .times(2)
            .returning(|_| Err(MailError::Transient("421 try later".to_string())));

        let orchestrator =
            DeliveryOrchestrator::new(Arc::new(healthy_store()), Arc::new(primary), composer());
        let outcome = orchestrator.deliver(contact()).await;

        assert_eq!(outcome, DeliveryOutcome::Degraded(DegradedReason::EmailFailed));
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let mut primary = transport("primary");
        primary
            .expect_send()
            .times(1)
            .returning(|_| Err(MailError::Permanent("535 authentication failed".to_string())));
        let mut alternate = transport("alternate");
        alternate.expect_send().never();

        let orchestrator =
            DeliveryOrchestrator::new(Arc::new(healthy_store()), Arc::new(primary), composer())
                .with_alternate(Arc::new(alternate));
        let report = orchestrator.process(contact(), RequestId::new()).await;

        assert_eq!(report.outcome, DeliveryOutcome::Degraded(DegradedReason::EmailFailed));
        assert_eq!(report.attempt(DeliveryChannel::Email).unwrap().tries, 1);
    }

    #[tokio::test]
    async fn storage_failure_with_mail_ok_is_storage_failed() {
        let mut primary = transport("primary");
        primary
            .expect_send()
            .times(1)
            .returning(|_| Ok(MessageId::new("m-1")));

        let orchestrator =
            DeliveryOrchestrator::new(Arc::new(failing_store()), Arc::new(primary), composer());
        let outcome = orchestrator.deliver(contact()).await;

        assert_eq!(outcome, DeliveryOutcome::Degraded(DegradedReason::StorageFailed));
        assert!(outcome.is_accepted());
    }

    #[tokio::test]
    async fn both_channels_failing_is_both_failed() {
        let mut primary = transport("primary");
        primary
            .expect_send()
            .times(1)
            .returning(|_| Err(MailError::Permanent("550 mailbox unavailable".to_string())));

        let orchestrator =
            DeliveryOrchestrator::new(Arc::new(failing_store()), Arc::new(primary), composer());
        let outcome = orchestrator.deliver(contact()).await;

        assert_eq!(outcome, DeliveryOutcome::Degraded(DegradedReason::BothFailed));
    }

    #[tokio::test]
    async fn operator_alert_sent_once_after_all_sends_fail() {
        let mut primary = transport("primary");
        primary
            .expect_send()
            .with(function(|m: &OutgoingMail| !is_alert(m)))
            .times(1)
            .returning(|_| Err(MailError::Transient("timeout".to_string())));
        let mut alternate = transport("alternate");
        alternate
            .expect_send()
            .with(function(|m: &OutgoingMail| !is_alert(m)))
            .times(1)
            .returning(|_| Err(MailError::Transient("timeout".to_string())));
        alternate
            .expect_send()
            .with(function(|m: &OutgoingMail| is_alert(m) && m.to == "ops@x.com"))
            .times(1)
            .returning(|_| Ok(MessageId::new("alert-1")));

        let orchestrator = DeliveryOrchestrator::new(
            Arc::new(healthy_store()),
            Arc::new(primary),
            composer_with_operator(),
        )
        .with_alternate(Arc::new(alternate));
        let report = orchestrator.process(contact(), RequestId::new()).await;

        assert_eq!(report.outcome, DeliveryOutcome::Degraded(DegradedReason::EmailFailed));
        let email = report.attempt(DeliveryChannel::Email).unwrap();
        assert_eq!(email.tries, 2);
    }

    #[tokio::test]
    async fn operator_alert_not_sent_when_notification_succeeds() {
        let mut primary = transport("primary");
        primary
            .expect_send()
            .with(function(|m: &OutgoingMail| !is_alert(m)))
            .times(1)
            .returning(|_| Ok(MessageId::new("m-1")));

        let orchestrator = DeliveryOrchestrator::new(
            Arc::new(failing_store()),
            Arc::new(primary),
            composer_with_operator(),
        );
        let outcome = orchestrator.deliver(contact()).await;

        assert_eq!(outcome, DeliveryOutcome::Degraded(DegradedReason::StorageFailed));
    }

    #[tokio::test]
    async fn failing_operator_alert_does_not_change_outcome() {
        let mut primary = transport("primary");
        primary
            .expect_send()
            .times(2)
            .returning(|_| Err(MailError::Permanent("550 rejected".to_string())));

        let orchestrator = DeliveryOrchestrator::new(
            Arc::new(healthy_store()),
            Arc::new(primary),
            composer_with_operator(),
        );
        let outcome = orchestrator.deliver(contact()).await;

        assert_eq!(outcome, DeliveryOutcome::Degraded(DegradedReason::EmailFailed));
    }

    /// Transport that never answers within the test timeout
    struct SlowTransport {
        sends: AtomicUsize,
    }

    #[async_trait]
    impl MailPort for SlowTransport {
        async fn send(&self, _mail: &OutgoingMail) -> Result<MessageId, MailError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(MessageId::new("too-late"))
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> String {
            "slow".to_string()
        }
    }

    #[tokio::test]
    async fn send_timeout_counts_as_transient() {
        let slow = Arc::new(SlowTransport {
            sends: AtomicUsize::new(0),
        });
        let mut alternate = transport("alternate");
        alternate
            .expect_send()
            .times(1)
            .returning(|_| Ok(MessageId::new("m-2")));

        let orchestrator =
            DeliveryOrchestrator::new(Arc::new(healthy_store()), slow.clone(), composer())
                .with_alternate(Arc::new(alternate))
                .with_send_timeout(Duration::from_millis(50));
        let outcome = orchestrator.deliver(contact()).await;

        assert_eq!(outcome, DeliveryOutcome::Delivered);
        assert_eq!(slow.sends.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn consultation_record_uses_project_subject() {
        let raw = RawSubmission::new()
            .with("name", "Budi")
            .with("email", "budi@example.com")
            .with("projectType", "Web App")
            .with("budget", "50-100 juta")
            .with("projectDetails", "Details");
        let submission = validate(SubmissionKind::ProjectConsultation, &raw).unwrap();
        let record = submission_record(&submission, RequestId::new(), Utc::now());

        assert_eq!(record.get("subject"), Some("Project consultation: Web App"));
        assert_eq!(record.get("message"), Some("Details"));
        assert_eq!(record.get("budget"), Some("50-100 juta"));
        assert_eq!(record.get("kind"), Some("project_consultation"));
        assert!(record.get("company").is_none());
    }

    #[test]
    fn debug_hides_ports() {
        let orchestrator = DeliveryOrchestrator::new(
            Arc::new(MockSubmissionStorePort::new()),
            Arc::new(MockMailPort::new()),
            composer(),
        );
        let debug = format!("{orchestrator:?}");
        assert!(debug.contains("DeliveryOrchestrator"));
        assert!(debug.contains("has_alternate: false"));
    }
}
