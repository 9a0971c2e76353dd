//! Submission service
//!
//! Entry point for the form endpoints: validates the payload and hands valid
//! submissions to the [`DeliveryOrchestrator`].

use std::{fmt, sync::Arc};

use domain::{DeliveryReport, RawSubmission, RequestId, SubmissionKind, validate};
use tracing::{Instrument, Span, info, instrument};

use crate::{error::ApplicationError, services::delivery_orchestrator::DeliveryOrchestrator};

/// Validates and delivers website form submissions
#[derive(Clone)]
pub struct SubmissionService {
    orchestrator: Arc<DeliveryOrchestrator>,
}

impl fmt::Debug for SubmissionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionService")
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

impl SubmissionService {
    /// Create a new submission service
    pub const fn new(orchestrator: Arc<DeliveryOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Shared orchestrator
    pub fn orchestrator(&self) -> Arc<DeliveryOrchestrator> {
        Arc::clone(&self.orchestrator)
    }

    /// Validate and deliver one submission
    ///
    /// Invalid input yields a `Rejected` report. Valid input is processed on a
    /// spawned task, so dropping the returned future (client disconnect) does
    /// not cancel delivery. The only error is the task dying.
    #[instrument(
        skip(self, raw, kind, request_id),
        fields(kind = %kind, request_id = %request_id)
    )]
    pub async fn submit(
        &self,
        kind: SubmissionKind,
        raw: RawSubmission,
        request_id: RequestId,
    ) -> Result<DeliveryReport, ApplicationError> {
        let submission = match validate(kind, &raw) {
            Ok(submission) => submission,
            Err(err) => {
                info!(field = %err.field, reason = %err.reason, "Submission rejected");
                return Ok(DeliveryReport::rejected(request_id, kind, err));
            },
        };

        let orchestrator = Arc::clone(&self.orchestrator);
        tokio::spawn(
            async move { orchestrator.process(submission, request_id).await }
                .instrument(Span::current()),
        )
        .await
        .map_err(|e| ApplicationError::TaskAborted(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use domain::{DeliveryOutcome, ValidationError};

    use super::*;
    use crate::ports::{MessageId, MockMailPort, MockSubmissionStorePort, RecordId};
    use crate::services::message_composer::{MessageComposer, NotificationSettings};

    fn service(store: MockSubmissionStorePort, mail: MockMailPort) -> SubmissionService {
        let composer =
            MessageComposer::new(NotificationSettings::new("noreply@x.com", "owner@x.com"));
        let orchestrator = DeliveryOrchestrator::new(Arc::new(store), Arc::new(mail), composer);
        SubmissionService::new(Arc::new(orchestrator))
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_without_side_effects() {
        let mut store = MockSubmissionStorePort::new();
        store.expect_insert().never();
        let mut mail = MockMailPort::new();
        mail.expect_send().never();

        let raw = RawSubmission::new().with("name", "A");
        let request_id = RequestId::new();
        let report = service(store, mail)
            .submit(SubmissionKind::ContactMessage, raw, request_id)
            .await
            .unwrap();

        assert_eq!(report.request_id, request_id);
        assert_eq!(
            report.outcome,
            DeliveryOutcome::Rejected(ValidationError::missing("email"))
        );
        assert!(report.attempts.is_empty());
    }

    #[tokio::test]
    async fn valid_input_is_delivered() {
        let mut store = MockSubmissionStorePort::new();
        store.expect_insert().times(1).returning(|_| Ok(RecordId(1)));
        let mut mail = MockMailPort::new();
        mail.expect_name().returning(|| "primary".to_string());
        mail.expect_send()
            .times(1)
            .returning(|_| Ok(MessageId::new("m-1")));

        let raw = RawSubmission::new()
            .with("name", "Budi")
            .with("email", "budi@example.com")
            .with("projectDetails", "Landing page");
        let report = service(store, mail)
            .submit(SubmissionKind::ProjectConsultation, raw, RequestId::new())
            .await
            .unwrap();

        assert_eq!(report.kind, SubmissionKind::ProjectConsultation);
        assert_eq!(report.outcome, DeliveryOutcome::Delivered);
    }

    #[test]
    fn debug_output() {
        let svc = service(MockSubmissionStorePort::new(), MockMailPort::new());
        assert!(format!("{svc:?}").contains("SubmissionService"));
    }
}
