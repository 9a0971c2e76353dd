//! Mail port for application layer
//!
//! Defines the outbound mail interface. Implemented by transport adapters in
//! the infrastructure layer; one instance per configured transport.

use std::fmt;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mail port errors, classified for retry decisions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailError {
    /// Network failure, timeout or SMTP 4xx; may succeed on another try
    #[error("Transient mail failure: {0}")]
    Transient(String),

    /// Authentication, SMTP 5xx, invalid address or configuration
    #[error("Permanent mail failure: {0}")]
    Permanent(String),
}

impl MailError {
    /// Whether a retry could succeed
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Identifier assigned to a sent message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Wrap a transport message id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully composed outbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMail {
    /// Sender mailbox, e.g. `Website <noreply@example.com>`
    pub from: String,
    /// Primary recipient
    pub to: String,
    /// CC recipients
    pub cc: Vec<String>,
    /// Address replies should go to
    pub reply_to: Option<String>,
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html: String,
    /// Plain-text body
    pub text: String,
}

impl OutgoingMail {
    /// Create a message with both bodies
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        html: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            cc: Vec::new(),
            reply_to: None,
            subject: subject.into(),
            html: html.into(),
            text: text.into(),
        }
    }

    /// Add CC recipients
    #[must_use]
    pub fn with_cc(mut self, cc: impl IntoIterator<Item = String>) -> Self {
        self.cc.extend(cc);
        self
    }

    /// Set the reply-to address
    #[must_use]
    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }
}

/// Mail port trait
///
/// A single outbound transport. The orchestrator holds a primary and an
/// optional alternate instance.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MailPort: Send + Sync {
    /// Send a message
    ///
    /// # Returns
    /// Message ID of the sent email
    async fn send(&self, mail: &OutgoingMail) -> Result<MessageId, MailError>;

    /// Check if the transport is reachable
    async fn is_available(&self) -> bool;

    /// Transport name used in logs
    fn name(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn MailPort) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn MailPort>();
    }

    #[test]
    fn classification() {
        assert!(MailError::Transient("421".to_string()).is_transient());
        assert!(!MailError::Permanent("550".to_string()).is_transient());
    }

    #[test]
    fn outgoing_mail_builder() {
        let mail = OutgoingMail::new("from@x.com", "to@x.com", "Subj", "<p>hi</p>", "hi")
            .with_cc(vec!["cc@x.com".to_string()])
            .with_reply_to("visitor@y.com");
        assert_eq!(mail.cc, vec!["cc@x.com"]);
        assert_eq!(mail.reply_to.as_deref(), Some("visitor@y.com"));
        assert_eq!(mail.subject, "Subj");
    }

    #[test]
    fn message_id_display() {
        let id = MessageId::new("<abc@host>");
        assert_eq!(id.to_string(), "<abc@host>");
        assert_eq!(id.as_str(), "<abc@host>");
    }

    #[tokio::test]
    async fn mock_mail_port_sends() {
        let mut mock = MockMailPort::new();
        mock.expect_send()
            .returning(|_| Ok(MessageId::new("m-1")));
        let mail = OutgoingMail::new("a@x.com", "b@x.com", "s", "h", "t");
        assert_eq!(mock.send(&mail).await.unwrap().as_str(), "m-1");
    }
}
