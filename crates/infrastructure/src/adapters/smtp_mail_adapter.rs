//! SMTP mail adapter - Implements MailPort using lettre's async transport

use std::time::Duration;

use application::ports::{MailError, MailPort, MessageId, OutgoingMail};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::{self, authentication::Credentials},
};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::{SmtpTransportConfig, TransportSecurity};

/// One configured SMTP transport
pub struct SmtpMailAdapter {
    name: String,
    endpoint: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpMailAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailAdapter")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl SmtpMailAdapter {
    /// Build the transport for a profile
    ///
    /// `timeout` bounds each SMTP command. No connection is opened here.
    pub fn new(config: &SmtpTransportConfig, timeout: Duration) -> Result<Self, MailError> {
        let mut builder = match config.security {
            TransportSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            },
            TransportSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Permanent(format!("Invalid TLS setup: {e}")))?,
            TransportSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| MailError::Permanent(format!("Invalid STARTTLS setup: {e}")))?
            },
        };

        builder = builder.port(config.port).timeout(Some(timeout));

        if config.has_credentials() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password_str().to_string(),
            ));
        }

        Ok(Self {
            name: config.name.clone(),
            endpoint: format!("{}:{} ({})", config.host, config.port, config.security),
            transport: builder.build(),
        })
    }

    fn mailbox(address: &str) -> Result<Mailbox, MailError> {
        address
            .parse()
            .map_err(|_| MailError::Permanent(format!("Invalid address: {address}")))
    }

    /// `<uuid@domain>` using the sender's domain
    fn message_id(from: &Mailbox) -> String {
        format!("<{}@{}>", Uuid::new_v4(), from.email.domain())
    }

    fn build_message(mail: &OutgoingMail) -> Result<(Message, String), MailError> {
        let from = Self::mailbox(&mail.from)?;
        let message_id = Self::message_id(&from);

        let mut builder = Message::builder()
            .message_id(Some(message_id.clone()))
            .from(from)
            .to(Self::mailbox(&mail.to)?);

        for cc in &mail.cc {
            builder = builder.cc(Self::mailbox(cc)?);
        }

        if let Some(reply_to) = &mail.reply_to {
            builder = builder.reply_to(Self::mailbox(reply_to)?);
        }

        let message = builder
            .subject(&mail.subject)
            .multipart(MultiPart::alternative_plain_html(
                mail.text.clone(),
                mail.html.clone(),
            ))
            .map_err(|e| MailError::Permanent(format!("Failed to build message: {e}")))?;

        Ok((message, message_id))
    }

    /// Classify a transport error for retry decisions
    fn map_error(e: &smtp::Error) -> MailError {
        if e.is_permanent() {
            // 5xx, including rejected credentials
            MailError::Permanent(e.to_string())
        } else if e.is_client() {
            MailError::Permanent(format!("SMTP client error: {e}"))
        } else {
            // 4xx, timeouts, network and TLS failures
            MailError::Transient(e.to_string())
        }
    }
}

#[async_trait]
impl MailPort for SmtpMailAdapter {
    #[instrument(skip(self, mail), fields(transport = %self.name, subject = %mail.subject))]
    async fn send(&self, mail: &OutgoingMail) -> Result<MessageId, MailError> {
        let (message, message_id) = Self::build_message(mail)?;

        match self.transport.send(message).await {
            Ok(response) => {
                debug!(code = %response.code(), "Message accepted");
                Ok(MessageId::new(message_id))
            },
            Err(e) => {
                let error = Self::map_error(&e);
                warn!(error = %error, "SMTP send failed");
                Err(error)
            },
        }
    }

    #[instrument(skip(self), fields(transport = %self.name))]
    async fn is_available(&self) -> bool {
        match self.transport.test_connection().await {
            Ok(ok) => ok,
            Err(e) => {
                debug!(error = %e, "SMTP connection test failed");
                false
            },
        }
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
