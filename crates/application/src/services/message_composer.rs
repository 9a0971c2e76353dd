//! Notification message composer
//!
//! Builds the HTML and plain-text notification for a submission, and the
//! operator alert sent when no notification could be delivered. All
//! submitter input is HTML-escaped before it reaches the HTML body.

use chrono::{DateTime, Utc};
use domain::{RequestId, Submission, SubmissionDetails, SubmissionKind};
use serde::{Deserialize, Serialize};

use crate::ports::OutgoingMail;

/// Addresses used for notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Sender address
    pub from_address: String,
    /// Sender display name
    pub from_name: String,
    /// Site owner mailbox that receives submissions
    pub recipient: String,
    /// Additional CC recipients
    pub cc: Vec<String>,
    /// Operator mailbox for delivery failure alerts
    pub operator_address: Option<String>,
}

impl NotificationSettings {
    /// Create settings with no CC and no operator
    pub fn new(from_address: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            from_address: from_address.into(),
            from_name: String::new(),
            recipient: recipient.into(),
            cc: Vec::new(),
            operator_address: None,
        }
    }

    /// Set the sender display name
    #[must_use]
    pub fn with_from_name(mut self, name: impl Into<String>) -> Self {
        self.from_name = name.into();
        self
    }

    /// Set CC recipients
    #[must_use]
    pub fn with_cc(mut self, cc: Vec<String>) -> Self {
        self.cc = cc;
        self
    }

    /// Set the operator alert address
    #[must_use]
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator_address = Some(operator.into());
        self
    }

    /// Sender mailbox in `Name <address>` form
    pub fn sender(&self) -> String {
        if self.from_name.trim().is_empty() {
            self.from_address.clone()
        } else {
            format!("{} <{}>", self.from_name.trim(), self.from_address)
        }
    }
}

/// Escape text for inclusion in HTML
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Escape text and turn line breaks into `<br>`
fn escape_multiline(input: &str) -> String {
    escape_html(&input.replace("\r\n", "\n")).replace('\n', "<br>")
}

/// Collapse a value onto one line for use in a header
fn single_line(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds notification and alert messages
#[derive(Debug, Clone)]
pub struct MessageComposer {
    settings: NotificationSettings,
}

impl MessageComposer {
    /// Create a composer for the given addresses
    pub const fn new(settings: NotificationSettings) -> Self {
        Self { settings }
    }

    /// Configured addresses
    pub const fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    /// Subject line for a submission notification
    pub fn subject(submission: &Submission) -> String {
        let subject = match submission.details() {
            SubmissionDetails::ContactMessage { subject, .. } => {
                format!("[Website Message] {subject}")
            },
            SubmissionDetails::ProjectConsultation(c) => match &c.subject {
                Some(subject) => subject.clone(),
                None => format!("[Project Consultation] Request from {}", submission.name()),
            },
        };
        single_line(&subject)
    }

    /// Notification to the site owner
    pub fn compose(
        &self,
        submission: &Submission,
        request_id: RequestId,
        received_at: DateTime<Utc>,
    ) -> OutgoingMail {
        let heading = match submission.kind() {
            SubmissionKind::ContactMessage => "New message from the website",
            SubmissionKind::ProjectConsultation => "New project consultation request",
        };
        let body_label = body_label(submission.kind());
        let rows = detail_rows(submission);
        let footer = format!(
            "Received {} | Request {request_id}",
            received_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        let html = format!(
            "<div style=\"font-family:Arial,sans-serif;max-width:600px\">\
             <h2>{heading}</h2>{table}<h3>{body_label}</h3><p>{body}</p>\
             <hr><p style=\"color:#888;font-size:12px\">{footer}</p></div>",
            table = html_table(&rows),
            body = escape_multiline(submission.body()),
        );

        let text = format!(
            "{heading}\n\n{lines}\n{body_label}:\n{body}\n\n--\n{footer}\n",
            lines = text_lines(&rows),
            body = submission.body(),
        );

        OutgoingMail::new(
            self.settings.sender(),
            &self.settings.recipient,
            Self::subject(submission),
            html,
            text,
        )
        .with_cc(self.settings.cc.iter().cloned())
        .with_reply_to(submission.email().as_str())
    }

    /// Alert to the operator after every notification send failed
    ///
    /// Returns `None` when no operator address is configured.
    pub fn compose_alert(
        &self,
        submission: &Submission,
        request_id: RequestId,
        failures: &[String],
    ) -> Option<OutgoingMail> {
        let operator = self.settings.operator_address.as_deref()?;
        let subject = single_line(&format!(
            "[Delivery Failure] {} from {}",
            submission.kind().label(),
            submission.name()
        ));

        let mut rows = detail_rows(submission);
        rows.push((body_label(submission.kind()), submission.body().to_string()));

        let reasons_html: String = failures
            .iter()
            .map(|r| format!("<li>{}</li>", escape_html(r)))
            .collect();
        let reasons_text: String = failures.iter().map(|r| format!("- {r}\n")).collect();

        let html = format!(
            "<div style=\"font-family:Arial,sans-serif;max-width:600px\">\
             <h2>Submission notification could not be delivered</h2>\
             <p>Request <code>{request_id}</code> was received but the notification \
             to {recipient} failed. Please follow up manually.</p>\
             <ul>{reasons_html}</ul>{table}</div>",
            recipient = escape_html(&self.settings.recipient),
            table = html_table_multiline(&rows),
        );

        let text = format!(
            "Submission notification could not be delivered.\n\n\
             Request {request_id} was received but the notification to {recipient} failed. \
             Please follow up manually.\n\nFailures:\n{reasons_text}\n{lines}",
            recipient = self.settings.recipient,
            lines = text_lines(&rows),
        );

        Some(
            OutgoingMail::new(self.settings.sender(), operator, subject, html, text)
                .with_reply_to(submission.email().as_str()),
        )
    }
}

const fn body_label(kind: SubmissionKind) -> &'static str {
    match kind {
        SubmissionKind::ContactMessage => "Message",
        SubmissionKind::ProjectConsultation => "Project details",
    }
}

/// Labelled fields shown in the detail table, absent optionals skipped
fn detail_rows(submission: &Submission) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Name", submission.name().to_string()),
        ("Email", submission.email().to_string()),
    ];
    if let Some(phone) = submission.phone() {
        rows.push(("Phone", phone.to_string()));
    }

    match submission.details() {
        SubmissionDetails::ContactMessage { subject, .. } => {
            rows.push(("Subject", subject.clone()));
        },
        SubmissionDetails::ProjectConsultation(c) => {
            let optional = [
                ("Company", &c.company),
                ("Project type", &c.project_type),
                ("Budget", &c.budget),
                ("Timeline", &c.timeline),
                ("Subject", &c.subject),
            ];
            rows.extend(
                optional
                    .into_iter()
                    .filter_map(|(label, value)| value.as_ref().map(|v| (label, v.clone()))),
            );
        },
    }
    rows
}

fn html_row(label: &str, value: &str) -> String {
    format!(
        "<tr><td style=\"padding:4px 12px 4px 0\"><strong>{label}</strong></td>\
         <td style=\"padding:4px 0\">{value}</td></tr>"
    )
}

fn html_table(rows: &[(&str, String)]) -> String {
    let body: String = rows
        .iter()
        .map(|(label, value)| html_row(label, &escape_html(value)))
        .collect();
    format!("<table>{body}</table>")
}

fn html_table_multiline(rows: &[(&str, String)]) -> String {
    let body: String = rows
        .iter()
        .map(|(label, value)| html_row(label, &escape_multiline(value)))
        .collect();
    format!("<table>{body}</table>")
}

fn text_lines(rows: &[(&str, String)]) -> String {
    rows.iter()
        .map(|(label, value)| format!("{label}: {value}\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use domain::{RawSubmission, validate};

    use super::*;

    fn settings() -> NotificationSettings {
        NotificationSettings::new("noreply@example.com", "owner@example.com")
            .with_from_name("Company Website")
            .with_cc(vec!["sales@example.com".to_string()])
    }

    fn contact(message: &str) -> Submission {
        let raw = RawSubmission::new()
            .with("name", "A")
            .with("email", "a@b.com")
            .with("subject", "S")
            .with("message", message);
        validate(SubmissionKind::ContactMessage, &raw).unwrap()
    }

    fn consultation(subject: Option<&str>) -> Submission {
        let mut raw = RawSubmission::new()
            .with("name", "Budi")
            .with("email", "budi@example.com")
            .with("company", "PT Maju")
            .with("projectType", "Web App")
            .with("projectDetails", "Line one\nLine two");
        if let Some(subject) = subject {
            raw.insert("subject", subject);
        }
        validate(SubmissionKind::ProjectConsultation, &raw).unwrap()
    }

    #[test]
    fn escape_html_covers_special_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn contact_subject_is_prefixed() {
        assert_eq!(MessageComposer::subject(&contact("M")), "[Website Message] S");
    }

    #[test]
    fn consultation_subject_defaults_to_name() {
        assert_eq!(
            MessageComposer::subject(&consultation(None)),
            "[Project Consultation] Request from Budi"
        );
        assert_eq!(
            MessageComposer::subject(&consultation(Some("Urgent quote"))),
            "Urgent quote"
        );
    }

    #[test]
    fn compose_addresses_and_reply_to() {
        let composer = MessageComposer::new(settings());
        let mail = composer.compose(&contact("M"), RequestId::new(), Utc::now());
        assert_eq!(mail.from, "Company Website <noreply@example.com>");
        assert_eq!(mail.to, "owner@example.com");
        assert_eq!(mail.cc, vec!["sales@example.com"]);
        assert_eq!(mail.reply_to.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn compose_escapes_input_and_keeps_line_breaks() {
        let composer = MessageComposer::new(settings());
        let mail = composer.compose(
            &contact("<script>alert(1)</script>\nsecond line"),
            RequestId::new(),
            Utc::now(),
        );
        assert!(!mail.html.contains("<script>"));
        assert!(mail.html.contains("&lt;script&gt;alert(1)&lt;/script&gt;<br>second line"));
        assert!(mail.text.contains("<script>alert(1)</script>\nsecond line"));
    }

    #[test]
    fn compose_includes_consultation_fields() {
        let composer = MessageComposer::new(settings());
        let request_id = RequestId::new();
        let mail = composer.compose(&consultation(None), request_id, Utc::now());
        assert!(mail.html.contains("PT Maju"));
        assert!(mail.html.contains("Web App"));
        assert!(mail.html.contains("Line one<br>Line two"));
        assert!(mail.text.contains("Project type: Web App"));
        assert!(mail.text.contains(&request_id.to_string()));
        assert!(!mail.text.contains("Budget"));
    }

    #[test]
    fn alert_requires_operator() {
        let composer = MessageComposer::new(settings());
        assert!(
            composer
                .compose_alert(&contact("M"), RequestId::new(), &["timeout".to_string()])
                .is_none()
        );
    }

    #[test]
    fn alert_carries_request_id_reasons_and_submission() {
        let composer = MessageComposer::new(settings().with_operator("ops@example.com"));
        let request_id = RequestId::new();
        let mail = composer
            .compose_alert(
                &consultation(None),
                request_id,
                &["primary: timeout".to_string(), "alternate: 550".to_string()],
            )
            .unwrap();
        assert_eq!(mail.to, "ops@example.com");
        assert_eq!(mail.subject, "[Delivery Failure] Project consultation from Budi");
        assert!(mail.cc.is_empty());
        assert!(mail.text.contains(&request_id.to_string()));
        assert!(mail.text.contains("- primary: timeout"));
        assert!(mail.text.contains("- alternate: 550"));
        assert!(mail.text.contains("Project details: Line one\nLine two"));
        assert!(mail.html.contains("<li>alternate: 550</li>"));
    }

    #[test]
    fn sender_without_display_name() {
        let s = NotificationSettings::new("noreply@example.com", "owner@example.com");
        assert_eq!(s.sender(), "noreply@example.com");
    }

    #[test]
    fn header_values_are_single_line() {
        let raw = RawSubmission::new()
            .with("name", "A")
            .with("email", "a@b.com")
            .with("subject", "Hello\r\nBcc: x@evil.com")
            .with("message", "M");
        let s = validate(SubmissionKind::ContactMessage, &raw).unwrap();
        assert_eq!(
            MessageComposer::subject(&s),
            "[Website Message] Hello Bcc: x@evil.com"
        );
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn escaped_text_has_no_markup(input in ".{0,200}") {
            let escaped = escape_html(&input);
            prop_assert!(!escaped.contains('<'));
            prop_assert!(!escaped.contains('>'));
            prop_assert!(!escaped.contains('"'));
        }

        #[test]
        fn multiline_escape_has_no_raw_newlines(input in "[a-z<>&\n\r ]{0,100}") {
            let escaped = escape_multiline(&input);
            prop_assert!(!escaped.contains('\n'));
            let newlines = input.replace("\r\n", "\n").matches('\n').count();
            prop_assert_eq!(escaped.matches("<br>").count(), newlines);
        }
    }
}
