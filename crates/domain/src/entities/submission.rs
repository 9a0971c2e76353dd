//! Validated website form submission
//!
//! A `Submission` only comes out of [`crate::intake::validate`] and is never
//! mutated afterwards. It carries no id or timestamp; those are stamped when
//! the submission is delivered.

use serde::Serialize;

use crate::value_objects::{EmailAddress, SubmissionKind};

/// Fields that only exist on a project consultation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsultationDetails {
    /// Company the submitter represents
    pub company: Option<String>,
    /// Kind of project (e.g. "Web App")
    pub project_type: Option<String>,
    /// Free-text project description
    pub project_details: String,
    /// Budget range as entered
    pub budget: Option<String>,
    /// Desired timeline as entered
    pub timeline: Option<String>,
    /// Optional subject override for the notification email
    pub subject: Option<String>,
}

/// Kind-specific part of a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionDetails {
    /// Contact form: subject and message body
    ContactMessage {
        /// Subject line entered by the visitor
        subject: String,
        /// Message body
        message: String,
    },
    /// Consultation form
    ProjectConsultation(ConsultationDetails),
}

/// A validated, immutable submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    name: String,
    email: EmailAddress,
    phone: Option<String>,
    details: SubmissionDetails,
}

impl Submission {
    pub(crate) const fn new(
        name: String,
        email: EmailAddress,
        phone: Option<String>,
        details: SubmissionDetails,
    ) -> Self {
        Self {
            name,
            email,
            phone,
            details,
        }
    }

    /// Which form produced this submission
    pub const fn kind(&self) -> SubmissionKind {
        match self.details {
            SubmissionDetails::ContactMessage { .. } => SubmissionKind::ContactMessage,
            SubmissionDetails::ProjectConsultation(_) => SubmissionKind::ProjectConsultation,
        }
    }

    /// Submitter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Submitter address
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Submitter phone number, if given
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Kind-specific fields
    pub const fn details(&self) -> &SubmissionDetails {
        &self.details
    }

    /// Subject as submitted (consultations may omit it)
    pub fn subject(&self) -> Option<&str> {
        match &self.details {
            SubmissionDetails::ContactMessage { subject, .. } => Some(subject),
            SubmissionDetails::ProjectConsultation(c) => c.subject.as_deref(),
        }
    }

    /// Main free-text body: the message, or the project details
    pub fn body(&self) -> &str {
        match &self.details {
            SubmissionDetails::ContactMessage { message, .. } => message,
            SubmissionDetails::ProjectConsultation(c) => &c.project_details,
        }
    }

    /// Consultation fields, if this is a consultation request
    pub const fn consultation(&self) -> Option<&ConsultationDetails> {
        match &self.details {
            SubmissionDetails::ProjectConsultation(c) => Some(c),
            SubmissionDetails::ContactMessage { .. } => None,
        }
    }

    /// Subject line used for the stored row
    ///
    /// Consultations are filed as `Project consultation: <type>`, falling back
    /// to `General` when no project type was given.
    pub fn record_subject(&self) -> String {
        match &self.details {
            SubmissionDetails::ContactMessage { subject, .. } => subject.clone(),
            SubmissionDetails::ProjectConsultation(c) => format!(
                "Project consultation: {}",
                c.project_type.as_deref().unwrap_or("General")
            ),
        }
    }
}
