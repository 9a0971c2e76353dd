//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod smtp_mail_adapter;

pub use smtp_mail_adapter::SmtpMailAdapter;
