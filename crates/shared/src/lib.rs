//! Shared types, errors, and configuration for Kidbank.
//!
//! This crate holds everything that cuts across the core business logic and
//! the storage layer: the domain error taxonomy, typed entity IDs, application
//! configuration, and the mail notifier boundary.

pub mod config;
pub mod error;
pub mod mail;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, InviteConfig, MailConfig};
pub use error::{DomainError, DomainResult};
pub use mail::{LogMailer, MailError, Mailer, SmtpMailer};
