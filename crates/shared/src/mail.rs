//! Mail notifier boundary.
//!
//! Invite workflows notify invitees by email. Delivery is fire-and-forget
//! from the caller's perspective: a failed send is logged and never blocks
//! the business operation. The [`Mailer`] trait keeps the transport
//! stub-replaceable; [`SmtpMailer`] uses `lettre`, [`LogMailer`] just writes
//! to the log (useful for development and tests).

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use crate::config::MailConfig;

/// Mail notifier errors.
#[derive(Debug, Error)]
pub enum MailError {
    /// Failed to build the email message.
    #[error("Failed to build email: {0}")]
    Build(String),
    /// Failed to send the email.
    #[error("Failed to send email: {0}")]
    Send(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Outgoing mail notifications used by the invite workflows.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends a parent invite with an accept link.
    async fn send_parent_invite(
        &self,
        to_email: &str,
        accept_link: &str,
        inviter_name: &str,
        child_names: &[String],
    ) -> Result<(), MailError>;

    /// Sends a child sign-up invite with an accept link.
    async fn send_child_invite(
        &self,
        to_email: &str,
        accept_link: &str,
        child_name: &str,
    ) -> Result<(), MailError>;
}

/// SMTP mailer backed by `lettre`.
#[derive(Clone)]
pub struct SmtpMailer {
    config: MailConfig,
}

impl SmtpMailer {
    /// Creates a new SMTP mailer.
    #[must_use]
    pub const fn new(config: MailConfig) -> Self {
        Self { config }
    }

    /// Creates an SMTP transport.
    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| MailError::Send(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build();

        Ok(transport)
    }

    /// Sends a plain-text email.
    async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| MailError::InvalidAddress(format!("{e}")))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| MailError::InvalidAddress(format!("{e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| MailError::Build(e.to_string()))?;

        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| MailError::Send(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_parent_invite(
        &self,
        to_email: &str,
        accept_link: &str,
        inviter_name: &str,
        child_names: &[String],
    ) -> Result<(), MailError> {
        let children = child_names.join(", ");
        let subject = "Kidbank - You have been invited as a parent";
        let body = format!(
            r"Hi,

{inviter_name} invited you to join their family on Kidbank as a parent of {children}.

Accept the invitation using the link below (valid for 7 days):

{accept_link}

If you were not expecting this invitation, you can safely ignore this email.

Best regards,
The Kidbank Team"
        );

        self.send(to_email, subject, &body).await
    }

    async fn send_child_invite(
        &self,
        to_email: &str,
        accept_link: &str,
        child_name: &str,
    ) -> Result<(), MailError> {
        let subject = "Kidbank - Create your own login";
        let body = format!(
            r"Hi {child_name},

You can now create your own Kidbank login. Your savings and history come with you.

Use the link below to sign up (valid for 7 days):

{accept_link}

Best regards,
The Kidbank Team"
        );

        self.send(to_email, subject, &body).await
    }
}

/// Mailer stub that logs instead of sending. Development and test default.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_parent_invite(
        &self,
        to_email: &str,
        accept_link: &str,
        inviter_name: &str,
        child_names: &[String],
    ) -> Result<(), MailError> {
        tracing::info!(
            to = %to_email,
            inviter = %inviter_name,
            children = %child_names.join(", "),
            link = %accept_link,
            "parent invite mail (stub)"
        );
        Ok(())
    }

    async fn send_child_invite(
        &self,
        to_email: &str,
        accept_link: &str,
        child_name: &str,
    ) -> Result<(), MailError> {
        tracing::info!(
            to = %to_email,
            child = %child_name,
            link = %accept_link,
            "child invite mail (stub)"
        );
        Ok(())
    }
}
