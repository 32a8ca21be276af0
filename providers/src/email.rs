//! Outbound email.

use farmlink_core::ProviderError;
use farmlink_core::environment::{BoxFuture, EmailMessage, Notifier};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;

/// Implicit-TLS SMTP port; any other port negotiates STARTTLS.
const SMTPS_PORT: u16 = 465;

/// SMTP connection and sender settings.
#[derive(Clone)]
pub struct SmtpSettings {
    /// Relay host name
    pub server: String,
    /// Relay port
    pub port: u16,
    /// Login, if the relay requires authentication
    pub username: Option<String>,
    /// Password for `username`
    pub password: Option<String>,
    /// Sender address
    pub from_email: String,
    /// Sender display name
    pub from_name: String,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("from_email", &self.from_email)
            .finish_non_exhaustive()
    }
}

/// [`Notifier`] delivering through an SMTP relay.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpNotifier").field("from", &self.from).finish_non_exhaustive()
    }
}

impl SmtpNotifier {
    /// Build the transport. No connection is opened until the first send.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Email`] if the relay host or sender address is invalid.
    pub fn new(settings: &SmtpSettings) -> Result<Self, ProviderError> {
        let builder = if settings.port == SMTPS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.server)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)
        }
        .map_err(|e| ProviderError::Email(format!("SMTP relay error: {e}")))?
        .port(settings.port);

        let builder = match (&settings.username, &settings.password) {
            (Some(user), Some(pass)) => builder.credentials(Credentials::new(user.clone(), pass.clone())),
            _ => builder,
        };

        let from = format!("{} <{}>", settings.from_name, settings.from_email)
            .parse::<Mailbox>()
            .map_err(|e| ProviderError::Email(format!("Invalid from address: {e}")))?;

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, message: EmailMessage) -> BoxFuture<'_, Result<(), ProviderError>> {
        Box::pin(async move {
            let to = message
                .to
                .parse::<Mailbox>()
                .map_err(|e| ProviderError::Email(format!("Invalid to address: {e}")))?;
            let email = Message::builder()
                .from(self.from.clone())
                .to(to)
                .subject(&message.subject)
                .header(ContentType::TEXT_PLAIN)
                .body(message.body)
                .map_err(|e| ProviderError::Email(format!("Failed to build email: {e}")))?;

            self.mailer
                .send(email)
                .await
                .map_err(|e| ProviderError::Email(format!("Failed to send email: {e}")))?;
            tracing::info!(to = %message.to, subject = %message.subject, "Email sent");
            Ok(())
        })
    }
}

/// [`Notifier`] that writes emails to the log. Used when no SMTP relay is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn send(&self, message: EmailMessage) -> BoxFuture<'_, Result<(), ProviderError>> {
        Box::pin(async move {
            tracing::info!(
                to = %message.to,
                subject = %message.subject,
                body = %message.body,
                "Email (console delivery)"
            );
            Ok(())
        })
    }
}
