//! SMTP mail delivery — sends rendered invoices as PDF attachments.
//!
//! Talks to a plain SMTP relay (no TLS, no auth), matching the
//! environment-supplied `SMTP_HOST`/`SMTP_PORT`/`SMTP_SENDER` deployment
//! model. All failures come back as [`MailError`] values for the engine to
//! report; nothing here panics on bad user input.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tallybot_core::error::MailError;
use tallybot_core::mail::Mailer;
use tracing::{debug, info};

const SUBJECT: &str = "Invoice";
const BODY: &str = "Please find attached invoice.";
const ATTACHMENT_NAME: &str = "invoice.pdf";

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// The From address on outgoing mail.
    pub sender: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 25,
            sender: "noreply@example.com".into(),
        }
    }
}

/// Mailer backed by an async SMTP transport.
pub struct SmtpMailer {
    config: SmtpConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .build();
        Self { config, transport }
    }
}

/// Build the outgoing message: plain-text body plus the PDF attachment.
fn build_message(sender: &str, recipient: &str, document: &[u8]) -> Result<Message, MailError> {
    let from: Mailbox = sender
        .parse()
        .map_err(|_| MailError::InvalidSender(sender.to_string()))?;
    let to: Mailbox = recipient
        .parse()
        .map_err(|_| MailError::InvalidRecipient(recipient.to_string()))?;

    let content_type = ContentType::parse("application/pdf")
        .map_err(|e| MailError::MessageBuild(e.to_string()))?;
    let attachment =
        Attachment::new(ATTACHMENT_NAME.to_string()).body(document.to_vec(), content_type);

    Message::builder()
        .from(from)
        .to(to)
        .subject(SUBJECT)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(BODY.to_string()))
                .singlepart(attachment),
        )
        .map_err(|e| MailError::MessageBuild(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, document: &[u8], recipient: &str) -> Result<(), MailError> {
        let message = build_message(&self.config.sender, recipient, document)?;

        debug!(
            host = %self.config.host,
            port = self.config.port,
            size_bytes = document.len(),
            "Sending invoice via SMTP"
        );

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;

        info!(recipient = %recipient, "Invoice emailed");
        Ok(())
    }
}
