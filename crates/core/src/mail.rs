//! Mail delivery trait.
//!
//! The engine hands a rendered invoice and a recipient address to a
//! [`Mailer`] and inspects the result explicitly — a delivery failure is
//! reported to the user as a plain message, never an aborted session.

use async_trait::async_trait;

use crate::error::MailError;

/// Outbound email delivery of a rendered invoice document.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send `document` as a PDF attachment to `recipient`.
    ///
    /// The recipient address is opaque text from the user — implementations
    /// surface address parse failures as [`MailError::InvalidRecipient`]
    /// rather than panicking.
    async fn send(
        &self,
        document: &[u8],
        recipient: &str,
    ) -> std::result::Result<(), MailError>;
}
