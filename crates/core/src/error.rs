//! Error types for the TallyBot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; call sites handle the
//! context they talk to directly rather than funneling through a
//! catch-all type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Message delivery failed to {channel}: {reason}")]
    DeliveryFailed { channel: String, reason: String },

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),

    #[error("Invalid API payload: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("Invalid sender address: {0}")]
    InvalidSender(String),

    #[error("Failed to build message: {0}")]
    MessageBuild(String),

    #[error("SMTP delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("Non-finite amount for item '{item}'")]
    NonFiniteAmount { item: String },

    #[error("Non-finite tax percentage: {0}")]
    NonFiniteTax(f64),

    #[error("Document rendering failed: {0}")]
    Render(String),
}
