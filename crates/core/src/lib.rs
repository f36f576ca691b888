//! # TallyBot Core
//!
//! Domain types, traits, and error definitions for the TallyBot invoice bot.
//! This crate has **zero framework dependencies** — it defines the domain
//! model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator the conversation engine talks to (chat transport,
//! history store, mail delivery) is defined as a trait here. Implementations
//! live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod channel;
pub mod error;
pub mod event;
pub mod history;
pub mod invoice;
pub mod mail;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use channel::{Channel, ChannelId, ChannelMessage};
pub use error::{ChannelError, HistoryError, InvoiceError, MailError};
pub use event::{Command, InboundEvent};
pub use history::{HistoryRecord, HistoryStore};
pub use invoice::{Invoice, LineItem};
pub use mail::Mailer;
pub use session::{Draft, Session, State};
