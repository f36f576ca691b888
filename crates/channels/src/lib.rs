//! Chat channel implementations.
//!
//! Each module implements [`tallybot_core::Channel`] for one messaging
//! platform. Only Telegram is wired up today; the trait keeps the engine
//! transport-agnostic.

pub mod telegram;

pub use telegram::{TelegramChannel, TelegramConfig};
