//! Conversation engine — the per-user invoice flow state machine.
//!
//! One [`Engine`] instance owns all sessions, keyed by user identifier. It
//! ingests one inbound event at a time and produces the outbound prompts,
//! documents, and side effects for that event. Events for a session are
//! handled to completion before the next one is read, so no two events for
//! the same session ever interleave.
//!
//! Validation policy: numeric fields (item amount, tax) must parse as a
//! finite number; a parse failure re-emits the same prompt and leaves state
//! and draft untouched. Everything else — names, dates, sender, email — is
//! accepted as opaque text.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Local;
use tallybot_core::event::{Command, InboundEvent};
use tallybot_core::history::{HistoryRecord, HistoryStore};
use tallybot_core::mail::Mailer;
use tallybot_core::session::{Session, State};
use tracing::{debug, error, warn};

pub mod prompts {
    //! User-facing prompt and result texts.

    pub const WELCOME: &str =
        "Welcome! Use /invoice to create a new invoice or /last_invoice to retrieve the previous one.";
    pub const CLIENT: &str = "Please enter the client name:";
    pub const DATE: &str = "Enter invoice date (YYYY-MM-DD) or /skip for today:";
    pub const ITEM_NAME: &str = "Enter item name or /done when finished:";
    pub const ITEM_AMOUNT: &str = "Enter amount for this item:";
    pub const INVALID_NUMBER: &str = "Please enter a valid number:";
    pub const TAX: &str = "Enter tax percentage or /skip:";
    pub const SENDER: &str = "Enter sender information (company or your name):";
    pub const EMAIL: &str = "Enter email address to send invoice or /skip:";
    pub const SENT: &str = "Invoice sent via email!";
    pub const FINISHED: &str = "Invoice creation finished.";
    pub const CANCELED: &str = "Invoice creation canceled.";
    pub const NO_INVOICE: &str = "No invoice available.";
    pub const GENERATION_FAILED: &str = "Failed to generate the invoice.";
}

/// Filename used for every emitted invoice document.
pub const INVOICE_FILENAME: &str = "invoice.pdf";

/// An outbound effect produced by handling one inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text(String),
    Document { filename: String, bytes: Vec<u8> },
}

/// The conversation engine.
///
/// Collaborators are injected as trait objects so tests can drive full flows
/// without a network or filesystem.
pub struct Engine {
    sessions: HashMap<String, Session>,
    history: Arc<dyn HistoryStore>,
    mailer: Arc<dyn Mailer>,
}

impl Engine {
    pub fn new(history: Arc<dyn HistoryStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            sessions: HashMap::new(),
            history,
            mailer,
        }
    }

    /// Inspect a user's session (diagnostics and tests).
    pub fn session(&self, user_id: &str) -> Option<&Session> {
        self.sessions.get(user_id)
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Handle one inbound event for one user.
    ///
    /// Returns the outbound messages in emission order. Side effects
    /// (history append, mail delivery) happen before this returns, so the
    /// caller may safely feed the next event afterwards.
    pub async fn handle(&mut self, user_id: &str, event: InboundEvent) -> Vec<Outbound> {
        let history = Arc::clone(&self.history);
        let mailer = Arc::clone(&self.mailer);
        let session = self.sessions.entry(user_id.to_string()).or_default();

        // Commands valid in every state.
        match event {
            InboundEvent::Command(Command::Start) => {
                return vec![Outbound::Text(prompts::WELCOME.into())];
            }
            InboundEvent::Command(Command::NewInvoice) => {
                session.begin();
                return vec![Outbound::Text(prompts::CLIENT.into())];
            }
            InboundEvent::Command(Command::Cancel) => {
                session.reset();
                return vec![Outbound::Text(prompts::CANCELED.into())];
            }
            InboundEvent::Command(Command::LastInvoice) => {
                return match &session.last_invoice {
                    Some(bytes) => vec![Outbound::Document {
                        filename: INVOICE_FILENAME.into(),
                        bytes: bytes.clone(),
                    }],
                    None => vec![Outbound::Text(prompts::NO_INVOICE.into())],
                };
            }
            _ => {}
        }

        match (session.state, event) {
            (State::Idle, event) => {
                debug!(user_id = %user_id, ?event, "Ignoring input outside a flow");
                vec![]
            }

            (State::Client, InboundEvent::Text(text)) => {
                session.draft.client_name = Some(text);
                session.state = State::Date;
                vec![Outbound::Text(prompts::DATE.into())]
            }

            (State::Date, InboundEvent::Text(text)) => {
                session.draft.date = Some(text);
                session.state = State::ItemName;
                vec![Outbound::Text(prompts::ITEM_NAME.into())]
            }
            (State::Date, InboundEvent::Command(Command::Skip)) => {
                session.draft.date = Some(Local::now().format("%Y-%m-%d").to_string());
                session.state = State::ItemName;
                vec![Outbound::Text(prompts::ITEM_NAME.into())]
            }

            (State::ItemName, InboundEvent::Text(text)) => {
                session.draft.pending_item_name = Some(text);
                session.state = State::ItemAmount;
                vec![Outbound::Text(prompts::ITEM_AMOUNT.into())]
            }
            (State::ItemName, InboundEvent::Command(Command::Done)) => {
                // An empty item list is legal: zero-subtotal invoice.
                session.state = State::Tax;
                vec![Outbound::Text(prompts::TAX.into())]
            }

            (State::ItemAmount, InboundEvent::Text(text)) => match parse_number(&text) {
                Some(amount) => {
                    let name = session.draft.pending_item_name.take().unwrap_or_default();
                    session
                        .draft
                        .items
                        .push(tallybot_core::invoice::LineItem::new(name, amount));
                    session.state = State::ItemName;
                    vec![Outbound::Text(prompts::ITEM_NAME.into())]
                }
                None => vec![Outbound::Text(prompts::INVALID_NUMBER.into())],
            },

            (State::Tax, InboundEvent::Text(text)) => match parse_number(&text) {
                Some(tax) => {
                    session.draft.tax_percent = Some(tax);
                    session.state = State::Sender;
                    vec![Outbound::Text(prompts::SENDER.into())]
                }
                None => vec![Outbound::Text(prompts::INVALID_NUMBER.into())],
            },
            (State::Tax, InboundEvent::Command(Command::Skip)) => {
                session.draft.tax_percent = Some(0.0);
                session.state = State::Sender;
                vec![Outbound::Text(prompts::SENDER.into())]
            }

            (State::Sender, InboundEvent::Text(text)) => {
                session.draft.sender = Some(text);
                let invoice = session.draft.finalize();
                match tallybot_invoice::assemble(&invoice) {
                    Ok((bytes, total)) => {
                        session.last_invoice = Some(bytes.clone());
                        session.state = State::Email;

                        let record = HistoryRecord {
                            client: invoice.client_name.clone(),
                            date: invoice.date.clone(),
                            total,
                        };
                        if let Err(e) = history.append(record).await {
                            // History is best-effort: the user still gets
                            // their document.
                            warn!(user_id = %user_id, error = %e, "Failed to record invoice history");
                        }

                        vec![
                            Outbound::Document {
                                filename: INVOICE_FILENAME.into(),
                                bytes,
                            },
                            Outbound::Text(prompts::EMAIL.into()),
                        ]
                    }
                    Err(e) => {
                        error!(user_id = %user_id, error = %e, "Invoice assembly failed");
                        session.reset();
                        vec![Outbound::Text(prompts::GENERATION_FAILED.into())]
                    }
                }
            }

            (State::Email, InboundEvent::Text(address)) => {
                let reply = match &session.last_invoice {
                    Some(bytes) => match mailer.send(bytes, &address).await {
                        Ok(()) => prompts::SENT.to_string(),
                        Err(e) => format!("Failed to send email: {e}"),
                    },
                    None => {
                        warn!(user_id = %user_id, "No invoice bytes at email step");
                        prompts::FINISHED.to_string()
                    }
                };
                session.reset();
                vec![Outbound::Text(reply)]
            }
            (State::Email, InboundEvent::Command(Command::Skip)) => {
                session.reset();
                vec![Outbound::Text(prompts::FINISHED.into())]
            }

            // A command with no meaning in the current state is dropped.
            (state, event) => {
                debug!(user_id = %user_id, ?state, ?event, "Ignoring command in this state");
                vec![]
            }
        }
    }
}

/// Parse user text as a finite decimal number.
fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
