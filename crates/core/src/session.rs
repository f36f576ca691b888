//! Per-user conversation session state.
//!
//! A [`Session`] tracks one user's progress through the invoice flow: the
//! current [`State`], the partially-built [`Draft`], and the bytes of the
//! most recently completed invoice (for `/last_invoice`). Sessions are owned
//! exclusively by the conversation engine, keyed by user identifier — there
//! is no global or thread-local state.

use serde::{Deserialize, Serialize};

use crate::invoice::{Invoice, LineItem};

/// The current step of the conversation flow, in protocol order.
///
/// `Idle → Client → Date → ItemName ⇄ ItemAmount → Tax → Sender → Email → Idle`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    /// No flow in progress. The session parks here between invoices.
    #[default]
    Idle,
    /// Waiting for the client name.
    Client,
    /// Waiting for the invoice date (or `/skip` for today).
    Date,
    /// Waiting for the next item name (or `/done` to finish the list).
    ItemName,
    /// Waiting for the amount of the pending item.
    ItemAmount,
    /// Waiting for the tax percentage (or `/skip` for none).
    Tax,
    /// Waiting for sender information. Completing this step assembles the
    /// invoice.
    Sender,
    /// Waiting for an email address to deliver to (or `/skip`).
    Email,
}

/// An in-progress invoice attached to a session, not yet finalized.
///
/// `pending_item_name` holds a parsed item name awaiting its amount; it is
/// only set while the session sits in [`State::ItemAmount`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub client_name: Option<String>,
    pub date: Option<String>,
    pub items: Vec<LineItem>,
    pub tax_percent: Option<f64>,
    pub sender: Option<String>,
    pub pending_item_name: Option<String>,
}

impl Draft {
    /// Finalize the draft into an [`Invoice`].
    ///
    /// Fields the flow has not reached yet default to empty / 0.0 — the
    /// engine only calls this after the sender step, at which point all
    /// required fields are populated.
    pub fn finalize(&self) -> Invoice {
        Invoice {
            client_name: self.client_name.clone().unwrap_or_default(),
            date: self.date.clone().unwrap_or_default(),
            sender: self.sender.clone().unwrap_or_default(),
            items: self.items.clone(),
            tax_percent: self.tax_percent.unwrap_or(0.0),
        }
    }
}

/// One user's conversation state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub state: State,
    pub draft: Draft,
    /// Rendered bytes of the last completed invoice in this session.
    /// Survives draft resets so `/last_invoice` works after the flow ends.
    pub last_invoice: Option<Vec<u8>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a fresh flow: discard any draft and move to the first step.
    /// A flow entry while another flow is active overwrites it.
    pub fn begin(&mut self) {
        self.draft = Draft::default();
        self.state = State::Client;
    }

    /// End the flow: discard the draft and return to idle.
    /// `last_invoice` is intentionally retained.
    pub fn reset(&mut self) {
        self.draft = Draft::default();
        self.state = State::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_idle_and_empty() {
        let session = Session::new();
        assert_eq!(session.state, State::Idle);
        assert!(session.draft.items.is_empty());
        assert!(session.last_invoice.is_none());
    }

    #[test]
    fn begin_clears_previous_draft() {
        let mut session = Session::new();
        session.draft.client_name = Some("Old Client".into());
        session.draft.items.push(LineItem::new("Leftover", 1.0));
        session.begin();
        assert_eq!(session.state, State::Client);
        assert!(session.draft.client_name.is_none());
        assert!(session.draft.items.is_empty());
    }

    #[test]
    fn reset_keeps_last_invoice() {
        let mut session = Session::new();
        session.last_invoice = Some(vec![1, 2, 3]);
        session.state = State::Email;
        session.reset();
        assert_eq!(session.state, State::Idle);
        assert_eq!(session.last_invoice, Some(vec![1, 2, 3]));
    }

    #[test]
    fn finalize_defaults_missing_fields() {
        let draft = Draft {
            client_name: Some("Acme".into()),
            ..Draft::default()
        };
        let invoice = draft.finalize();
        assert_eq!(invoice.client_name, "Acme");
        assert_eq!(invoice.date, "");
        assert_eq!(invoice.tax_percent, 0.0);
    }
}
