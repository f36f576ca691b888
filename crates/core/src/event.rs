//! Inbound event model.
//!
//! Raw message text is parsed once, at the transport boundary, into a tagged
//! [`InboundEvent`] — either free text or a recognized bot command. The
//! engine dispatches on the tag instead of string-sniffing in every handler.

use serde::{Deserialize, Serialize};

/// A reserved bot command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// `/start` — welcome message with usage instructions.
    Start,
    /// `/invoice` — begin a new invoice flow.
    NewInvoice,
    /// `/skip` — skip the current optional step (date, tax, email).
    Skip,
    /// `/done` — finish the line-item loop.
    Done,
    /// `/cancel` — abort the flow from any state.
    Cancel,
    /// `/last_invoice` — resend the previously generated invoice.
    LastInvoice,
}

/// One inbound text event, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboundEvent {
    Text(String),
    Command(Command),
}

impl InboundEvent {
    /// Parse raw message content into an event.
    ///
    /// Telegram appends `@botname` to commands in group chats; the suffix is
    /// stripped before matching. A leading-slash token that is not one of the
    /// reserved commands yields `None` — unrecognized commands are dropped at
    /// the transport boundary rather than leaking into field text.
    pub fn parse(content: &str) -> Option<Self> {
        let trimmed = content.trim();
        if let Some(rest) = trimmed.strip_prefix('/') {
            let word = rest.split_whitespace().next().unwrap_or("");
            let name = word.split('@').next().unwrap_or("");
            let command = match name {
                "start" => Command::Start,
                "invoice" => Command::NewInvoice,
                "skip" => Command::Skip,
                "done" => Command::Done,
                "cancel" => Command::Cancel,
                "last_invoice" => Command::LastInvoice,
                _ => return None,
            };
            return Some(InboundEvent::Command(command));
        }
        Some(InboundEvent::Text(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reserved_commands() {
        assert_eq!(
            InboundEvent::parse("/invoice"),
            Some(InboundEvent::Command(Command::NewInvoice))
        );
        assert_eq!(
            InboundEvent::parse("/skip"),
            Some(InboundEvent::Command(Command::Skip))
        );
        assert_eq!(
            InboundEvent::parse("/done"),
            Some(InboundEvent::Command(Command::Done))
        );
        assert_eq!(
            InboundEvent::parse("/cancel"),
            Some(InboundEvent::Command(Command::Cancel))
        );
        assert_eq!(
            InboundEvent::parse("/last_invoice"),
            Some(InboundEvent::Command(Command::LastInvoice))
        );
        assert_eq!(
            InboundEvent::parse("/start"),
            Some(InboundEvent::Command(Command::Start))
        );
    }

    #[test]
    fn strips_botname_suffix() {
        assert_eq!(
            InboundEvent::parse("/invoice@tallybot"),
            Some(InboundEvent::Command(Command::NewInvoice))
        );
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(
            InboundEvent::parse("Acme Corp"),
            Some(InboundEvent::Text("Acme Corp".into()))
        );
    }

    #[test]
    fn unknown_command_is_dropped() {
        assert_eq!(InboundEvent::parse("/frobnicate"), None);
        assert_eq!(InboundEvent::parse("/frobnicate@tallybot"), None);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(
            InboundEvent::parse("  /done  "),
            Some(InboundEvent::Command(Command::Done))
        );
        assert_eq!(
            InboundEvent::parse("  12.50  "),
            Some(InboundEvent::Text("12.50".into()))
        );
    }
}
