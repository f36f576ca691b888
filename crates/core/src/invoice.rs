//! Invoice value types.
//!
//! An [`Invoice`] is the finalized output of a completed conversation flow.
//! It is ephemeral — produced by the engine, consumed immediately by the
//! assembler and the history store, never persisted as an entity itself.

use serde::{Deserialize, Serialize};

/// A single named amount contributing to the subtotal.
///
/// Amounts may be zero or negative — there is no business-rule rejection
/// beyond "is it a finite number", which the engine enforces at entry time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub amount: f64,
}

impl LineItem {
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// A completed invoice, ready for assembly.
///
/// An empty `items` list is legal and yields a zero-subtotal document.
/// `tax_percent` is 0.0 when the tax step was skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub client_name: String,
    pub date: String,
    pub sender: String,
    pub items: Vec<LineItem>,
    pub tax_percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_item_permits_zero_and_negative() {
        let zero = LineItem::new("Comped", 0.0);
        let refund = LineItem::new("Refund", -5.50);
        assert_eq!(zero.amount, 0.0);
        assert_eq!(refund.amount, -5.50);
    }

    #[test]
    fn invoice_serializes_items_in_order() {
        let invoice = Invoice {
            client_name: "Acme".into(),
            date: "2024-01-05".into(),
            sender: "Bob".into(),
            items: vec![LineItem::new("Widget", 10.0), LineItem::new("Gadget", 5.5)],
            tax_percent: 0.0,
        };
        let json = serde_json::to_string(&invoice).unwrap();
        let widget = json.find("Widget").unwrap();
        let gadget = json.find("Gadget").unwrap();
        assert!(widget < gadget);
    }
}
