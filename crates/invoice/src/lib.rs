//! Invoice assembler — pure computation and document rendering.
//!
//! Given a completed [`Invoice`], computes subtotal/tax/total and renders a
//! single-page PDF with a flat list-and-totals layout. No internal state,
//! idempotent, safe to call any number of times with the same input.
//!
//! Inputs are pre-validated by the conversation engine; a non-finite amount
//! slipping through fails fast with [`InvoiceError`] rather than silently
//! producing a corrupt document.

use printpdf::{BuiltinFont, Mm, PdfDocument};
use tallybot_core::error::InvoiceError;
use tallybot_core::invoice::Invoice;
use tracing::debug;

/// US Letter, in points (matches the rendered coordinate system).
const PAGE_WIDTH_PT: f32 = 612.0;
const PAGE_HEIGHT_PT: f32 = 792.0;

const LEFT_MARGIN_PT: f32 = 50.0;
const ITEM_INDENT_PT: f32 = 60.0;
const LINE_STEP_PT: f32 = 20.0;

/// Computed monetary totals for an invoice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    /// `None` when the tax rate is zero — the tax line is omitted entirely.
    pub tax_amount: Option<f64>,
    pub total: f64,
}

/// Compute subtotal, tax, and total for an invoice.
///
/// Standard double-precision summation in insertion order. Fails fast on any
/// non-finite amount or tax rate.
pub fn totals(invoice: &Invoice) -> Result<Totals, InvoiceError> {
    for item in &invoice.items {
        if !item.amount.is_finite() {
            return Err(InvoiceError::NonFiniteAmount {
                item: item.name.clone(),
            });
        }
    }
    if !invoice.tax_percent.is_finite() {
        return Err(InvoiceError::NonFiniteTax(invoice.tax_percent));
    }

    let subtotal: f64 = invoice.items.iter().map(|i| i.amount).sum();
    let tax_amount = if invoice.tax_percent != 0.0 {
        Some(subtotal * invoice.tax_percent / 100.0)
    } else {
        None
    };
    let total = subtotal + tax_amount.unwrap_or(0.0);

    Ok(Totals {
        subtotal,
        tax_amount,
        total,
    })
}

/// The document body as text lines, in render order (title excluded).
///
/// Fixed layout: date, bill-to, from, items header, one line per item in
/// insertion order, subtotal, conditional tax line, total.
pub fn layout_lines(invoice: &Invoice, totals: &Totals) -> Vec<String> {
    let mut lines = Vec::with_capacity(invoice.items.len() + 7);
    lines.push(format!("Date: {}", invoice.date));
    lines.push(format!("Bill To: {}", invoice.client_name));
    lines.push(format!("From: {}", invoice.sender));
    lines.push("Items:".to_string());
    for item in &invoice.items {
        lines.push(format!("{}: ${:.2}", item.name, item.amount));
    }
    lines.push(format!("Subtotal: ${:.2}", totals.subtotal));
    if let Some(tax_amount) = totals.tax_amount {
        lines.push(format!(
            "Tax ({:.2}%): ${:.2}",
            invoice.tax_percent, tax_amount
        ));
    }
    lines.push(format!("Total: ${:.2}", totals.total));
    lines
}

/// Assemble an invoice: compute totals and render the PDF.
///
/// Returns the document bytes and the exact numeric total — callers use that
/// value for history records, not a re-parse of the rendered text.
pub fn assemble(invoice: &Invoice) -> Result<(Vec<u8>, f64), InvoiceError> {
    let totals = totals(invoice)?;
    let lines = layout_lines(invoice, &totals);

    let (doc, page, layer) = PdfDocument::new(
        "Invoice",
        pt_to_mm(PAGE_WIDTH_PT),
        pt_to_mm(PAGE_HEIGHT_PT),
        "Layer 1",
    );
    let layer = doc.get_page(page).get_layer(layer);

    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| InvoiceError::Render(e.to_string()))?;
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| InvoiceError::Render(e.to_string()))?;

    layer.use_text(
        "Invoice",
        16.0,
        pt_to_mm(LEFT_MARGIN_PT),
        pt_to_mm(PAGE_HEIGHT_PT - 50.0),
        &bold,
    );

    // Items are indented; everything else sits on the left margin. The item
    // block occupies a fixed index range because the layout is fixed.
    let item_range = 4..4 + invoice.items.len();
    let mut y = PAGE_HEIGHT_PT - 80.0;
    for (idx, line) in lines.iter().enumerate() {
        let x = if item_range.contains(&idx) {
            ITEM_INDENT_PT
        } else {
            LEFT_MARGIN_PT
        };
        layer.use_text(line, 12.0, pt_to_mm(x), pt_to_mm(y), &regular);
        y -= LINE_STEP_PT;
        // Blank slot between the header block and the items header.
        if idx == 2 {
            y -= LINE_STEP_PT;
        }
    }

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| InvoiceError::Render(e.to_string()))?;

    debug!(
        client = %invoice.client_name,
        items = invoice.items.len(),
        total = totals.total,
        size_bytes = bytes.len(),
        "Invoice assembled"
    );

    Ok((bytes, totals.total))
}

fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tallybot_core::invoice::LineItem;

    fn two_item_invoice(tax_percent: f64) -> Invoice {
        Invoice {
            client_name: "Acme".into(),
            date: "2024-01-05".into(),
            sender: "Bob".into(),
            items: vec![
                LineItem::new("Widget", 10.00),
                LineItem::new("Gadget", 5.50),
            ],
            tax_percent,
        }
    }

    #[test]
    fn totals_without_tax() {
        let t = totals(&two_item_invoice(0.0)).unwrap();
        assert_eq!(t.subtotal, 15.50);
        assert_eq!(t.tax_amount, None);
        assert_eq!(t.total, 15.50);
    }

    #[test]
    fn totals_with_tax() {
        let t = totals(&two_item_invoice(8.0)).unwrap();
        assert_eq!(t.subtotal, 15.50);
        assert!((t.tax_amount.unwrap() - 1.24).abs() < 1e-9);
        assert!((t.total - 16.74).abs() < 1e-9);
    }

    #[test]
    fn totals_with_negative_amounts() {
        let invoice = Invoice {
            client_name: "Acme".into(),
            date: "2024-01-05".into(),
            sender: "Bob".into(),
            items: vec![
                LineItem::new("Service", 100.0),
                LineItem::new("Credit", -20.0),
            ],
            tax_percent: 10.0,
        };
        let t = totals(&invoice).unwrap();
        assert_eq!(t.subtotal, 80.0);
        assert_eq!(t.tax_amount, Some(8.0));
        assert_eq!(t.total, 88.0);
    }

    #[test]
    fn empty_invoice_renders_zero_totals() {
        let invoice = Invoice {
            client_name: "Acme".into(),
            date: "2024-01-05".into(),
            sender: "Bob".into(),
            items: vec![],
            tax_percent: 0.0,
        };
        let t = totals(&invoice).unwrap();
        assert_eq!(t.subtotal, 0.0);
        assert_eq!(t.total, 0.0);

        let lines = layout_lines(&invoice, &t);
        assert!(lines.contains(&"Subtotal: $0.00".to_string()));
        assert!(lines.contains(&"Total: $0.00".to_string()));

        let (bytes, total) = assemble(&invoice).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(total, 0.0);
    }

    #[test]
    fn layout_without_tax_omits_tax_line() {
        let invoice = two_item_invoice(0.0);
        let t = totals(&invoice).unwrap();
        let lines = layout_lines(&invoice, &t);
        assert_eq!(
            lines,
            vec![
                "Date: 2024-01-05".to_string(),
                "Bill To: Acme".to_string(),
                "From: Bob".to_string(),
                "Items:".to_string(),
                "Widget: $10.00".to_string(),
                "Gadget: $5.50".to_string(),
                "Subtotal: $15.50".to_string(),
                "Total: $15.50".to_string(),
            ]
        );
    }

    #[test]
    fn layout_with_tax_includes_tax_line() {
        let invoice = two_item_invoice(8.0);
        let t = totals(&invoice).unwrap();
        let lines = layout_lines(&invoice, &t);
        assert!(lines.contains(&"Tax (8.00%): $1.24".to_string()));
        assert!(lines.contains(&"Total: $16.74".to_string()));
    }

    #[test]
    fn items_render_in_insertion_order() {
        let invoice = two_item_invoice(0.0);
        let t = totals(&invoice).unwrap();
        let lines = layout_lines(&invoice, &t);
        let widget = lines.iter().position(|l| l.starts_with("Widget")).unwrap();
        let gadget = lines.iter().position(|l| l.starts_with("Gadget")).unwrap();
        assert!(widget < gadget);
    }

    #[test]
    fn assemble_is_deterministic() {
        let invoice = two_item_invoice(8.0);
        let (bytes_a, total_a) = assemble(&invoice).unwrap();
        let (bytes_b, total_b) = assemble(&invoice).unwrap();
        assert_eq!(total_a, total_b);
        assert_eq!(bytes_a.len(), bytes_b.len());
    }

    #[test]
    fn assemble_produces_pdf_bytes() {
        let (bytes, _) = assemble(&two_item_invoice(0.0)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn non_finite_amount_fails_fast() {
        let invoice = Invoice {
            client_name: "Acme".into(),
            date: "2024-01-05".into(),
            sender: "Bob".into(),
            items: vec![LineItem::new("Broken", f64::NAN)],
            tax_percent: 0.0,
        };
        let err = totals(&invoice).unwrap_err();
        assert!(matches!(err, InvoiceError::NonFiniteAmount { .. }));
        assert!(assemble(&invoice).is_err());
    }

    #[test]
    fn non_finite_tax_fails_fast() {
        let invoice = Invoice {
            client_name: "Acme".into(),
            date: "2024-01-05".into(),
            sender: "Bob".into(),
            items: vec![],
            tax_percent: f64::INFINITY,
        };
        assert!(matches!(
            totals(&invoice),
            Err(InvoiceError::NonFiniteTax(_))
        ));
    }
}
