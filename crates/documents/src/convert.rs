//! Conversion of proformas and delivery notes into invoices.
//!
//! Conversion mints a brand-new invoice: fresh identity, fresh number (the
//! service assigns it from the invoice partition), deep-copied line items with
//! new identities, and totals derived from the copies rather than carried over
//! from the source. Shipping is copied from proforma sources and zeroed for
//! delivery sources.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use shopledger_core::{DomainError, DomainResult, EntityId};

use crate::document::{Document, DocumentId, DocumentKind, LineItem, LineItemId};

/// Shipping carried into the conversion target, per source kind.
fn conversion_shipping(source: &Document) -> Decimal {
    match source.kind() {
        DocumentKind::Proforma => source.shipping_cost(),
        _ => Decimal::ZERO,
    }
}

/// Build the invoice a source document converts into.
///
/// The result has no number and no store presence yet; the caller numbers and
/// persists it, then stamps the source. Rejects sources that are not eligible
/// (wrong kind, already converted, cancelled).
pub fn build_invoice_from(
    source: &Document,
    target_id: DocumentId,
    now: DateTime<Utc>,
) -> DomainResult<Document> {
    if !source.kind().is_convertible() {
        return Err(DomainError::invariant("invoices cannot be converted"));
    }
    if source.converted_to().is_some() {
        return Err(DomainError::conflict("document is already converted"));
    }
    if !source.can_convert() {
        return Err(DomainError::invariant(
            "only draft or sent documents can be converted",
        ));
    }

    let mut invoice = Document::new(
        target_id,
        DocumentKind::Invoice,
        source.customer_id(),
        source.contact_phone(),
        conversion_shipping(source),
        now,
    )?;

    // Deep copy: new line-item identities, same product/quantity/price.
    for item in source.line_items() {
        let copy = LineItem::new(
            LineItemId::new(EntityId::new()),
            item.product_id(),
            item.quantity(),
            item.unit_price(),
        )?;
        invoice.upsert_line_item(copy);
    }

    invoice.set_converted_from(source.id_typed())?;
    invoice.recompute_totals();
    Ok(invoice)
}
