use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopledger_core::{round2, DomainError, DomainResult, Entity, EntityId};
use shopledger_parties::PartyId;
use shopledger_products::ProductId;

/// Document identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub EntityId);

impl DocumentId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Line item identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(pub EntityId);

impl LineItemId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LineItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Document kind: invoice, proforma invoice, or delivery note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Invoice,
    Proforma,
    Delivery,
}

impl DocumentKind {
    /// Prefix partitioning the numbering sequence for this kind.
    pub fn number_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "I",
            DocumentKind::Proforma => "P",
            DocumentKind::Delivery => "DL",
        }
    }

    /// Whether documents of this kind can be converted into an invoice.
    pub fn is_convertible(&self) -> bool {
        matches!(self, DocumentKind::Proforma | DocumentKind::Delivery)
    }

    /// Terminal status a source document takes once converted.
    pub fn converted_status(&self) -> DocumentStatus {
        match self {
            DocumentKind::Proforma => DocumentStatus::Paid,
            DocumentKind::Delivery => DocumentStatus::Delivered,
            DocumentKind::Invoice => DocumentStatus::Paid,
        }
    }
}

/// Document status lifecycle.
///
/// `Paid` is the settled state for invoices and the consumed state for
/// proformas; `Delivered` is the consumed state for delivery notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Draft,
    Sent,
    Paid,
    Delivered,
    Cancelled,
}

impl DocumentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DocumentStatus::Paid | DocumentStatus::Delivered | DocumentStatus::Cancelled
        )
    }
}

/// One product/quantity/price row of a document.
///
/// `line_total` is derived (`round2(quantity * unit_price)`) and never set by
/// callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    id: LineItemId,
    product_id: ProductId,
    quantity: Decimal,
    unit_price: Decimal,
    line_total: Decimal,
}

impl LineItem {
    pub fn new(
        id: LineItemId,
        product_id: ProductId,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> DomainResult<Self> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::validation("line item quantity must be positive"));
        }
        if unit_price < Decimal::ZERO {
            return Err(DomainError::validation(
                "line item unit price cannot be negative",
            ));
        }

        Ok(Self {
            id,
            product_id,
            quantity,
            unit_price,
            line_total: round2(quantity * unit_price),
        })
    }

    pub fn id_typed(&self) -> LineItemId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn line_total(&self) -> Decimal {
        self.line_total
    }
}

impl Entity for LineItem {
    type Id = LineItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Entity: a numbered, totals-bearing business document (invoice, proforma
/// invoice, or delivery note) that exclusively owns its line items.
///
/// `subtotal` and `grand_total` are derived: every mutating method ends with
/// an explicit [`Document::recompute_totals`] call, so the stored totals are
/// never stale relative to the owned line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    id: DocumentId,
    kind: DocumentKind,
    status: DocumentStatus,
    number: Option<String>,
    customer_id: PartyId,
    contact_phone: String,
    shipping_cost: Decimal,
    subtotal: Decimal,
    grand_total: Decimal,
    converted_to: Option<DocumentId>,
    converted_from: Option<DocumentId>,
    line_items: Vec<LineItem>,
    created_at: DateTime<Utc>,
}

impl Document {
    /// Create a draft document: no number yet, no line items, zero subtotal.
    pub fn new(
        id: DocumentId,
        kind: DocumentKind,
        customer_id: PartyId,
        contact_phone: impl Into<String>,
        shipping_cost: Decimal,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if shipping_cost < Decimal::ZERO {
            return Err(DomainError::validation("shipping cost cannot be negative"));
        }

        let mut document = Self {
            id,
            kind,
            status: DocumentStatus::Draft,
            number: None,
            customer_id,
            contact_phone: contact_phone.into(),
            shipping_cost,
            subtotal: Decimal::ZERO,
            grand_total: Decimal::ZERO,
            converted_to: None,
            converted_from: None,
            line_items: Vec::new(),
            created_at,
        };
        document.recompute_totals();
        Ok(document)
    }

    pub fn id_typed(&self) -> DocumentId {
        self.id
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn number(&self) -> Option<&str> {
        self.number.as_deref()
    }

    pub fn customer_id(&self) -> PartyId {
        self.customer_id
    }

    pub fn contact_phone(&self) -> &str {
        &self.contact_phone
    }

    pub fn shipping_cost(&self) -> Decimal {
        self.shipping_cost
    }

    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    pub fn grand_total(&self) -> Decimal {
        self.grand_total
    }

    pub fn converted_to(&self) -> Option<DocumentId> {
        self.converted_to
    }

    pub fn converted_from(&self) -> Option<DocumentId> {
        self.converted_from
    }

    /// Line items in insertion order.
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn line_item(&self, id: LineItemId) -> Option<&LineItem> {
        self.line_items.iter().find(|item| item.id_typed() == id)
    }

    /// Invariant: a number is assigned exactly once and never reassigned.
    pub fn assign_number(&mut self, number: impl Into<String>) -> DomainResult<()> {
        if self.number.is_some() {
            return Err(DomainError::invariant(
                "document number is immutable once assigned",
            ));
        }
        self.number = Some(number.into());
        Ok(())
    }

    /// Insert a line item, or replace the item with the same id.
    pub fn upsert_line_item(&mut self, item: LineItem) {
        match self
            .line_items
            .iter_mut()
            .find(|existing| existing.id_typed() == item.id_typed())
        {
            Some(existing) => *existing = item,
            None => self.line_items.push(item),
        }
        self.recompute_totals();
    }

    pub fn remove_line_item(&mut self, id: LineItemId) -> DomainResult<LineItem> {
        let index = self
            .line_items
            .iter()
            .position(|item| item.id_typed() == id)
            .ok_or(DomainError::NotFound)?;
        let removed = self.line_items.remove(index);
        self.recompute_totals();
        Ok(removed)
    }

    pub fn set_shipping_cost(&mut self, shipping_cost: Decimal) -> DomainResult<()> {
        if shipping_cost < Decimal::ZERO {
            return Err(DomainError::validation("shipping cost cannot be negative"));
        }
        self.shipping_cost = shipping_cost;
        self.recompute_totals();
        Ok(())
    }

    /// Re-derive `subtotal` and `grand_total` from the owned line items.
    ///
    /// Idempotent; touches only the two total fields and never cascades back
    /// into line-item state. A document with no line items gets
    /// `subtotal = 0` and `grand_total = shipping_cost`.
    pub fn recompute_totals(&mut self) {
        let items_total: Decimal = self.line_items.iter().map(LineItem::line_total).sum();
        self.subtotal = round2(items_total);
        self.grand_total = round2(self.subtotal + self.shipping_cost);
    }

    pub fn mark_sent(&mut self) -> DomainResult<()> {
        match self.status {
            DocumentStatus::Draft => {
                self.status = DocumentStatus::Sent;
                Ok(())
            }
            DocumentStatus::Sent => Err(DomainError::conflict("document is already sent")),
            _ => Err(DomainError::invariant(
                "only draft documents can be marked sent",
            )),
        }
    }

    /// Settle the document: `Paid` for invoices and proformas, `Delivered`
    /// for delivery notes.
    pub fn mark_fulfilled(&mut self) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::conflict("document is already settled"));
        }
        self.status = self.kind.converted_status();
        Ok(())
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        if self.converted_to.is_some() {
            return Err(DomainError::invariant(
                "converted documents cannot be cancelled",
            ));
        }
        if self.status == DocumentStatus::Cancelled {
            return Err(DomainError::conflict("document is already cancelled"));
        }
        if self.status.is_terminal() {
            return Err(DomainError::invariant(
                "settled documents cannot be cancelled",
            ));
        }
        self.status = DocumentStatus::Cancelled;
        Ok(())
    }

    /// Whether this document is currently eligible to convert into an invoice.
    pub fn can_convert(&self) -> bool {
        self.kind.is_convertible()
            && self.converted_to.is_none()
            && matches!(self.status, DocumentStatus::Draft | DocumentStatus::Sent)
    }

    /// Stamp the forward conversion link and move to the terminal status.
    ///
    /// Invariant: the link, once set, is immutable.
    pub fn mark_converted(&mut self, target: DocumentId) -> DomainResult<()> {
        if self.converted_to.is_some() {
            return Err(DomainError::conflict("document is already converted"));
        }
        if !self.kind.is_convertible() {
            return Err(DomainError::invariant("invoices cannot be converted"));
        }
        self.converted_to = Some(target);
        self.status = self.kind.converted_status();
        Ok(())
    }

    /// Stamp the backward conversion link on a freshly created target.
    pub fn set_converted_from(&mut self, source: DocumentId) -> DomainResult<()> {
        if self.converted_from.is_some() {
            return Err(DomainError::invariant(
                "document already has a conversion source",
            ));
        }
        self.converted_from = Some(source);
        Ok(())
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Document {
    type Id = DocumentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
