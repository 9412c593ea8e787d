//! Caller-facing document operations.
//!
//! `DocumentService` wires the number generator, the line-item bookkeeping
//! and the conversion workflow onto a [`DocumentStore`], and owns the
//! serialization discipline: number assignment is mutually exclusive per kind
//! prefix, and every read-modify-write against one document is mutually
//! exclusive per document id. Duplicate-number conflicts from the store are
//! retried with the next candidate a bounded number of times.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use shopledger_core::{DomainError, DomainResult, EntityId};
use shopledger_parties::{PartyId, PartyStore, PartyStoreError};
use shopledger_products::{Catalog, CatalogError, ProductId};

use crate::convert::build_invoice_from;
use crate::document::{Document, DocumentId, DocumentKind, LineItem, LineItemId};
use crate::numbering::{next_number, NUMBER_WIDTH};
use crate::store::{DocumentStore, DocumentStoreError};

/// Attempts at minting a unique number before surfacing the conflict.
const MAX_NUMBER_ATTEMPTS: usize = 5;

/// Registry of keyed mutexes (one per prefix, one per document).
struct LockMap<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> LockMap<K> {
    fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Handle for the mutex guarding `key`, created on first use.
    fn handle(&self, key: K) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key).or_default().clone()
    }
}

fn store_err(err: DocumentStoreError) -> DomainError {
    match err {
        DocumentStoreError::NotFound(_) => DomainError::NotFound,
        DocumentStoreError::AlreadyExists(id) => {
            DomainError::conflict(format!("document already exists: {id}"))
        }
        DocumentStoreError::DuplicateNumber(number) => {
            DomainError::conflict(format!("duplicate document number: {number}"))
        }
        DocumentStoreError::NumberChanged(id) => {
            DomainError::invariant(format!("document number is immutable: {id}"))
        }
        DocumentStoreError::Storage(msg) => DomainError::invariant(format!("storage error: {msg}")),
    }
}

fn party_err(err: PartyStoreError) -> DomainError {
    match err {
        PartyStoreError::NotFound(_) => DomainError::NotFound,
        other => DomainError::invariant(other.to_string()),
    }
}

fn catalog_err(err: CatalogError) -> DomainError {
    match err {
        CatalogError::NotFound(_) => DomainError::NotFound,
        other => DomainError::invariant(other.to_string()),
    }
}

/// Document operations over a store, a catalog and a party registry.
pub struct DocumentService<S> {
    store: Arc<S>,
    catalog: Arc<dyn Catalog>,
    parties: Arc<dyn PartyStore>,
    prefix_locks: LockMap<&'static str>,
    document_locks: LockMap<DocumentId>,
}

impl<S: DocumentStore> DocumentService<S> {
    pub fn new(store: Arc<S>, catalog: Arc<dyn Catalog>, parties: Arc<dyn PartyStore>) -> Self {
        Self {
            store,
            catalog,
            parties,
            prefix_locks: LockMap::new(),
            document_locks: LockMap::new(),
        }
    }

    fn fetch(&self, id: DocumentId) -> DomainResult<Document> {
        self.store
            .get(id)
            .map_err(store_err)?
            .ok_or(DomainError::NotFound)
    }

    /// Number a fresh document and persist it.
    ///
    /// Holds the prefix lock across read-highest / format / insert so two
    /// concurrent creations cannot both read the same highest number. The
    /// store's uniqueness check is the safety net; on a duplicate, the next
    /// candidate in the sequence is tried up to [`MAX_NUMBER_ATTEMPTS`] times.
    fn assign_number_and_insert(&self, document: Document) -> DomainResult<Document> {
        let prefix = document.kind().number_prefix();
        let handle = self.prefix_locks.handle(prefix);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let mut last = self
            .store
            .numbers_with_prefix(prefix)
            .map_err(store_err)?
            .into_iter()
            .next();

        for attempt in 1..=MAX_NUMBER_ATTEMPTS {
            let candidate = next_number(prefix, NUMBER_WIDTH, last.as_deref());
            let mut numbered = document.clone();
            numbered.assign_number(candidate.as_str())?;

            match self.store.insert(numbered.clone()) {
                Ok(()) => {
                    debug!(number = %candidate, attempt, "assigned document number");
                    return Ok(numbered);
                }
                Err(DocumentStoreError::DuplicateNumber(_)) => {
                    warn!(number = %candidate, attempt, "document number taken, retrying");
                    last = Some(candidate);
                }
                Err(err) => return Err(store_err(err)),
            }
        }

        Err(DomainError::invariant(format!(
            "could not assign a unique document number for prefix '{prefix}' \
             after {MAX_NUMBER_ATTEMPTS} attempts"
        )))
    }

    /// Create a numbered draft document for a customer.
    ///
    /// The contact phone falls back to the customer's phone on file when not
    /// supplied.
    pub fn create_document(
        &self,
        kind: DocumentKind,
        customer_id: PartyId,
        contact_phone: Option<String>,
        shipping_cost: Decimal,
    ) -> DomainResult<Document> {
        let customer = self
            .parties
            .get(customer_id)
            .map_err(party_err)?
            .ok_or(DomainError::NotFound)?;
        if !customer.can_transact() {
            return Err(DomainError::validation(
                "customer is suspended and cannot transact",
            ));
        }

        let contact_phone = contact_phone
            .filter(|phone| !phone.trim().is_empty())
            .or_else(|| customer.contact().phone.clone())
            .unwrap_or_default();

        let document = Document::new(
            DocumentId::new(EntityId::new()),
            kind,
            customer_id,
            contact_phone,
            shipping_cost,
            Utc::now(),
        )?;
        let document = self.assign_number_and_insert(document)?;

        info!(
            id = %document.id_typed(),
            number = document.number().unwrap_or(""),
            kind = ?kind,
            "document created"
        );
        Ok(document)
    }

    pub fn document(&self, id: DocumentId) -> DomainResult<Document> {
        self.fetch(id)
    }

    pub fn documents_of_kind(&self, kind: DocumentKind) -> DomainResult<Vec<Document>> {
        self.store.list_by_kind(kind).map_err(store_err)
    }

    /// Add a line item; the unit price defaults to the catalog price when
    /// absent or zero. Totals are recomputed in the same critical section.
    pub fn add_line_item(
        &self,
        document_id: DocumentId,
        product_id: ProductId,
        quantity: Decimal,
        unit_price: Option<Decimal>,
    ) -> DomainResult<LineItem> {
        let handle = self.document_locks.handle(document_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let mut document = self.fetch(document_id)?;
        let product = self
            .catalog
            .product(product_id)
            .map_err(catalog_err)?
            .ok_or(DomainError::NotFound)?;

        let unit_price = match unit_price {
            Some(price) if !price.is_zero() => price,
            _ => product.unit_price(),
        };

        let item = LineItem::new(
            LineItemId::new(EntityId::new()),
            product_id,
            quantity,
            unit_price,
        )?;
        document.upsert_line_item(item.clone());
        self.store.update(&document).map_err(store_err)?;

        debug!(
            document = %document_id,
            line_item = %item.id_typed(),
            subtotal = %document.subtotal(),
            "line item added"
        );
        Ok(item)
    }

    /// Re-price or re-quantify an existing line item.
    pub fn update_line_item(
        &self,
        document_id: DocumentId,
        line_item_id: LineItemId,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> DomainResult<LineItem> {
        let handle = self.document_locks.handle(document_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let mut document = self.fetch(document_id)?;
        let existing = document
            .line_item(line_item_id)
            .ok_or(DomainError::NotFound)?;

        let item = LineItem::new(line_item_id, existing.product_id(), quantity, unit_price)?;
        document.upsert_line_item(item.clone());
        self.store.update(&document).map_err(store_err)?;
        Ok(item)
    }

    pub fn remove_line_item(
        &self,
        document_id: DocumentId,
        line_item_id: LineItemId,
    ) -> DomainResult<()> {
        let handle = self.document_locks.handle(document_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let mut document = self.fetch(document_id)?;
        document.remove_line_item(line_item_id)?;
        self.store.update(&document).map_err(store_err)?;

        debug!(
            document = %document_id,
            line_item = %line_item_id,
            subtotal = %document.subtotal(),
            "line item removed"
        );
        Ok(())
    }

    pub fn set_shipping_cost(
        &self,
        document_id: DocumentId,
        shipping_cost: Decimal,
    ) -> DomainResult<Document> {
        let handle = self.document_locks.handle(document_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let mut document = self.fetch(document_id)?;
        document.set_shipping_cost(shipping_cost)?;
        self.store.update(&document).map_err(store_err)?;
        Ok(document)
    }

    pub fn mark_sent(&self, document_id: DocumentId) -> DomainResult<Document> {
        let handle = self.document_locks.handle(document_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let mut document = self.fetch(document_id)?;
        document.mark_sent()?;
        self.store.update(&document).map_err(store_err)?;
        Ok(document)
    }

    /// Settle a document (`Paid` / `Delivered` per kind).
    pub fn mark_fulfilled(&self, document_id: DocumentId) -> DomainResult<Document> {
        let handle = self.document_locks.handle(document_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let mut document = self.fetch(document_id)?;
        document.mark_fulfilled()?;
        self.store.update(&document).map_err(store_err)?;
        Ok(document)
    }

    pub fn cancel_document(&self, document_id: DocumentId) -> DomainResult<Document> {
        let handle = self.document_locks.handle(document_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let mut document = self.fetch(document_id)?;
        document.cancel()?;
        self.store.update(&document).map_err(store_err)?;
        Ok(document)
    }

    /// Convert a proforma or delivery into a freshly numbered invoice.
    ///
    /// Idempotent: a source that is already converted hands back its existing
    /// target instead of erroring. The source lock makes the check-and-set of
    /// the conversion link atomic, so concurrent conversions produce exactly
    /// one target. If stamping the source fails after the target was
    /// persisted, the target is removed again — no dangling link survives.
    pub fn convert_document(&self, document_id: DocumentId) -> DomainResult<Document> {
        let handle = self.document_locks.handle(document_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let mut source = self.fetch(document_id)?;

        if let Some(target_id) = source.converted_to() {
            debug!(source = %document_id, target = %target_id, "document already converted");
            return self
                .store
                .get(target_id)
                .map_err(store_err)?
                .ok_or_else(|| {
                    DomainError::invariant("conversion link points at a missing document")
                });
        }

        let target = build_invoice_from(&source, DocumentId::new(EntityId::new()), Utc::now())?;
        let target = self.assign_number_and_insert(target)?;

        source.mark_converted(target.id_typed())?;
        if let Err(err) = self.store.update(&source) {
            let _ = self.store.remove(target.id_typed());
            return Err(store_err(err));
        }

        info!(
            source = %document_id,
            target = %target.id_typed(),
            number = target.number().unwrap_or(""),
            "document converted to invoice"
        );
        Ok(target)
    }

    /// Delete a document together with its owned line items.
    pub fn remove_document(&self, document_id: DocumentId) -> DomainResult<()> {
        let handle = self.document_locks.handle(document_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        self.store.remove(document_id).map_err(store_err)?;
        Ok(())
    }
}
