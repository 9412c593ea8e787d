//! Cross-component flows: numbering under concurrency, total consistency
//! through the service, and the conversion workflow.

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal_macros::dec;

use shopledger_core::EntityId;
use shopledger_documents::{
    DocumentKind, DocumentService, DocumentStatus, InMemoryDocumentStore,
};
use shopledger_parties::{ContactInfo, InMemoryPartyStore, Party, PartyId, PartyKind, PartyStore};
use shopledger_products::{InMemoryCatalog, Product, ProductId};

struct Fixture {
    service: Arc<DocumentService<InMemoryDocumentStore>>,
    customer_id: PartyId,
    product_id: ProductId,
}

fn setup() -> Fixture {
    shopledger_observability::init();

    let store = InMemoryDocumentStore::arc();
    let catalog = InMemoryCatalog::arc();
    let parties = InMemoryPartyStore::arc();

    let customer_id = PartyId::new(EntityId::new());
    parties
        .insert(
            Party::new(
                customer_id,
                PartyKind::Customer,
                "Jane Doe",
                ContactInfo {
                    phone: Some("+255700000001".to_string()),
                    ..ContactInfo::default()
                },
            )
            .expect("valid party"),
        )
        .expect("insert party");

    let product_id = ProductId::new(EntityId::new());
    catalog
        .insert(Product::new(product_id, "Widget", dec!(10.00), dec!(500)).expect("valid product"))
        .expect("insert product");

    Fixture {
        service: Arc::new(DocumentService::new(store, catalog, parties)),
        customer_id,
        product_id,
    }
}

#[test]
fn invoice_scenario_walkthrough() -> anyhow::Result<()> {
    let fx = setup();

    let invoice =
        fx.service
            .create_document(DocumentKind::Invoice, fx.customer_id, None, dec!(0))?;
    assert_eq!(invoice.number(), Some("I0001"));
    let id = invoice.id_typed();

    let first = fx
        .service
        .add_line_item(id, fx.product_id, dec!(3), Some(dec!(10.00)))?;
    assert_eq!(first.line_total(), dec!(30.00));
    assert_eq!(fx.service.document(id)?.subtotal(), dec!(30.00));

    fx.service.set_shipping_cost(id, dec!(5.00))?;
    assert_eq!(fx.service.document(id)?.grand_total(), dec!(35.00));

    let second = fx
        .service
        .add_line_item(id, fx.product_id, dec!(2), Some(dec!(7.50)))?;
    assert_eq!(second.line_total(), dec!(15.00));
    let stored = fx.service.document(id)?;
    assert_eq!(stored.subtotal(), dec!(45.00));
    assert_eq!(stored.grand_total(), dec!(50.00));

    fx.service.remove_line_item(id, first.id_typed())?;
    let stored = fx.service.document(id)?;
    assert_eq!(stored.subtotal(), dec!(15.00));
    assert_eq!(stored.grand_total(), dec!(20.00));

    Ok(())
}

#[test]
fn delivery_conversion_scenario_walkthrough() -> anyhow::Result<()> {
    let fx = setup();

    let delivery =
        fx.service
            .create_document(DocumentKind::Delivery, fx.customer_id, None, dec!(7.00))?;
    let id = delivery.id_typed();
    fx.service
        .add_line_item(id, fx.product_id, dec!(3), Some(dec!(10.00)))?;
    fx.service
        .add_line_item(id, fx.product_id, dec!(2), Some(dec!(7.50)))?;

    let invoice = fx.service.convert_document(id)?;

    assert_eq!(invoice.kind(), DocumentKind::Invoice);
    assert_eq!(invoice.number(), Some("I0001"));
    assert_eq!(invoice.line_items().len(), 2);
    assert_eq!(invoice.shipping_cost(), dec!(0));
    assert_eq!(invoice.subtotal(), dec!(45.00));
    assert_eq!(invoice.grand_total(), dec!(45.00));

    let source = fx.service.document(id)?;
    assert_eq!(source.status(), DocumentStatus::Delivered);
    assert_eq!(source.converted_to(), Some(invoice.id_typed()));

    // The copies carry fresh identities.
    for (copy, original) in invoice.line_items().iter().zip(source.line_items()) {
        assert_ne!(copy.id_typed(), original.id_typed());
        assert_eq!(copy.quantity(), original.quantity());
        assert_eq!(copy.unit_price(), original.unit_price());
    }

    Ok(())
}

#[test]
fn proforma_conversion_keeps_shipping() -> anyhow::Result<()> {
    let fx = setup();

    let proforma =
        fx.service
            .create_document(DocumentKind::Proforma, fx.customer_id, None, dec!(4.50))?;
    assert_eq!(proforma.number(), Some("P0001"));
    let id = proforma.id_typed();
    fx.service.add_line_item(id, fx.product_id, dec!(1), None)?;

    let invoice = fx.service.convert_document(id)?;
    assert_eq!(invoice.shipping_cost(), dec!(4.50));
    assert_eq!(invoice.grand_total(), dec!(14.50));
    assert_eq!(fx.service.document(id)?.status(), DocumentStatus::Paid);

    Ok(())
}

/// Running N concurrent creations for the same kind yields N distinct numbers.
#[test]
fn concurrent_creations_get_distinct_numbers() {
    let fx = setup();
    let threads: usize = 8;
    let per_thread: usize = 5;

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let service = Arc::clone(&fx.service);
            let customer_id = fx.customer_id;
            std::thread::spawn(move || {
                (0..per_thread)
                    .map(|_| {
                        service
                            .create_document(DocumentKind::Invoice, customer_id, None, dec!(0))
                            .expect("create document")
                            .number()
                            .expect("number assigned")
                            .to_string()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.extend(handle.join().expect("thread panicked"));
    }

    let distinct: HashSet<_> = numbers.iter().cloned().collect();
    assert_eq!(distinct.len(), threads * per_thread);

    let invoices = fx
        .service
        .documents_of_kind(DocumentKind::Invoice)
        .expect("list invoices");
    assert_eq!(invoices.len(), threads * per_thread);
}

/// Concurrent conversions of one source produce exactly one target.
#[test]
fn concurrent_conversions_produce_one_target() {
    let fx = setup();

    let delivery = fx
        .service
        .create_document(DocumentKind::Delivery, fx.customer_id, None, dec!(0))
        .expect("create delivery");
    let id = delivery.id_typed();
    fx.service
        .add_line_item(id, fx.product_id, dec!(2), None)
        .expect("add line item");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&fx.service);
            std::thread::spawn(move || {
                service
                    .convert_document(id)
                    .expect("convert document")
                    .id_typed()
            })
        })
        .collect();

    let targets: HashSet<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread panicked"))
        .collect();

    assert_eq!(targets.len(), 1);
    assert_eq!(
        fx.service
            .documents_of_kind(DocumentKind::Invoice)
            .expect("list invoices")
            .len(),
        1
    );
}

/// Concurrent line-item mutations never lose an update: the recompute step is
/// serialized per document.
#[test]
fn concurrent_line_item_mutations_keep_totals_consistent() {
    let fx = setup();

    let invoice = fx
        .service
        .create_document(DocumentKind::Invoice, fx.customer_id, None, dec!(5.00))
        .expect("create invoice");
    let id = invoice.id_typed();

    let threads: usize = 4;
    let per_thread: usize = 10;
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let service = Arc::clone(&fx.service);
            let product_id = fx.product_id;
            std::thread::spawn(move || {
                for _ in 0..per_thread {
                    service
                        .add_line_item(id, product_id, dec!(1), Some(dec!(2.50)))
                        .expect("add line item");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread panicked");
    }

    let stored = fx.service.document(id).expect("fetch invoice");
    assert_eq!(stored.line_items().len(), threads * per_thread);
    assert_eq!(stored.subtotal(), dec!(100.00));
    assert_eq!(stored.grand_total(), dec!(105.00));
}

/// A document with no line items keeps `subtotal = 0`,
/// `grand_total = shipping`.
#[test]
fn zero_item_document_totals() -> anyhow::Result<()> {
    let fx = setup();

    let invoice =
        fx.service
            .create_document(DocumentKind::Invoice, fx.customer_id, None, dec!(5.00))?;
    assert_eq!(invoice.subtotal(), dec!(0));
    assert_eq!(invoice.grand_total(), dec!(5.00));

    Ok(())
}
