//! Documents domain module: invoices, proforma invoices, delivery notes.
//!
//! This crate owns the numbered-document core: sequential number assignment
//! partitioned by kind prefix, line-item bookkeeping with explicit total
//! recomputation after every mutation, and the one-way conversion of
//! proformas and deliveries into invoices. Storage is behind
//! [`DocumentStore`]; [`DocumentService`] is the caller-facing surface and
//! carries the serialization discipline (per-prefix and per-document locks,
//! bounded retry on number conflicts).

pub mod convert;
pub mod document;
pub mod numbering;
pub mod service;
pub mod store;

pub use convert::build_invoice_from;
pub use document::{
    Document, DocumentId, DocumentKind, DocumentStatus, LineItem, LineItemId,
};
pub use numbering::{next_number, NUMBER_WIDTH};
pub use service::DocumentService;
pub use store::{DocumentStore, DocumentStoreError, InMemoryDocumentStore};
