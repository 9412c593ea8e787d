//! Document storage abstraction + in-memory implementation.
//!
//! The store is the only shared mutable resource in this module. It enforces
//! the `(prefix, number)` uniqueness constraint that backs number assignment;
//! the serialization of read-modify-write sequences lives in
//! [`crate::service::DocumentService`].

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::document::{Document, DocumentId, DocumentKind};

/// Document store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DocumentStoreError {
    #[error("document not found: {0}")]
    NotFound(DocumentId),
    #[error("document already exists: {0}")]
    AlreadyExists(DocumentId),
    #[error("duplicate document number: {0}")]
    DuplicateNumber(String),
    #[error("document number is immutable: {0}")]
    NumberChanged(DocumentId),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Document store abstraction.
///
/// Implementations must reject any write that would leave two documents with
/// the same number (numbers embed their kind prefix, so full-string
/// uniqueness is per-partition uniqueness).
pub trait DocumentStore: Send + Sync {
    /// Persist a new document. Rejects duplicate ids and duplicate numbers.
    fn insert(&self, document: Document) -> Result<(), DocumentStoreError>;

    /// Get a document by id.
    fn get(&self, id: DocumentId) -> Result<Option<Document>, DocumentStoreError>;

    /// Replace an existing document. An already-assigned number cannot change.
    fn update(&self, document: &Document) -> Result<(), DocumentStoreError>;

    /// Delete a document (and, by ownership, its line items), releasing its
    /// number.
    fn remove(&self, id: DocumentId) -> Result<Document, DocumentStoreError>;

    /// All assigned numbers sharing `prefix`, ordered descending.
    fn numbers_with_prefix(&self, prefix: &str) -> Result<Vec<String>, DocumentStoreError>;

    /// All documents of one kind, ordered by creation time.
    fn list_by_kind(&self, kind: DocumentKind) -> Result<Vec<Document>, DocumentStoreError>;
}

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<DocumentId, Document>,
    /// Unique index over assigned numbers (kind prefix included).
    numbers: HashSet<String>,
}

/// In-memory document store for tests/dev.
///
/// A single `RwLock` guards the documents and the number index together, so
/// the uniqueness check and the write it protects are atomic.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    inner: RwLock<Inner>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn poisoned() -> DocumentStoreError {
        DocumentStoreError::Storage("lock poisoned".to_string())
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn insert(&self, document: Document) -> Result<(), DocumentStoreError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;

        let id = document.id_typed();
        if inner.documents.contains_key(&id) {
            return Err(DocumentStoreError::AlreadyExists(id));
        }
        if let Some(number) = document.number() {
            if inner.numbers.contains(number) {
                return Err(DocumentStoreError::DuplicateNumber(number.to_string()));
            }
            inner.numbers.insert(number.to_string());
        }
        inner.documents.insert(id, document);
        Ok(())
    }

    fn get(&self, id: DocumentId) -> Result<Option<Document>, DocumentStoreError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner.documents.get(&id).cloned())
    }

    fn update(&self, document: &Document) -> Result<(), DocumentStoreError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;

        let id = document.id_typed();
        let stored_number = match inner.documents.get(&id) {
            Some(stored) => stored.number().map(str::to_string),
            None => return Err(DocumentStoreError::NotFound(id)),
        };

        match (stored_number.as_deref(), document.number()) {
            // First persist of the assigned number: index it.
            (None, Some(number)) => {
                if inner.numbers.contains(number) {
                    return Err(DocumentStoreError::DuplicateNumber(number.to_string()));
                }
                inner.numbers.insert(number.to_string());
            }
            (Some(stored), Some(new)) if stored != new => {
                return Err(DocumentStoreError::NumberChanged(id));
            }
            (Some(_), None) => {
                return Err(DocumentStoreError::NumberChanged(id));
            }
            _ => {}
        }

        inner.documents.insert(id, document.clone());
        Ok(())
    }

    fn remove(&self, id: DocumentId) -> Result<Document, DocumentStoreError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;
        let document = inner
            .documents
            .remove(&id)
            .ok_or(DocumentStoreError::NotFound(id))?;
        if let Some(number) = document.number() {
            inner.numbers.remove(number);
        }
        Ok(document)
    }

    fn numbers_with_prefix(&self, prefix: &str) -> Result<Vec<String>, DocumentStoreError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        let mut numbers: Vec<String> = inner
            .numbers
            .iter()
            .filter(|number| number.starts_with(prefix))
            .cloned()
            .collect();
        numbers.sort_by(|a, b| b.cmp(a));
        Ok(numbers)
    }

    fn list_by_kind(&self, kind: DocumentKind) -> Result<Vec<Document>, DocumentStoreError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        let mut documents: Vec<Document> = inner
            .documents
            .values()
            .filter(|document| document.kind() == kind)
            .cloned()
            .collect();
        documents.sort_by_key(Document::created_at);
        Ok(documents)
    }
}
