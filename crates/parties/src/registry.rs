//! Party registry: storage abstraction + in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::party::{Party, PartyId, PartyKind};

/// Maximum number of hits returned by a name search.
const SEARCH_LIMIT: usize = 10;

/// Party store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PartyStoreError {
    #[error("party not found: {0}")]
    NotFound(PartyId),
    #[error("party already exists: {0}")]
    AlreadyExists(PartyId),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Party store abstraction.
pub trait PartyStore: Send + Sync {
    /// Register a new party.
    fn insert(&self, party: Party) -> Result<PartyId, PartyStoreError>;

    /// Get a party by id.
    fn get(&self, id: PartyId) -> Result<Option<Party>, PartyStoreError>;

    /// Replace an existing party.
    fn update(&self, party: &Party) -> Result<(), PartyStoreError>;

    /// Delete a party.
    fn remove(&self, id: PartyId) -> Result<(), PartyStoreError>;

    /// Case-insensitive substring search on party name, capped at 10 hits,
    /// optionally restricted to one kind. Hits are sorted by name.
    fn search(&self, query: &str, kind: Option<PartyKind>)
        -> Result<Vec<Party>, PartyStoreError>;
}

/// In-memory party store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryPartyStore {
    parties: RwLock<HashMap<PartyId, Party>>,
}

impl InMemoryPartyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl PartyStore for InMemoryPartyStore {
    fn insert(&self, party: Party) -> Result<PartyId, PartyStoreError> {
        let mut parties = self
            .parties
            .write()
            .map_err(|_| PartyStoreError::Storage("lock poisoned".to_string()))?;
        let id = party.id_typed();
        if parties.contains_key(&id) {
            return Err(PartyStoreError::AlreadyExists(id));
        }
        parties.insert(id, party);
        Ok(id)
    }

    fn get(&self, id: PartyId) -> Result<Option<Party>, PartyStoreError> {
        let parties = self
            .parties
            .read()
            .map_err(|_| PartyStoreError::Storage("lock poisoned".to_string()))?;
        Ok(parties.get(&id).cloned())
    }

    fn update(&self, party: &Party) -> Result<(), PartyStoreError> {
        let mut parties = self
            .parties
            .write()
            .map_err(|_| PartyStoreError::Storage("lock poisoned".to_string()))?;
        let id = party.id_typed();
        if !parties.contains_key(&id) {
            return Err(PartyStoreError::NotFound(id));
        }
        parties.insert(id, party.clone());
        Ok(())
    }

    fn remove(&self, id: PartyId) -> Result<(), PartyStoreError> {
        let mut parties = self
            .parties
            .write()
            .map_err(|_| PartyStoreError::Storage("lock poisoned".to_string()))?;
        parties.remove(&id).ok_or(PartyStoreError::NotFound(id))?;
        Ok(())
    }

    fn search(
        &self,
        query: &str,
        kind: Option<PartyKind>,
    ) -> Result<Vec<Party>, PartyStoreError> {
        let parties = self
            .parties
            .read()
            .map_err(|_| PartyStoreError::Storage("lock poisoned".to_string()))?;

        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<Party> = parties
            .values()
            .filter(|p| kind.is_none_or(|k| p.kind() == k))
            .filter(|p| p.name().to_lowercase().contains(&needle))
            .cloned()
            .collect();

        hits.sort_by(|a, b| a.name().cmp(b.name()));
        hits.truncate(SEARCH_LIMIT);
        Ok(hits)
    }
}

/// Convenience: look up the phone number on file for a party, if any.
pub fn phone_on_file(
    store: &dyn PartyStore,
    id: PartyId,
) -> Result<Option<String>, PartyStoreError> {
    Ok(store.get(id)?.and_then(|p| p.contact().phone.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopledger_core::EntityId;

    use crate::party::ContactInfo;

    fn customer(name: &str, phone: Option<&str>) -> Party {
        Party::new(
            PartyId::new(EntityId::new()),
            PartyKind::Customer,
            name,
            ContactInfo {
                phone: phone.map(str::to_string),
                ..ContactInfo::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn insert_get_update_remove() {
        let store = InMemoryPartyStore::new();
        let mut party = customer("Jane Doe", Some("+255700000001"));
        let id = store.insert(party.clone()).unwrap();

        assert_eq!(store.get(id).unwrap().unwrap().name(), "Jane Doe");

        party.suspend().unwrap();
        store.update(&party).unwrap();
        assert!(!store.get(id).unwrap().unwrap().can_transact());

        store.remove(id).unwrap();
        assert!(store.get(id).unwrap().is_none());
        assert!(matches!(store.remove(id), Err(PartyStoreError::NotFound(_))));
    }

    #[test]
    fn search_is_case_insensitive_and_capped() {
        let store = InMemoryPartyStore::new();
        for i in 0..15 {
            store.insert(customer(&format!("Customer {i}"), None)).unwrap();
        }
        store.insert(customer("Jane Doe", None)).unwrap();

        let hits = store.search("jane", None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name(), "Jane Doe");

        let hits = store.search("customer", None).unwrap();
        assert_eq!(hits.len(), 10);
    }

    #[test]
    fn search_can_filter_by_kind() {
        let store = InMemoryPartyStore::new();
        store.insert(customer("Acme Person", None)).unwrap();
        store
            .insert(
                Party::new(
                    PartyId::new(EntityId::new()),
                    PartyKind::Vendor,
                    "Acme Supplies",
                    ContactInfo::default(),
                )
                .unwrap(),
            )
            .unwrap();

        let hits = store.search("acme", Some(PartyKind::Vendor)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind(), PartyKind::Vendor);
    }

    #[test]
    fn blank_query_returns_nothing() {
        let store = InMemoryPartyStore::new();
        store.insert(customer("Jane Doe", None)).unwrap();
        assert!(store.search("   ", None).unwrap().is_empty());
    }

    #[test]
    fn phone_on_file_reads_contact() {
        let store = InMemoryPartyStore::new();
        let id = store.insert(customer("Jane Doe", Some("+255700000001"))).unwrap();
        assert_eq!(
            phone_on_file(&store, id).unwrap().as_deref(),
            Some("+255700000001")
        );
    }
}
