//! Parties domain module: customers and vendors.
//!
//! This crate contains the party entity and its registry. Documents reference
//! parties by id and default missing contact details from the registry.

pub mod party;
pub mod registry;

pub use party::{ContactInfo, Party, PartyId, PartyKind, PartyStatus};
pub use registry::{phone_on_file, InMemoryPartyStore, PartyStore, PartyStoreError};
