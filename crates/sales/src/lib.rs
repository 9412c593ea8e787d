//! Sales transactions domain module.
//!
//! This crate contains business rules for point-of-sale transactions,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage). Tax rates come from a [`TaxRateSource`]; a static fallback table
//! stands in when no live source is reachable.

pub mod sale;
pub mod tax;

pub use sale::{Sale, SaleDetail, SaleId};
pub use tax::{resolve_rate, FallbackRates, TaxRateSource};
