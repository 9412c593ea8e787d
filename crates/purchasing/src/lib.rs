//! Purchasing domain module.
//!
//! Vendor purchases with a pending→delivered lifecycle. Stock lands in the
//! catalog explicitly at the delivered transition (see
//! [`receiving::receive_purchase`]), not as a hidden save-time side effect.

pub mod purchase;
pub mod receiving;

pub use purchase::{DeliveryStatus, Purchase, PurchaseId};
pub use receiving::receive_purchase;
