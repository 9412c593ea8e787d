use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopledger_core::{round2, DomainError, DomainResult, Entity, EntityId};
use shopledger_parties::PartyId;
use shopledger_products::ProductId;

/// Purchase identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseId(pub EntityId);

impl PurchaseId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Delivery status lifecycle of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Successful,
}

/// Entity: a purchase of one product from a vendor.
///
/// `total_value` is derived (`round2(unit_price * quantity)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    id: PurchaseId,
    product_id: ProductId,
    vendor_id: PartyId,
    description: Option<String>,
    quantity: u32,
    unit_price: Decimal,
    total_value: Decimal,
    delivery_status: DeliveryStatus,
    order_date: DateTime<Utc>,
    delivery_date: Option<DateTime<Utc>>,
}

impl Purchase {
    pub fn new(
        id: PurchaseId,
        product_id: ProductId,
        vendor_id: PartyId,
        description: Option<String>,
        quantity: u32,
        unit_price: Decimal,
        order_date: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("purchase quantity must be positive"));
        }
        if unit_price < Decimal::ZERO {
            return Err(DomainError::validation(
                "purchase unit price cannot be negative",
            ));
        }

        Ok(Self {
            id,
            product_id,
            vendor_id,
            description,
            quantity,
            unit_price,
            total_value: round2(unit_price * Decimal::from(quantity)),
            delivery_status: DeliveryStatus::Pending,
            order_date,
            delivery_date: None,
        })
    }

    pub fn id_typed(&self) -> PurchaseId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn vendor_id(&self) -> PartyId {
        self.vendor_id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn total_value(&self) -> Decimal {
        self.total_value
    }

    pub fn delivery_status(&self) -> DeliveryStatus {
        self.delivery_status
    }

    pub fn order_date(&self) -> DateTime<Utc> {
        self.order_date
    }

    pub fn delivery_date(&self) -> Option<DateTime<Utc>> {
        self.delivery_date
    }

    pub fn is_delivered(&self) -> bool {
        self.delivery_status == DeliveryStatus::Successful
    }

    /// Transition Pending → Successful, stamping the delivery date.
    pub fn mark_delivered(&mut self, delivery_date: DateTime<Utc>) -> DomainResult<()> {
        if self.is_delivered() {
            return Err(DomainError::conflict("purchase is already delivered"));
        }
        self.delivery_status = DeliveryStatus::Successful;
        self.delivery_date = Some(delivery_date);
        Ok(())
    }
}

impl Entity for Purchase {
    type Id = PurchaseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_purchase(quantity: u32, unit_price: Decimal) -> DomainResult<Purchase> {
        Purchase::new(
            PurchaseId::new(EntityId::new()),
            ProductId::new(EntityId::new()),
            PartyId::new(EntityId::new()),
            Some("restock".to_string()),
            quantity,
            unit_price,
            Utc::now(),
        )
    }

    #[test]
    fn total_value_is_derived() {
        let purchase = test_purchase(12, dec!(3.25)).unwrap();
        assert_eq!(purchase.total_value(), dec!(39.00));
        assert_eq!(purchase.delivery_status(), DeliveryStatus::Pending);
        assert!(purchase.delivery_date().is_none());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = test_purchase(0, dec!(3.25)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = test_purchase(1, dec!(-0.01)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn mark_delivered_stamps_date_once() {
        let mut purchase = test_purchase(1, dec!(5)).unwrap();
        let delivered_at = Utc::now();
        purchase.mark_delivered(delivered_at).unwrap();

        assert!(purchase.is_delivered());
        assert_eq!(purchase.delivery_date(), Some(delivered_at));

        let err = purchase.mark_delivered(Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }
}
