use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopledger_core::{round2, DomainError, DomainResult, Entity, EntityId};
use shopledger_parties::PartyId;
use shopledger_products::ProductId;

/// Sale identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleId(pub EntityId);

impl SaleId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SaleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Detail row: product, unit price, quantity.
///
/// `total_detail` is derived (`round2(unit_price * quantity)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDetail {
    line_no: u32,
    product_id: ProductId,
    unit_price: Decimal,
    quantity: u32,
    total_detail: Decimal,
}

impl SaleDetail {
    pub fn line_no(&self) -> u32 {
        self.line_no
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn total_detail(&self) -> Decimal {
        self.total_detail
    }
}

/// Entity: a point-of-sale transaction with owned detail rows.
///
/// `sub_total`, `tax_amount`, `grand_total` and `amount_change` are all
/// derived; every mutation ends with an explicit recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    id: SaleId,
    customer_id: PartyId,
    details: Vec<SaleDetail>,
    sub_total: Decimal,
    tax_percentage: Decimal,
    tax_amount: Decimal,
    grand_total: Decimal,
    amount_paid: Decimal,
    amount_change: Decimal,
    created_at: DateTime<Utc>,
}

impl Sale {
    pub fn new(
        id: SaleId,
        customer_id: PartyId,
        amount_paid: Decimal,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if amount_paid < Decimal::ZERO {
            return Err(DomainError::validation("amount paid cannot be negative"));
        }

        Ok(Self {
            id,
            customer_id,
            details: Vec::new(),
            sub_total: Decimal::ZERO,
            tax_percentage: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            grand_total: Decimal::ZERO,
            amount_paid,
            amount_change: amount_paid,
            created_at,
        })
    }

    pub fn id_typed(&self) -> SaleId {
        self.id
    }

    pub fn customer_id(&self) -> PartyId {
        self.customer_id
    }

    pub fn details(&self) -> &[SaleDetail] {
        &self.details
    }

    pub fn sub_total(&self) -> Decimal {
        self.sub_total
    }

    pub fn tax_percentage(&self) -> Decimal {
        self.tax_percentage
    }

    pub fn tax_amount(&self) -> Decimal {
        self.tax_amount
    }

    pub fn grand_total(&self) -> Decimal {
        self.grand_total
    }

    pub fn amount_paid(&self) -> Decimal {
        self.amount_paid
    }

    pub fn amount_change(&self) -> Decimal {
        self.amount_change
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Total quantity of products across all detail rows.
    pub fn sum_products(&self) -> u64 {
        self.details.iter().map(|d| u64::from(d.quantity)).sum()
    }

    /// Append a detail row and re-derive the totals.
    pub fn add_detail(
        &mut self,
        product_id: ProductId,
        unit_price: Decimal,
        quantity: u32,
    ) -> DomainResult<&SaleDetail> {
        if quantity == 0 {
            return Err(DomainError::validation("detail quantity must be positive"));
        }
        if unit_price < Decimal::ZERO {
            return Err(DomainError::validation("detail unit price cannot be negative"));
        }

        let line_no = self.details.len() as u32 + 1;
        self.details.push(SaleDetail {
            line_no,
            product_id,
            unit_price,
            quantity,
            total_detail: round2(unit_price * Decimal::from(quantity)),
        });
        self.recompute();
        Ok(&self.details[self.details.len() - 1])
    }

    /// Apply a tax rate (percentage) and re-derive the totals.
    pub fn apply_tax(&mut self, tax_percentage: Decimal) -> DomainResult<()> {
        if tax_percentage < Decimal::ZERO {
            return Err(DomainError::validation("tax percentage cannot be negative"));
        }
        self.tax_percentage = tax_percentage;
        self.recompute();
        Ok(())
    }

    /// Re-derive subtotal, tax amount, grand total and change.
    fn recompute(&mut self) {
        let details_total: Decimal = self.details.iter().map(|d| d.total_detail).sum();
        self.sub_total = round2(details_total);
        self.tax_amount = round2(self.sub_total * self.tax_percentage / Decimal::ONE_HUNDRED);
        self.grand_total = round2(self.sub_total + self.tax_amount);
        self.amount_change = (self.amount_paid - self.grand_total).max(Decimal::ZERO);
    }
}

impl Entity for Sale {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
