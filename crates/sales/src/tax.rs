//! Tax rates: the lookup seam and the fallback table.
//!
//! Live rate lookup (an external rates API) is a collaborator behind
//! [`TaxRateSource`]; this module only owns the fallback path — a static
//! region→rate table with a default — used when no live source is configured
//! or the source has no answer for a region.

use std::collections::HashMap;

use rust_decimal::Decimal;

/// Source of tax rates, as percentages (e.g. `18` for 18%).
pub trait TaxRateSource: Send + Sync {
    /// Rate for a region key, or `None` when the source has no answer.
    fn rate_for(&self, region: &str) -> Option<Decimal>;
}

/// Static fallback rate table.
#[derive(Debug, Clone)]
pub struct FallbackRates {
    rates: HashMap<String, Decimal>,
    default_rate: Decimal,
}

impl FallbackRates {
    pub fn new(default_rate: Decimal) -> Self {
        Self {
            rates: HashMap::new(),
            default_rate,
        }
    }

    pub fn with_rate(mut self, region: impl Into<String>, rate: Decimal) -> Self {
        self.rates.insert(region.into(), rate);
        self
    }

    pub fn default_rate(&self) -> Decimal {
        self.default_rate
    }

    /// Region rate, or the table default when the region is unknown.
    pub fn rate_or_default(&self, region: &str) -> Decimal {
        self.rates.get(region).copied().unwrap_or(self.default_rate)
    }
}

impl TaxRateSource for FallbackRates {
    fn rate_for(&self, region: &str) -> Option<Decimal> {
        Some(self.rate_or_default(region))
    }
}

/// Resolve the rate to charge: ask the live source first, fall back otherwise.
pub fn resolve_rate(
    live: Option<&dyn TaxRateSource>,
    fallback: &FallbackRates,
    region: &str,
) -> Decimal {
    live.and_then(|source| source.rate_for(region))
        .unwrap_or_else(|| fallback.rate_or_default(region))
}
