//! Shop-wide sales bookkeeping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Aggregate totals: settled sales, open credit, per-country buckets.
///
/// Settled means paid. A credit purchase sits in `total_debts` until the
/// debt is paid off, at which point the full amount moves into
/// `total_purchases` and the buyer's country bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopTotals {
    total_purchases: u64,
    total_debts: u64,
    by_country: HashMap<String, u64>,
}

impl ShopTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_purchases(&self) -> u64 {
        self.total_purchases
    }

    pub fn total_debts(&self) -> u64 {
        self.total_debts
    }

    pub fn by_country(&self) -> &HashMap<String, u64> {
        &self.by_country
    }

    pub fn for_country(&self, country: &str) -> u64 {
        self.by_country.get(country).copied().unwrap_or(0)
    }

    /// Book a settled sale against the buyer's country.
    pub fn record_sale(&mut self, amount: u64, country: &str) {
        self.total_purchases = self.total_purchases.saturating_add(amount);
        let bucket = self.by_country.entry(country.to_string()).or_insert(0);
        *bucket = bucket.saturating_add(amount);
    }

    /// Book an open credit sale; nothing is settled yet.
    pub fn record_credit(&mut self, amount: u64) {
        self.total_debts = self.total_debts.saturating_add(amount);
    }

    /// Move a paid-off debt from open credit into settled sales.
    pub fn settle_credit(&mut self, amount: u64, country: &str) {
        self.total_debts = self.total_debts.saturating_sub(amount);
        self.record_sale(amount, country);
    }
}
