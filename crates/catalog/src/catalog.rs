//! Product records and the name-keyed catalog.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use bodega_core::{LedgerError, LedgerResult};

/// Lifetime spend a buyer must exceed before the loyalty rule is considered.
pub const LOYALTY_SPEND_THRESHOLD: u64 = 50;

/// Whole units knocked off an eligible list price.
pub const LOYALTY_DISCOUNT: u64 = 3;

/// A catalog entry, keyed by its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub description: String,
    /// List price in whole units.
    pub price: u64,
    /// Units remaining on the shelf.
    pub stock: u64,
}

/// Outcome of a catalog write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CatalogWrite {
    Created,
    Replaced,
}

/// Effective price of a list price for a buyer with the given lifetime spend.
///
/// Only list prices under [`LOYALTY_DISCOUNT`] qualify, so every discounted
/// price clamps to zero: cheap items get cheaper, expensive ones never do.
/// The spend threshold is strict.
pub fn effective_price(list_price: u64, buyer_total_spent: u64) -> u64 {
    if buyer_total_spent > LOYALTY_SPEND_THRESHOLD && list_price < LOYALTY_DISCOUNT {
        list_price.saturating_sub(LOYALTY_DISCOUNT)
    } else {
        list_price
    }
}

/// The product catalog: name-keyed, write-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    products: HashMap<String, Product>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry at `product.name`.
    ///
    /// Replacement clobbers the previous entry wholesale, stock included.
    pub fn upsert(&mut self, product: Product) -> CatalogWrite {
        match self.products.insert(product.name.clone(), product) {
            Some(_) => CatalogWrite::Replaced,
            None => CatalogWrite::Created,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Product> {
        self.products.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.products.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Effective price of `name` for a buyer with the given lifetime spend.
    pub fn price_for(&self, name: &str, buyer_total_spent: u64) -> Option<u64> {
        let product = self.products.get(name)?;
        Some(effective_price(product.price, buyer_total_spent))
    }

    pub fn stock_of(&self, name: &str) -> u64 {
        self.products.get(name).map(|p| p.stock).unwrap_or(0)
    }

    pub fn in_stock(&self, name: &str) -> bool {
        self.stock_of(name) > 0
    }

    /// Resolve a purchasable entry: it must exist and have stock left.
    pub fn ensure_available(&self, name: &str) -> LedgerResult<&Product> {
        let product = self
            .products
            .get(name)
            .ok_or_else(|| LedgerError::not_found(name))?;
        if product.stock == 0 {
            return Err(LedgerError::out_of_stock(name));
        }
        Ok(product)
    }

    /// Take one unit off the shelf.
    ///
    /// Callers check availability first; the decrement saturates so stock can
    /// never wrap below zero.
    pub fn take_one(&mut self, name: &str) {
        if let Some(product) = self.products.get_mut(name) {
            product.stock = product.stock.saturating_sub(1);
        }
    }
}
