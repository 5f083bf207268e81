//! `bodega-catalog` — the shop's product catalog.

pub mod catalog;

pub use catalog::{
    Catalog, CatalogWrite, LOYALTY_DISCOUNT, LOYALTY_SPEND_THRESHOLD, Product, effective_price,
};
