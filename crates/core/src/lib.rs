//! `bodega-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no runtime concerns).

pub mod aggregate;
pub mod error;
pub mod id;
pub mod money;

pub use aggregate::{Aggregate, AggregateRoot};
pub use error::{LedgerError, LedgerResult};
pub use id::{CallerId, ExternalId, ShopId};
pub use money::UnitScale;
