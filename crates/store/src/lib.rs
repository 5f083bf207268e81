//! `bodega-store` — the single-writer runtime hosting the shop ledger.
//!
//! Wraps the [`bodega_ledger`] aggregate in a global write lock, clears
//! payments through a pluggable [`ValueTransfer`] before any state moves,
//! and publishes the notification stream.

pub mod error;
pub mod store;
pub mod transfer;

pub use error::{StoreError, StoreResult};
pub use store::{DestroyOutcome, ShopStore};
pub use transfer::{Payment, RecordingTransfer, TransferError, ValueTransfer};
