//! Store-level error model.

use thiserror::Error;

use bodega_core::LedgerError;

use crate::transfer::TransferError;

/// Result type used across the store layer.
pub type StoreResult<T> = Result<T, StoreError>;

/// Runtime failure around the shop aggregate.
///
/// Domain rejections pass through transparently; the rest is the store's own
/// (value transfer, lock health).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The environment rejected a value transfer; nothing was committed.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// A runtime lock was poisoned by a panicked writer.
    #[error("shop state lock poisoned")]
    Poisoned,
}
