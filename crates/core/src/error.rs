//! Domain error model.

use thiserror::Error;

use crate::id::ExternalId;

/// Result type used across the domain layer.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Domain-level error.
///
/// Keep this focused on deterministic business failures. Runtime concerns
/// (locking, value transfer) belong to the store layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The caller is not the shop owner.
    #[error("unauthorized")]
    Unauthorized,

    /// The external customer id has already been claimed by a registration.
    #[error("customer id {0} is already registered")]
    DuplicateId(ExternalId),

    /// The caller is not a registered customer.
    #[error("caller is not a registered customer")]
    NotRegistered,

    /// The caller carries unsettled credit.
    #[error("caller has outstanding debt")]
    OutstandingDebt,

    /// The product has no remaining stock.
    #[error("product '{0}' is out of stock")]
    OutOfStock(String),

    /// The tendered value does not match the required amount exactly.
    #[error("wrong payment amount: expected {expected}, tendered {tendered}")]
    WrongPaymentAmount { expected: u128, tendered: u128 },

    /// A requested record was not found (domain-level).
    #[error("product '{0}' not found")]
    NotFound(String),

    /// The shop has been torn down; no further operations are served.
    #[error("shop has been destroyed")]
    SystemDestroyed,

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl LedgerError {
    pub fn out_of_stock(name: impl Into<String>) -> Self {
        Self::OutOfStock(name.into())
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    pub fn wrong_payment(expected: u128, tendered: u128) -> Self {
        Self::WrongPaymentAmount { expected, tendered }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
