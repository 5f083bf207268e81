//! Value transfer seam between the shop and its environment.

use std::sync::RwLock;

use thiserror::Error;

use bodega_core::CallerId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The environment refused or failed the transfer.
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// One-way value transfer out of the shop.
///
/// The store never holds funds: every tendered payment is forwarded to the
/// owner before any state mutation, and teardown sweeps whatever residue the
/// environment still holds for the shop. A rejection aborts the surrounding
/// operation wholesale.
pub trait ValueTransfer: Send + Sync {
    /// Forward `amount` minor units to `recipient`.
    fn transfer_to(&self, recipient: CallerId, amount: u128) -> Result<(), TransferError>;

    /// Hand any residual shop funds over to `recipient` during teardown.
    fn release_residual(&self, recipient: CallerId) -> Result<(), TransferError>;
}

/// A payment cleared through [`RecordingTransfer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub recipient: CallerId,
    pub amount: u128,
}

/// In-memory transfer ledger.
///
/// Accepts everything and keeps the receipts, in order. Intended for tests,
/// dev and embedding; a real deployment implements [`ValueTransfer`] against
/// its payment rails.
#[derive(Debug, Default)]
pub struct RecordingTransfer {
    payments: RwLock<Vec<Payment>>,
    sweeps: RwLock<Vec<CallerId>>,
}

impl RecordingTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every cleared payment, oldest first.
    pub fn payments(&self) -> Vec<Payment> {
        match self.payments.read() {
            Ok(payments) => payments.clone(),
            Err(_) => Vec::new(),
        }
    }

    /// Sum of minor units forwarded to `recipient`.
    pub fn total_to(&self, recipient: CallerId) -> u128 {
        self.payments()
            .iter()
            .filter(|p| p.recipient == recipient)
            .map(|p| p.amount)
            .sum()
    }

    /// Recipients of residual sweeps, oldest first.
    pub fn sweeps(&self) -> Vec<CallerId> {
        match self.sweeps.read() {
            Ok(sweeps) => sweeps.clone(),
            Err(_) => Vec::new(),
        }
    }
}

impl ValueTransfer for RecordingTransfer {
    fn transfer_to(&self, recipient: CallerId, amount: u128) -> Result<(), TransferError> {
        let mut payments = self
            .payments
            .write()
            .map_err(|_| TransferError::Rejected("transfer ledger lock poisoned".to_string()))?;
        payments.push(Payment { recipient, amount });
        Ok(())
    }

    fn release_residual(&self, recipient: CallerId) -> Result<(), TransferError> {
        let mut sweeps = self
            .sweeps
            .write()
            .map_err(|_| TransferError::Rejected("transfer ledger lock poisoned".to_string()))?;
        sweeps.push(recipient);
        Ok(())
    }
}
