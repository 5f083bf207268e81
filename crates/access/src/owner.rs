//! Single-owner access gate.

use serde::{Deserialize, Serialize};

use bodega_core::{CallerId, LedgerError, LedgerResult};

/// The shop's access policy: one owner, fixed at construction.
///
/// There is deliberately no operation that transfers ownership.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerGate {
    owner: CallerId,
}

impl OwnerGate {
    pub fn new(owner: CallerId) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> CallerId {
        self.owner
    }

    pub fn is_owner(&self, caller: CallerId) -> bool {
        caller == self.owner
    }

    /// Gate an owner-only operation.
    pub fn ensure(&self, caller: CallerId) -> LedgerResult<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized)
        }
    }
}
