//! Teardown lifecycle guard.

use serde::{Deserialize, Serialize};

use bodega_core::{LedgerError, LedgerResult};

/// Destroy attempts required before teardown actually happens.
pub const DESTROY_THRESHOLD: u32 = 3;

/// Tracks destroy attempts and the terminal destroyed flag.
///
/// The first attempts are dry runs: they advance the counter and nothing
/// else. The attempt that reaches [`DESTROY_THRESHOLD`] is final; there is no
/// way back once the guard is destroyed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TeardownGuard {
    attempts: u32,
    destroyed: bool,
}

impl TeardownGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts recorded so far. Observable shop state.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The ordinal of the attempt currently being decided.
    pub fn next_attempt(&self) -> u32 {
        self.attempts + 1
    }

    /// Whether the attempt currently being decided is the final one.
    pub fn next_attempt_destroys(&self) -> bool {
        self.next_attempt() >= DESTROY_THRESHOLD
    }

    /// Gate every operation on the shop still being alive.
    pub fn ensure_alive(&self) -> LedgerResult<()> {
        if self.destroyed {
            Err(LedgerError::SystemDestroyed)
        } else {
            Ok(())
        }
    }

    /// Record a non-final attempt.
    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Record the final attempt and tear down.
    pub fn record_destroyed(&mut self) {
        self.attempts += 1;
        self.destroyed = true;
    }
}
