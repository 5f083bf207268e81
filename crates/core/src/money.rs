//! Whole-unit prices and minor-unit tendered values.
//!
//! Prices, spend and debt are bookkept in whole currency units. Payments are
//! tendered in minor units (cents, wei, ...). [`UnitScale`] is the fixed
//! conversion between the two; exact-match payment checks compare in minor
//! units so no rounding can slip in.

use core::num::NonZeroU64;
use serde::{Deserialize, Serialize};

/// Minor units per whole currency unit.
///
/// Non-zero by construction; a zero scale would make every payment check
/// degenerate to zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitScale(NonZeroU64);

impl UnitScale {
    /// 1:1 scale, whole units tendered directly.
    pub const WHOLE: UnitScale = UnitScale(NonZeroU64::MIN);

    /// 1:100 scale (whole units to cents).
    pub const CENTS: UnitScale = match NonZeroU64::new(100) {
        Some(n) => UnitScale(n),
        None => unreachable!(),
    };

    pub const fn new(per_unit: NonZeroU64) -> Self {
        Self(per_unit)
    }

    pub const fn per_unit(&self) -> u64 {
        self.0.get()
    }

    /// The minor-unit value of `units` whole units.
    ///
    /// Widens to `u128`, so the conversion cannot overflow.
    pub const fn minor_value(&self, units: u64) -> u128 {
        units as u128 * self.0.get() as u128
    }
}

impl Default for UnitScale {
    fn default() -> Self {
        Self::CENTS
    }
}
