//! `bodega-access` — pure access and lifecycle gates.
//!
//! Gates are policy checks, not business logic; they perform no IO and never
//! panic.

pub mod lifecycle;
pub mod owner;

pub use lifecycle::{DESTROY_THRESHOLD, TeardownGuard};
pub use owner::OwnerGate;
