//! `bodega-customers` — customer identity and balances.

pub mod registry;

pub use registry::{Customer, CustomerRegistry, Registration};
