//! `bodega-events` — event contract and notification plumbing.

pub mod event;
pub mod log;

pub use event::Event;
pub use log::{LogError, NotificationLog, Subscription};
