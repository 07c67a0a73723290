//! PROXIMA Ingest - the datagram-to-measurement pipeline
//!
//! One datagram flows through decode -> validate -> dedup and, if it
//! survives, leaves this crate as a `Measurement` on the hub's channel.
//! Nothing here mutates the store directly.

pub mod dedup;
pub mod listener;
pub mod validate;

pub use dedup::*;
pub use listener::*;
pub use validate::*;
