//! PROXIMA State - the live proximity graph
//!
//! One entry per canonical node pair, last write wins. Staleness is a
//! read-time filter: entries are never deleted, they just stop appearing
//! in snapshots until a fresh measurement revives them.

pub mod snapshot;
pub mod store;

pub use snapshot::*;
pub use store::*;
