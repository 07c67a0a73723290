//! PROXIMA Runtime - wires the pipeline together
//!
//! Three long-lived tasks, coordinated via channels and a watch signal:
//! - the ingest loop (owned by proxima-ingest, feeds the measurement channel)
//! - the apply loop (drains the channel into the store and the CSV history)
//! - the broadcast loop (snapshots the store on a fixed cadence and fans out)

pub mod broadcast;
pub mod hub;
pub mod record;

pub use broadcast::*;
pub use hub::*;
pub use record::*;
