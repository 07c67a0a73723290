//! PROXIMA Core - Fundamental types for the proximity hub
//!
//! This crate defines the types shared by every other PROXIMA crate:
//! - Identifiers (NodeId, PairKey)
//! - Measurement records
//! - Typed configuration
//! - Error taxonomy and time helpers

pub mod config;
pub mod error;
pub mod id;
pub mod measurement;
pub mod time;

pub use config::*;
pub use error::*;
pub use id::*;
pub use measurement::*;
pub use time::*;
