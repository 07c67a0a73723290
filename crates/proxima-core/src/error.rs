//! Error types for the proximity hub

use thiserror::Error;

/// Hub-wide errors
#[derive(Error, Debug)]
pub enum HubError {
    #[error("Invalid node id: {0:?}")]
    InvalidNodeId(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Result type for hub operations
pub type HubResult<T> = Result<T, HubError>;
