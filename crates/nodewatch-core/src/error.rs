//! Error types for NodeWatch
//!
//! None of these is fatal: every path ends in "skip this one event and
//! continue".

use thiserror::Error;

use crate::NodeId;

/// Core NodeWatch errors
#[derive(Error, Debug)]
pub enum NodewatchError {
    // Codec errors
    #[error("Malformed payload: expected {expected} bytes, got {actual}")]
    MalformedPayload { expected: usize, actual: usize },

    #[error("Wrong manufacturer: expected {expected:#06x}, got {actual:#06x}")]
    WrongManufacturer { expected: u16, actual: u16 },

    // Registry errors
    #[error("Registry full: cannot admit node {node} (capacity {capacity})")]
    CapacityExceeded { node: NodeId, capacity: usize },

    // Sink errors
    #[error("Log medium unavailable: {0}")]
    LogMediumUnavailable(String),

    #[error("Clock not synchronized")]
    ClockUnsynchronized,

    #[error("Forward buffer overflow: message needs {needed} bytes, buffer holds {capacity}")]
    ForwardBufferOverflow { needed: usize, capacity: usize },

    #[error("Forward channel error: {0}")]
    ForwardChannel(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for NodeWatch operations
pub type NodewatchResult<T> = Result<T, NodewatchError>;
