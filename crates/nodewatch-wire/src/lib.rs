//! NodeWatch Wire - Broadcast payload format
//!
//! This crate implements the manufacturer-specific payload carried by every
//! sensor broadcast:
//! - Fixed 9-byte little-endian layout
//! - Sentinel values marking per-channel sensor errors
//! - Decoding into typed readings (and encoding, for simulation)

pub mod codec;
pub mod payload;

pub use codec::*;
pub use payload::*;
