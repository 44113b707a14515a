//! NodeWatch Core - Fundamental types and primitives
//!
//! This crate defines the core types shared by every NodeWatch crate:
//! - Node identifiers (NodeId)
//! - Time primitives and the clock collaborator (Timestamp, Clock)
//! - Decoded readings and registry entries
//! - The error taxonomy

pub mod error;
pub mod id;
pub mod reading;
pub mod time;

pub use error::*;
pub use id::*;
pub use reading::*;
pub use time::*;
