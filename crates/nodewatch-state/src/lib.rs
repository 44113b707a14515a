//! NodeWatch State - Node registry and ingestion policy
//!
//! This crate implements the decision core of the ingestion pipeline:
//! - Bounded, insertion-ordered node registry (first-seen nodes win)
//! - Burst deduplication policy
//! - Liveness classification

pub mod dedup;
pub mod liveness;
pub mod registry;

pub use dedup::*;
pub use liveness::*;
pub use registry::*;
