//! NodeWatch Runtime - Ingestion service
//!
//! Wires the codec, registry, policy and sinks together and runs them:
//! - Ingestion pipeline (single writer of the registry)
//! - Bounded broadcast intake queue
//! - Periodic display refresh
//! - TOML configuration and logging setup

pub mod config;
pub mod display;
pub mod intake;
pub mod pipeline;
pub mod service;
pub mod source;
pub mod telemetry;

pub use config::*;
pub use display::*;
pub use intake::*;
pub use pipeline::*;
pub use service::*;
pub use source::*;
