//! NodeWatch Test Harness - Simulation and end-to-end validation
//!
//! This crate provides:
//! - A seeded radio model (burst repeats, faulted leading packets, loss,
//!   foreign and truncated broadcasts)
//! - A sensor fleet simulator driving the ingestion pipeline on a manual clock
//! - Recording and failing sinks
//! - End-to-end scenarios

pub mod integration;
pub mod radio;
pub mod recording;
pub mod simulator;

pub use radio::*;
pub use recording::*;
pub use simulator::*;
