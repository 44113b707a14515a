//! NodeWatch Sinks - Consumers of accepted readings
//!
//! Every accepted reading is offered to each configured sink independently:
//! - Display cache, drained by the display cycler
//! - Per-node CSV log
//! - JSON-line forward channel
//!
//! A sink failure is local to that sink and never affects the others or the
//! registry state that has already been committed.

pub mod display;
pub mod forward;
pub mod log;
pub mod sink;

pub use display::*;
pub use forward::*;
pub use log::*;
pub use sink::*;
