//! End-to-end scenarios
//!
//! Runs the full ingestion path (codec, policy, registry, dispatch) against
//! simulated fleets and checks the registry invariants:
//! - node ids are unique and the registry never exceeds its capacity
//! - accepted readings of one node are at least a duplicate window apart
//! - stored timestamps never move backwards
//! - sinks see exactly the accepted readings

use std::sync::Arc;
use std::time::Duration;

use nodewatch_core::{Clock, ManualClock, Timestamp};
use nodewatch_runtime::IngestPipeline;
use nodewatch_sinks::Dispatcher;
use nodewatch_state::{DedupPolicy, NodeRegistry, DEFAULT_DUPLICATE_WINDOW};
use nodewatch_wire::PayloadCodec;

use crate::RecordingSink;

/// Pipeline wired to a recording sink on a manual clock
pub struct Harness {
    pub pipeline: IngestPipeline,
    pub registry: Arc<NodeRegistry>,
    pub clock: Arc<ManualClock>,
    pub recorded: RecordingSink,
}

impl Harness {
    pub fn new(capacity: usize) -> Self {
        Self::with_window(capacity, DEFAULT_DUPLICATE_WINDOW)
    }

    pub fn with_window(capacity: usize, window: Duration) -> Self {
        let clock = Arc::new(ManualClock::new(Timestamp::from_secs(1_700_000_000)));
        let registry = Arc::new(NodeRegistry::new(capacity));
        let recorded = RecordingSink::new();
        let dispatcher = Dispatcher::new().with_sink(recorded.clone());

        let pipeline = IngestPipeline::new(
            PayloadCodec::default(),
            Arc::clone(&registry),
            DedupPolicy::new(window),
            dispatcher,
            clock.clone(),
        );

        Harness {
            pipeline,
            registry,
            clock,
            recorded,
        }
    }

    /// Current clock reading
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}
