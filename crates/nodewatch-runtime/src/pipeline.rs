//! Ingestion pipeline
//!
//! One broadcast in, one [`IngestOutcome`] out:
//! decode -> dedup policy -> registry -> sink dispatch.
//! The pipeline is the registry's only writer; readers share the registry
//! through [`IngestPipeline::registry`].

use std::sync::Arc;

use nodewatch_core::{Clock, NodeEntry, NodeId, NodewatchError};
use nodewatch_sinks::{DispatchReport, Dispatcher};
use nodewatch_state::{Admission, DedupPolicy, NodeRegistry, Verdict};
use nodewatch_wire::PayloadCodec;

/// What happened to one broadcast
#[derive(Debug)]
pub enum IngestOutcome {
    /// Not a valid payload for this deployment
    Dropped(NodewatchError),
    /// Repeat within the duplicate window
    Suppressed(NodeId),
    /// Faulted channel, waiting for the next packet of the burst
    Deferred(NodeId),
    /// Registry full
    Rejected(NodewatchError),
    Accepted {
        entry: Arc<NodeEntry>,
        created: bool,
        report: DispatchReport,
    },
}

impl IngestOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, IngestOutcome::Accepted { .. })
    }
}

/// Per-outcome counters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub received: u64,
    pub malformed: u64,
    pub wrong_manufacturer: u64,
    pub suppressed: u64,
    pub deferred: u64,
    pub rejected: u64,
    pub created: u64,
    pub updated: u64,
    pub sink_failures: u64,
}

impl IngestStats {
    pub fn accepted(&self) -> u64 {
        self.created + self.updated
    }
}

pub struct IngestPipeline {
    codec: PayloadCodec,
    registry: Arc<NodeRegistry>,
    policy: DedupPolicy,
    dispatcher: Dispatcher,
    clock: Arc<dyn Clock>,
    stats: IngestStats,
}

impl IngestPipeline {
    pub fn new(
        codec: PayloadCodec,
        registry: Arc<NodeRegistry>,
        policy: DedupPolicy,
        dispatcher: Dispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        IngestPipeline {
            codec,
            registry,
            policy,
            dispatcher,
            clock,
            stats: IngestStats::default(),
        }
    }

    /// Shared read handle on the registry
    pub fn registry(&self) -> Arc<NodeRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Process one broadcast payload at the clock's current time
    pub fn ingest(&mut self, payload: &[u8]) -> IngestOutcome {
        self.stats.received += 1;
        let now = self.clock.now();

        let reading = match self.codec.decode(payload) {
            Ok(reading) => reading,
            Err(error) => {
                match error {
                    NodewatchError::WrongManufacturer { .. } => self.stats.wrong_manufacturer += 1,
                    _ => self.stats.malformed += 1,
                }
                tracing::debug!(%error, len = payload.len(), "broadcast dropped");
                return IngestOutcome::Dropped(error);
            }
        };
        let id = reading.node_id;

        let existing = self.registry.lookup(id);
        match self.policy.evaluate(existing.as_deref(), &reading, now) {
            Verdict::Suppress => {
                self.stats.suppressed += 1;
                tracing::trace!(node = %id, "duplicate suppressed");
                return IngestOutcome::Suppressed(id);
            }
            Verdict::Defer => {
                self.stats.deferred += 1;
                tracing::debug!(node = %id, faults = reading.fault_count(), "burst packet deferred");
                return IngestOutcome::Deferred(id);
            }
            Verdict::Accept => {}
        }

        let (entry, created) = match self.registry.accept(id, &reading, now) {
            Admission::Created(entry) => {
                self.stats.created += 1;
                (entry, true)
            }
            Admission::Updated(entry) => {
                self.stats.updated += 1;
                (entry, false)
            }
            Admission::Rejected(_) => {
                self.stats.rejected += 1;
                let error = self.registry.capacity_error(id);
                tracing::warn!(node = %id, capacity = self.registry.capacity(), "registry full, reading discarded");
                return IngestOutcome::Rejected(error);
            }
        };

        let report = self.dispatcher.dispatch(&entry);
        self.stats.sink_failures += report.failures.len() as u64;
        tracing::debug!(
            node = %id,
            created,
            temperature = %entry.temperature,
            humidity = %entry.humidity,
            illuminance = %entry.illuminance,
            "reading accepted"
        );

        IngestOutcome::Accepted {
            entry,
            created,
            report,
        }
    }
}
