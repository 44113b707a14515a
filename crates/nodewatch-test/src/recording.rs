//! Test sinks

use std::sync::Arc;

use parking_lot::Mutex;

use nodewatch_core::{NodeEntry, NodeId, NodewatchError, NodewatchResult};
use nodewatch_sinks::{Sink, SinkKind};

/// Keeps every offered entry
#[derive(Clone, Default)]
pub struct RecordingSink {
    entries: Arc<Mutex<Vec<NodeEntry>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<NodeEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries of one node, in delivery order
    pub fn for_node(&self, id: NodeId) -> Vec<NodeEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.node_id == id)
            .copied()
            .collect()
    }
}

impl Sink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Custom
    }

    fn offer(&mut self, entry: &NodeEntry) -> NodewatchResult<()> {
        self.entries.lock().push(*entry);
        Ok(())
    }
}

/// Rejects every entry with a log-medium error
#[derive(Clone, Default)]
pub struct FailingSink {
    attempts: Arc<Mutex<u64>>,
}

impl FailingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u64 {
        *self.attempts.lock()
    }
}

impl Sink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Log
    }

    fn offer(&mut self, _entry: &NodeEntry) -> NodewatchResult<()> {
        *self.attempts.lock() += 1;
        Err(NodewatchError::LogMediumUnavailable("medium removed".into()))
    }
}
