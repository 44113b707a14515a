//! Burst deduplication
//!
//! Nodes repeat each broadcast several times in a short burst and the first
//! packets of a burst may carry sensor faults. For every decoded reading the
//! policy decides, in order:
//! 1. a known node seen less than `window` ago is suppressed;
//! 2. otherwise a reading with any faulted channel is deferred, so the
//!    next packet of the burst still gets a chance;
//! 3. otherwise the reading is accepted.
//!
//! Neither suppression nor deferral touches the registry.

use std::time::Duration;

use nodewatch_core::{DecodedReading, NodeEntry, NodewatchError, NodewatchResult, Timestamp};

/// Default duplicate window
pub const DEFAULT_DUPLICATE_WINDOW: Duration = Duration::from_secs(2);

/// Outcome of [`DedupPolicy::evaluate`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Commit to the registry and notify sinks
    Accept,
    /// Repeat of a reading accepted within the duplicate window
    Suppress,
    /// Part of a burst with at least one faulted channel
    Defer,
}

impl Verdict {
    #[inline]
    pub fn is_accept(self) -> bool {
        self == Verdict::Accept
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DedupPolicy {
    window: Duration,
}

impl DedupPolicy {
    pub fn new(window: Duration) -> Self {
        DedupPolicy { window }
    }

    /// Build a policy whose window is shorter than the liveness timeout
    pub fn checked(window: Duration, liveness_timeout: Duration) -> NodewatchResult<Self> {
        if window >= liveness_timeout {
            return Err(NodewatchError::InvalidConfig(format!(
                "duplicate window {:?} must be shorter than liveness timeout {:?}",
                window, liveness_timeout
            )));
        }
        Ok(Self::new(window))
    }

    #[inline]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Classify a reading against the node's current entry.
    ///
    /// A `now` earlier than `last_seen` counts as zero elapsed time and is
    /// therefore suppressed.
    pub fn evaluate(
        &self,
        existing: Option<&NodeEntry>,
        reading: &DecodedReading,
        now: Timestamp,
    ) -> Verdict {
        if let Some(entry) = existing {
            if now - entry.last_seen < self.window {
                return Verdict::Suppress;
            }
        }

        if !reading.is_complete() {
            return Verdict::Defer;
        }

        Verdict::Accept
    }
}

impl Default for DedupPolicy {
    fn default() -> Self {
        DedupPolicy::new(DEFAULT_DUPLICATE_WINDOW)
    }
}
