//! Liveness classification
//!
//! A node is offline once more than the liveness timeout has passed since
//! its last accepted reading. Liveness is derived on demand and never
//! stored.

use std::time::Duration;

use nodewatch_core::{NodeEntry, Timestamp};

/// Default liveness timeout
pub const DEFAULT_LIVENESS_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Liveness {
    Online,
    Offline,
}

impl Liveness {
    #[inline]
    pub fn is_online(self) -> bool {
        self == Liveness::Online
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LivenessClassifier {
    timeout: Duration,
}

impl LivenessClassifier {
    pub fn new(timeout: Duration) -> Self {
        LivenessClassifier { timeout }
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn classify(&self, entry: &NodeEntry, now: Timestamp) -> Liveness {
        classify(entry, now, self.timeout)
    }

    /// How long past the timeout an offline node is; `None` while online
    pub fn offline_for(&self, entry: &NodeEntry, now: Timestamp) -> Option<Duration> {
        let silent = now - entry.last_seen;
        if silent > self.timeout {
            Some(silent - self.timeout)
        } else {
            None
        }
    }
}

impl Default for LivenessClassifier {
    fn default() -> Self {
        LivenessClassifier::new(DEFAULT_LIVENESS_TIMEOUT)
    }
}

/// Classify `entry` against an explicit timeout
pub fn classify(entry: &NodeEntry, now: Timestamp, timeout: Duration) -> Liveness {
    if now - entry.last_seen > timeout {
        Liveness::Offline
    } else {
        Liveness::Online
    }
}
