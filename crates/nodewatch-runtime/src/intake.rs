//! Broadcast intake queue
//!
//! The radio observer runs in a callback that must never block, so
//! broadcasts are handed over through a small bounded queue. When the
//! ingest task falls behind and the queue is full the broadcast is dropped
//! and counted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{IngestPipeline, IngestStats};

/// Receiving half, owned by the ingest task
pub type BroadcastReceiver = mpsc::Receiver<Bytes>;

/// Producer handle given to the radio collaborator
#[derive(Clone, Debug)]
pub struct BroadcastSender {
    tx: mpsc::Sender<Bytes>,
    dropped: Arc<AtomicU64>,
}

/// Create an intake queue holding at most `depth` broadcasts
pub fn intake_channel(depth: usize) -> (BroadcastSender, BroadcastReceiver) {
    let (tx, rx) = mpsc::channel(depth);
    (
        BroadcastSender {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        },
        rx,
    )
}

impl BroadcastSender {
    /// Hand over one broadcast without waiting.
    ///
    /// Returns `false` if the broadcast was dropped because the queue is
    /// full or the ingest task has gone away.
    pub fn offer(&self, payload: &[u8]) -> bool {
        match self.tx.try_send(Bytes::copy_from_slice(payload)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::debug!(dropped, "intake queue full, broadcast dropped");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Hand over one broadcast, waiting for queue space.
    ///
    /// For replay sources that are not bound to radio timing. Returns
    /// `false` once the ingest task has gone away.
    pub async fn send(&self, payload: &[u8]) -> bool {
        self.tx.send(Bytes::copy_from_slice(payload)).await.is_ok()
    }

    /// Broadcasts dropped by [`offer`](Self::offer) so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Drain the intake queue into the pipeline until every sender is gone
pub async fn run_ingest(mut pipeline: IngestPipeline, mut rx: BroadcastReceiver) -> IngestStats {
    while let Some(payload) = rx.recv().await {
        pipeline.ingest(&payload);
    }
    tracing::info!(stats = ?pipeline.stats(), "ingest task finished");
    pipeline.stats().clone()
}
