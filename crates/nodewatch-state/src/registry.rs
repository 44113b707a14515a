//! Node registry - the last known reading of every admitted node
//!
//! The registry is bounded: once `capacity` nodes have been admitted,
//! readings from unknown nodes are rejected and nothing is ever evicted.
//! Entries are kept in admission order so that a position handed out by
//! [`NodeRegistry::snapshot`] keeps naming the same node.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use nodewatch_core::{DecodedReading, NodeEntry, NodeId, NodewatchError, Timestamp};

/// Default number of nodes the registry admits
pub const DEFAULT_CAPACITY: usize = 36;

/// Why `accept` refused to touch the registry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    CapacityExceeded,
}

/// Result of [`NodeRegistry::accept`]
#[derive(Clone, Debug, PartialEq)]
pub enum Admission {
    /// First reading of a previously unseen node
    Created(Arc<NodeEntry>),
    /// Existing entry replaced
    Updated(Arc<NodeEntry>),
    Rejected(Rejection),
}

impl Admission {
    /// The committed entry, if any
    pub fn entry(&self) -> Option<&Arc<NodeEntry>> {
        match self {
            Admission::Created(e) | Admission::Updated(e) => Some(e),
            Admission::Rejected(_) => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Admission::Rejected(_))
    }
}

#[derive(Debug, Default)]
struct Table {
    /// Entries in admission order
    entries: Vec<Arc<NodeEntry>>,
    /// NodeId -> position in `entries`
    index: HashMap<NodeId, usize>,
}

/// Bounded node registry, one writer and any number of readers
#[derive(Debug)]
pub struct NodeRegistry {
    capacity: usize,
    table: RwLock<Table>,
}

impl NodeRegistry {
    pub fn new(capacity: usize) -> Self {
        NodeRegistry {
            capacity,
            table: RwLock::new(Table {
                entries: Vec::with_capacity(capacity),
                index: HashMap::with_capacity(capacity),
            }),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.table.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Get the entry of a node
    pub fn lookup(&self, id: NodeId) -> Option<Arc<NodeEntry>> {
        let table = self.table.read();
        table.index.get(&id).map(|&pos| Arc::clone(&table.entries[pos]))
    }

    /// Get the entry at an admission-order position
    pub fn get(&self, position: usize) -> Option<Arc<NodeEntry>> {
        self.table.read().entries.get(position).cloned()
    }

    /// Record an accepted reading for `id`.
    ///
    /// This is the only mutator. The stored entry is swapped as a whole, so
    /// readers see either the old or the new entry, never a mix. The stored
    /// timestamp never moves backwards.
    pub fn accept(&self, id: NodeId, reading: &DecodedReading, now: Timestamp) -> Admission {
        let mut table = self.table.write();

        if let Some(&pos) = table.index.get(&id) {
            let previous = table.entries[pos].last_seen;
            let last_seen = if now < previous {
                tracing::debug!(node = %id, ?previous, ?now, "clock moved backwards, keeping last_seen");
                previous
            } else {
                now
            };

            let entry = Arc::new(NodeEntry {
                node_id: id,
                ..NodeEntry::from_reading(reading, last_seen)
            });
            table.entries[pos] = Arc::clone(&entry);
            return Admission::Updated(entry);
        }

        if table.entries.len() >= self.capacity {
            return Admission::Rejected(Rejection::CapacityExceeded);
        }

        let entry = Arc::new(NodeEntry {
            node_id: id,
            ..NodeEntry::from_reading(reading, now)
        });
        let pos = table.entries.len();
        table.entries.push(Arc::clone(&entry));
        table.index.insert(id, pos);
        tracing::info!(node = %id, position = pos, "node admitted");

        Admission::Created(entry)
    }

    /// All entries in admission order
    pub fn snapshot(&self) -> Vec<Arc<NodeEntry>> {
        self.table.read().entries.clone()
    }

    /// Error describing a capacity rejection for `id`
    pub fn capacity_error(&self, id: NodeId) -> NodewatchError {
        NodewatchError::CapacityExceeded {
            node: id,
            capacity: self.capacity,
        }
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        NodeRegistry::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodewatch_core::SensorValue;
    use proptest::prelude::*;
    use std::thread;

    fn reading(node: u8, temperature: f32) -> DecodedReading {
        DecodedReading {
            node_id: NodeId::new(node),
            temperature: SensorValue::Value(temperature),
            humidity: SensorValue::Value(50.0),
            illuminance: SensorValue::Value(100),
        }
    }

    #[test]
    fn test_create_then_update() {
        let registry = NodeRegistry::new(4);
        let id = NodeId::new(1);

        let first = registry.accept(id, &reading(1, 20.0), Timestamp::from_secs(10));
        assert!(matches!(first, Admission::Created(_)));

        let second = registry.accept(id, &reading(1, 21.5), Timestamp::from_secs(20));
        assert!(matches!(second, Admission::Updated(_)));

        assert_eq!(registry.len(), 1);
        let entry = registry.lookup(id).unwrap();
        assert_eq!(entry.temperature, SensorValue::Value(21.5));
        assert_eq!(entry.last_seen, Timestamp::from_secs(20));
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = NodeRegistry::default();
        assert!(registry.lookup(NodeId::new(9)).is_none());
        assert!(registry.is_empty());
        assert_eq!(registry.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_capacity_exceeded_rejects_without_eviction() {
        let capacity = 3;
        let registry = NodeRegistry::new(capacity);
        let now = Timestamp::from_secs(1);

        for id in 0..capacity as u8 {
            assert!(matches!(registry.accept(NodeId::new(id), &reading(id, 20.0), now), Admission::Created(_)));
        }
        assert!(registry.is_full());

        let overflow = registry.accept(NodeId::new(200), &reading(200, 20.0), now);
        assert_eq!(overflow, Admission::Rejected(Rejection::CapacityExceeded));
        assert_eq!(registry.len(), capacity);
        assert!(registry.lookup(NodeId::new(200)).is_none());

        // Known nodes still update while full
        let update = registry.accept(NodeId::new(0), &reading(0, 25.0), Timestamp::from_secs(2));
        assert!(matches!(update, Admission::Updated(_)));
    }

    #[test]
    fn test_snapshot_keeps_admission_order() {
        let registry = NodeRegistry::new(8);
        for (i, id) in [7u8, 2, 9, 4].iter().enumerate() {
            registry.accept(NodeId::new(*id), &reading(*id, 20.0), Timestamp::from_secs(i as i64));
        }
        // Updating an early node must not move it
        registry.accept(NodeId::new(7), &reading(7, 30.0), Timestamp::from_secs(10));

        let order: Vec<u8> = registry.snapshot().iter().map(|e| e.node_id.0).collect();
        assert_eq!(order, vec![7, 2, 9, 4]);
        assert_eq!(registry.get(2).unwrap().node_id, NodeId::new(9));
        assert!(registry.get(4).is_none());
    }

    #[test]
    fn test_timestamp_never_moves_backwards() {
        let registry = NodeRegistry::new(2);
        let id = NodeId::new(1);

        registry.accept(id, &reading(1, 20.0), Timestamp::from_secs(100));
        let admission = registry.accept(id, &reading(1, 22.0), Timestamp::from_secs(50));

        let entry = admission.entry().unwrap();
        assert_eq!(entry.last_seen, Timestamp::from_secs(100));
        assert_eq!(entry.temperature, SensorValue::Value(22.0));
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_updates() {
        let registry = NodeRegistry::new(2);
        let id = NodeId::new(1);
        registry.accept(id, &reading(1, 20.0), Timestamp::from_secs(1));

        let snapshot = registry.snapshot();
        registry.accept(id, &reading(1, 30.0), Timestamp::from_secs(2));

        assert_eq!(snapshot[0].temperature, SensorValue::Value(20.0));
        assert_eq!(registry.lookup(id).unwrap().temperature, SensorValue::Value(30.0));
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_entries() {
        let registry = Arc::new(NodeRegistry::new(1));
        let id = NodeId::new(1);
        registry.accept(id, &reading(1, 0.0), Timestamp::ZERO);

        let reader = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..10_000 {
                    let entry = registry.lookup(id).unwrap();
                    // Writer keeps temperature == last_seen seconds
                    let t = entry.temperature.value().unwrap();
                    assert_eq!(t as i64, entry.last_seen.as_secs());
                }
            })
        };

        for i in 1..10_000i64 {
            registry.accept(id, &reading(1, i as f32), Timestamp::from_secs(i));
        }
        reader.join().unwrap();
    }

    proptest! {
        #[test]
        fn prop_ids_stay_unique_and_bounded(
            capacity in 1usize..16,
            ids in proptest::collection::vec(any::<u8>(), 0..128),
        ) {
            let registry = NodeRegistry::new(capacity);
            for (i, id) in ids.iter().enumerate() {
                registry.accept(NodeId::new(*id), &reading(*id, 20.0), Timestamp::from_secs(i as i64));
            }

            let snapshot = registry.snapshot();
            prop_assert!(snapshot.len() <= capacity);

            let mut seen = std::collections::HashSet::new();
            for entry in &snapshot {
                prop_assert!(seen.insert(entry.node_id));
            }

            // First-seen ids win
            let mut expected = Vec::new();
            for id in &ids {
                if !expected.contains(id) && expected.len() < capacity {
                    expected.push(*id);
                }
            }
            let order: Vec<u8> = snapshot.iter().map(|e| e.node_id.0).collect();
            prop_assert_eq!(order, expected);
        }

        #[test]
        fn prop_capacity_plus_one_is_rejected(capacity in 1usize..64) {
            let registry = NodeRegistry::new(capacity);
            let now = Timestamp::from_secs(1);
            for id in 0..capacity {
                let id = id as u8;
                registry.accept(NodeId::new(id), &reading(id, 20.0), now);
            }

            let last = capacity as u8;
            let admission = registry.accept(NodeId::new(last), &reading(last, 20.0), now);
            prop_assert_eq!(admission, Admission::Rejected(Rejection::CapacityExceeded));
            prop_assert_eq!(registry.len(), capacity);
        }
    }
}
