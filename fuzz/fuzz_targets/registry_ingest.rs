#![no_main]

use std::collections::HashSet;
use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use nodewatch_core::{NodeId, Timestamp};
use nodewatch_state::{DedupPolicy, NodeRegistry, Verdict};
use nodewatch_wire::PayloadCodec;

#[derive(Arbitrary, Debug)]
struct Step {
    payload: [u8; 9],
    advance_ms: u16,
    backwards: bool,
}

#[derive(Arbitrary, Debug)]
struct Input {
    capacity: u8,
    steps: Vec<Step>,
}

fuzz_target!(|input: Input| {
    let capacity = (input.capacity as usize % 40) + 1;
    let registry = NodeRegistry::new(capacity);
    let policy = DedupPolicy::new(Duration::from_secs(2));
    let codec = PayloadCodec::new(0);
    let mut now = Timestamp::from_secs(1_000);

    for step in &input.steps {
        let dt = Duration::from_millis(step.advance_ms as u64);
        now = if step.backwards { now - dt } else { now + dt };

        let mut payload = step.payload;
        payload[0] = 0;
        payload[1] = 0;
        let Ok(reading) = codec.decode(&payload) else {
            continue;
        };

        let id = reading.node_id;
        let before = registry.lookup(id);
        if policy.evaluate(before.as_deref(), &reading, now) == Verdict::Accept {
            let admission = registry.accept(id, &reading, now);
            if let (Some(before), Some(after)) = (before, admission.entry()) {
                assert!(after.last_seen >= before.last_seen);
            }
        }

        let snapshot = registry.snapshot();
        assert!(snapshot.len() <= capacity);
        let unique: HashSet<NodeId> = snapshot.iter().map(|e| e.node_id).collect();
        assert_eq!(unique.len(), snapshot.len());
    }
});
