//! FIFO invariant: whatever the scheduler decides about *which actor* runs,
//! messages within one actor's mailbox are processed in arrival order.

use parking_lot::Mutex;
use proptest::prelude::*;
use rotor_actors::{Actor, EventLoop, Message, RuntimeConfig, SchedulerKind};
use std::sync::Arc;

fn run_with_scheduler(kind: SchedulerKind, sequences: &[Vec<u32>]) -> Vec<Vec<u32>> {
    let config = RuntimeConfig {
        scheduler: kind,
        cycle_yield_ms: 0,
        ..RuntimeConfig::default()
    };
    let event_loop = EventLoop::with_config(config);

    let mut actors = Vec::new();
    let mut recordings = Vec::new();
    for (i, _) in sequences.iter().enumerate() {
        let actor = Actor::new(format!("subject-{i}"), Arc::downgrade(&event_loop));
        let recorded = Arc::new(Mutex::new(Vec::<u32>::new()));
        let sink = recorded.clone();
        actor.register_handler("value", move |_actor, msg| {
            sink.lock().push(msg.payload_value_or::<u32>("v", u32::MAX));
        });
        event_loop.register_actor(actor.clone());
        actor.initialize();
        actor.start();
        actors.push(actor);
        recordings.push(recorded);
    }

    for (actor, sequence) in actors.iter().zip(sequences) {
        for value in sequence {
            event_loop.deliver_message(
                Message::new("value", actor.id().clone()).with_value("v", *value),
            );
        }
    }

    event_loop.run();

    recordings.iter().map(|r| r.lock().clone()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn fifo_order_is_preserved_under_every_scheduler(
        sequences in prop::collection::vec(prop::collection::vec(any::<u32>(), 0..16), 1..4),
        kind in prop::sample::select(vec![
            SchedulerKind::RoundRobin,
            SchedulerKind::Priority,
            SchedulerKind::MessagePriority,
            SchedulerKind::Fair,
        ]),
    ) {
        let observed = run_with_scheduler(kind, &sequences);
        prop_assert_eq!(observed, sequences);
    }
}
