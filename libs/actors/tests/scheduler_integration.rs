//! Scheduler behavior observed through full run cycles

use parking_lot::Mutex;
use rotor_actors::{
    Actor, EventLoop, Message, MessagePriorityScheduler, Priority, RuntimeConfig, SchedulerKind,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn spawn_counting_actor(event_loop: &Arc<EventLoop>, name: &str) -> Arc<Actor> {
    let actor = Actor::new(name, Arc::downgrade(event_loop));
    actor.register_handler("work", |_actor, _msg| {});
    event_loop.register_actor(actor.clone());
    actor.initialize();
    actor.start();
    actor
}

#[test]
fn test_round_robin_run_to_quiescence() {
    let event_loop = EventLoop::new();

    let actors: Vec<Arc<Actor>> = (0..10)
        .map(|i| spawn_counting_actor(&event_loop, &format!("worker-{i}")))
        .collect();

    for actor in &actors {
        for _ in 0..5 {
            event_loop.deliver_message(Message::new("work", actor.id().clone()));
        }
    }

    // terminates on its own once mailboxes drain; no external stop
    event_loop.run();

    assert!(!event_loop.has_work());
    assert!(!event_loop.is_running());
    for actor in &actors {
        assert_eq!(actor.messages_processed(), 5, "{} drifted", actor.name());
    }
    assert_eq!(event_loop.metrics().snapshot().messages_delivered, 50);
}

#[test]
fn test_message_priority_runs_urgent_actor_first() {
    let config = RuntimeConfig {
        scheduler: SchedulerKind::MessagePriority,
        cycle_yield_ms: 0,
        ..RuntimeConfig::default()
    };
    let event_loop = EventLoop::with_config(config);

    let order = Arc::new(Mutex::new(Vec::<String>::new()));

    let mut actors = Vec::new();
    for name in ["background", "urgent"] {
        let actor = Actor::new(name, Arc::downgrade(&event_loop));
        let sink = order.clone();
        actor.register_handler("work", move |actor, _msg| {
            sink.lock().push(actor.name().to_string());
        });
        event_loop.register_actor(actor.clone());
        actor.initialize();
        actor.start();
        actors.push(actor);
    }

    event_loop.deliver_message(
        Message::new("work", actors[0].id().clone()).with_priority(Priority::Low),
    );
    event_loop.deliver_message(
        Message::new("work", actors[1].id().clone()).with_priority(Priority::High),
    );

    event_loop.run();

    assert_eq!(*order.lock(), vec!["urgent", "background"]);
}

#[test]
fn test_fair_scheduler_bounds_starvation() {
    let threshold = Duration::from_millis(50);
    let config = RuntimeConfig {
        scheduler: SchedulerKind::Fair,
        starvation_ms: threshold.as_millis() as u64,
        cycle_yield_ms: 1,
        ..RuntimeConfig::default()
    };
    let event_loop = EventLoop::with_config(config);

    let selections: Arc<Mutex<Vec<(String, Instant)>>> = Arc::new(Mutex::new(Vec::new()));

    let actors: Vec<Arc<Actor>> = (0..3)
        .map(|i| {
            let actor = Actor::new(format!("fair-{i}"), Arc::downgrade(&event_loop));
            let sink = selections.clone();
            actor.register_handler("work", move |actor, _msg| {
                sink.lock().push((actor.name().to_string(), Instant::now()));
            });
            event_loop.register_actor(actor.clone());
            actor.initialize();
            actor.start();
            actor
        })
        .collect();

    for actor in &actors {
        for _ in 0..80 {
            event_loop.deliver_message(Message::new("work", actor.id().clone()));
        }
    }

    event_loop.run();

    // each continuously-eligible actor was selected well within the threshold
    let selections = selections.lock();
    for actor in &actors {
        let stamps: Vec<Instant> = selections
            .iter()
            .filter(|(name, _)| name == actor.name())
            .map(|(_, at)| *at)
            .collect();
        assert_eq!(stamps.len(), 80);
        for pair in stamps.windows(2) {
            let gap = pair[1].duration_since(pair[0]);
            assert!(
                gap <= threshold + Duration::from_millis(100),
                "{} starved for {gap:?}",
                actor.name()
            );
        }
    }
}

#[test]
fn test_scheduler_swap_leaves_actor_state_untouched() {
    let event_loop = EventLoop::new();
    let actor = spawn_counting_actor(&event_loop, "steady");
    event_loop.deliver_message(Message::new("work", actor.id().clone()));

    event_loop.set_scheduler(Box::new(MessagePriorityScheduler::new()));
    assert!(actor.is_running());
    assert_eq!(actor.message_count(), 1);

    event_loop.run();
    assert_eq!(actor.messages_processed(), 1);
}
