//! Event Loop
//!
//! Central driver owning the actor registry and the active scheduler. The
//! run cycle advances global progress one message at a time: collect the
//! actors eligible to run, ask the scheduler for exactly one, let it process
//! exactly one message. That single-step granularity is what makes scheduler
//! choice observable.
//!
//! The loop body executes on one thread, but `deliver_message` and the
//! registry operations are safe to call from other threads concurrently with
//! it: the registry sits behind a read/write lock and each actor guards its
//! own mailbox.

use crate::actor::{Actor, ActorId, ActorState};
use crate::config::RuntimeConfig;
use crate::messages::Message;
use crate::scheduler::Scheduler;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Loop-wide counters, snapshot-readable without locking
#[derive(Debug, Default)]
pub struct LoopMetrics {
    /// Messages enqueued into a target mailbox
    pub messages_delivered: AtomicU64,
    /// Messages dropped for an unknown or non-running target
    pub messages_dropped: AtomicU64,
    /// Scheduling cycles that selected an actor
    pub cycles: AtomicU64,
}

/// Point-in-time counter snapshot
#[derive(Debug, Clone, Copy)]
pub struct LoopStats {
    pub messages_delivered: u64,
    pub messages_dropped: u64,
    pub cycles: u64,
}

impl LoopMetrics {
    /// Read all counters at once
    pub fn snapshot(&self) -> LoopStats {
        LoopStats {
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            cycles: self.cycles.load(Ordering::Relaxed),
        }
    }
}

/// Actor registry keyed by id, preserving registration order so every cycle
/// presents candidates to the scheduler in a deterministic, stable order
struct Registry {
    actors: HashMap<ActorId, Arc<Actor>>,
    order: Vec<ActorId>,
}

impl Registry {
    fn ordered(&self) -> Vec<Arc<Actor>> {
        self.order
            .iter()
            .filter_map(|id| self.actors.get(id).cloned())
            .collect()
    }
}

/// Central dispatcher: owns the registry and the active scheduler, drives
/// the run cycle until no actor has work or the loop is stopped
pub struct EventLoop {
    registry: RwLock<Registry>,
    scheduler: Mutex<Box<dyn Scheduler>>,
    running: AtomicBool,
    config: RuntimeConfig,
    metrics: LoopMetrics,
}

impl EventLoop {
    /// Create an event loop with the default configuration (RoundRobin
    /// scheduler, 1 ms cycle yield)
    pub fn new() -> Arc<Self> {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create an event loop from an explicit configuration
    pub fn with_config(config: RuntimeConfig) -> Arc<Self> {
        Arc::new(Self {
            registry: RwLock::new(Registry {
                actors: HashMap::new(),
                order: Vec::new(),
            }),
            scheduler: Mutex::new(config.build_scheduler()),
            running: AtomicBool::new(false),
            config,
            metrics: LoopMetrics::default(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Loop-wide counters
    pub fn metrics(&self) -> &LoopMetrics {
        &self.metrics
    }

    /// True while `run()` is executing and `stop()` has not been called
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Swap the active scheduling policy. Safe at any time; actor state is
    /// untouched.
    pub fn set_scheduler(&self, scheduler: Box<dyn Scheduler>) {
        *self.scheduler.lock() = scheduler;
        debug!("scheduler swapped");
    }

    /// Insert an actor into the registry, keyed by id (silent overwrite on a
    /// colliding id — ids are unique by construction). The loop's configured
    /// drain policy is stamped onto the actor; per-actor overrides go after
    /// registration. When the loop is already running the actor is
    /// immediately advanced to `Running` so late joiners participate without
    /// manual bootstrapping.
    pub fn register_actor(&self, actor: Arc<Actor>) {
        let id = actor.id().clone();
        {
            let mut registry = self.registry.write();
            if registry.actors.insert(id.clone(), actor.clone()).is_none() {
                registry.order.push(id.clone());
            }
        }
        actor.set_drain_policy(self.config.drain_policy);
        info!(actor_id = %id, name = %actor.name(), "registered actor");

        if self.is_running() {
            Self::bootstrap(&actor);
        }
    }

    /// Force-stop an actor (discarding its mailbox) and erase it from the
    /// registry. A no-op when the id is absent.
    pub fn remove_actor(&self, actor_id: &ActorId) {
        let removed = {
            let mut registry = self.registry.write();
            match registry.actors.remove(actor_id) {
                Some(actor) => {
                    registry.order.retain(|id| id != actor_id);
                    Some(actor)
                }
                None => None,
            }
        };
        if let Some(actor) = removed {
            actor.stop_immediately();
            info!(actor_id = %actor_id, name = %actor.name(), "removed actor");
        }
    }

    /// Look up an actor by id. Never returns an actor absent from the
    /// registry.
    pub fn find_actor(&self, actor_id: &ActorId) -> Option<Arc<Actor>> {
        self.registry.read().actors.get(actor_id).cloned()
    }

    /// Number of registered actors
    pub fn actor_count(&self) -> usize {
        self.registry.read().actors.len()
    }

    /// Route a message to its target's mailbox. Delivery is at-most-once and
    /// best-effort: an unknown target or a target not in `Running` drops the
    /// message with a diagnostic, and nothing is surfaced to the sender.
    pub fn deliver_message(&self, message: Message) {
        match self.find_actor(message.target_id()) {
            Some(target) if target.is_running() => {
                target.receive(message);
                self.metrics.messages_delivered.fetch_add(1, Ordering::Relaxed);
            }
            Some(target) => {
                self.metrics.messages_dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    target_id = %message.target_id(),
                    state = ?target.state(),
                    message_type = %message.message_type(),
                    "dropped message: target actor not running"
                );
            }
            None => {
                self.metrics.messages_dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    target_id = %message.target_id(),
                    message_type = %message.message_type(),
                    "dropped message: target actor not found"
                );
            }
        }
    }

    /// True iff at least one actor is Running or Stopping with a non-empty
    /// mailbox. This is the sole termination predicate of `run()`.
    pub fn has_work(&self) -> bool {
        self.registry.read().actors.values().any(|actor| {
            matches!(actor.state(), ActorState::Running | ActorState::Stopping)
                && actor.has_messages()
        })
    }

    /// Drive the run cycle until no actor has work or `stop()` is called.
    ///
    /// On entry every registered actor not yet Running is advanced through
    /// its remaining lifecycle steps. Each iteration executes one scheduling
    /// cycle then yields briefly to bound CPU usage. On exit every
    /// still-Running actor is sent a cooperative `stop()`.
    pub fn run(&self) {
        self.running.store(true, Ordering::Relaxed);
        info!("event loop started");

        for actor in self.snapshot() {
            Self::bootstrap(&actor);
        }

        let yield_for = self.config.cycle_yield();
        while self.is_running() && self.has_work() {
            self.process_one_cycle();

            if yield_for.is_zero() {
                std::thread::yield_now();
            } else {
                std::thread::sleep(yield_for);
            }
        }

        for actor in self.snapshot() {
            if actor.is_running() {
                actor.stop();
            }
        }

        info!("event loop stopped");
        self.running.store(false, Ordering::Relaxed);
    }

    /// Request the loop to exit after the current cycle. Touches no actor:
    /// actors are stopped only by `run()`'s exit sequence or by the caller.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// One scheduling cycle: gather eligible actors, let the scheduler pick
    /// exactly one, and have it process exactly one message.
    fn process_one_cycle(&self) {
        let candidates: Vec<Arc<Actor>> = {
            let registry = self.registry.read();
            registry
                .ordered()
                .into_iter()
                .filter(|actor| {
                    matches!(actor.state(), ActorState::Running | ActorState::Stopping)
                        && actor.has_messages()
                })
                .collect()
        };

        if candidates.is_empty() {
            return;
        }

        // The scheduler lock is released before processing so a handler may
        // swap the scheduler mid-run.
        let chosen = self.scheduler.lock().next_actor(&candidates);
        if let Some(actor) = chosen {
            actor.process_next_message();
            self.metrics.cycles.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> Vec<Arc<Actor>> {
        self.registry.read().ordered()
    }

    /// Advance an actor to Running from wherever its lifecycle stands
    fn bootstrap(actor: &Arc<Actor>) {
        match actor.state() {
            ActorState::Created => {
                actor.initialize();
                actor.start();
            }
            ActorState::Initialized => {
                actor.start();
            }
            _ => {}
        }
    }
}
