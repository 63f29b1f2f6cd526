//! Scheduling Policies
//!
//! A scheduler is a pure selection policy: given the actors currently
//! eligible to run (Running or Stopping, with at least one queued message),
//! pick exactly one. Schedulers only decide *which actor* processes its next
//! message — they never reorder messages inside a mailbox.
//!
//! Four policies ship with the runtime:
//! - [`RoundRobinScheduler`] — rotating cursor over the candidate list
//! - [`PriorityScheduler`] — maximizes a pluggable per-actor score
//! - [`MessagePriorityScheduler`] — greatest pending message priority
//! - [`FairScheduler`] — starvation-bounded, oldest-selected-first

use crate::actor::{Actor, ActorId};
use crate::messages::Priority;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default ceiling on how long a continuously-eligible actor may go
/// unselected by the [`FairScheduler`]
pub const DEFAULT_STARVATION_THRESHOLD: Duration = Duration::from_secs(5);

/// Selection policy over the eligible-actor set
pub trait Scheduler: Send {
    /// Pick one actor from a non-empty candidate set, or none from an empty
    /// set. Candidates arrive in the event loop's registration order.
    fn next_actor(&mut self, candidates: &[Arc<Actor>]) -> Option<Arc<Actor>>;
}

/// Rotating-cursor scheduler.
///
/// The cursor rotates over the candidate list *as currently presented*, not
/// over the full registry, so when the candidate set changes between cycles
/// this approximates round-robin rather than enforcing a strict global
/// rotation.
pub struct RoundRobinScheduler {
    current_index: usize,
}

impl RoundRobinScheduler {
    pub fn new() -> Self {
        Self { current_index: 0 }
    }
}

impl Default for RoundRobinScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for RoundRobinScheduler {
    fn next_actor(&mut self, candidates: &[Arc<Actor>]) -> Option<Arc<Actor>> {
        if candidates.is_empty() {
            return None;
        }
        if self.current_index >= candidates.len() {
            self.current_index = 0;
        }
        let chosen = candidates[self.current_index].clone();
        self.current_index = (self.current_index + 1) % candidates.len();
        Some(chosen)
    }
}

/// Per-actor priority score
pub type PriorityFn = Box<dyn Fn(&Actor) -> i64 + Send>;

/// Highest-score-wins scheduler with a pluggable scoring function.
///
/// The default score is queue-depth-degenerate: any actor with at least one
/// queued message scores 1, else 0 — so among non-empty candidates it
/// resolves to the first in list order.
pub struct PriorityScheduler {
    priority_fn: PriorityFn,
}

impl PriorityScheduler {
    pub fn new() -> Self {
        Self {
            priority_fn: Box::new(|actor| if actor.has_messages() { 1 } else { 0 }),
        }
    }

    /// Use a custom scoring function
    pub fn with_priority_fn<F>(priority_fn: F) -> Self
    where
        F: Fn(&Actor) -> i64 + Send + 'static,
    {
        Self {
            priority_fn: Box::new(priority_fn),
        }
    }
}

impl Default for PriorityScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for PriorityScheduler {
    fn next_actor(&mut self, candidates: &[Arc<Actor>]) -> Option<Arc<Actor>> {
        // Strict greater-than keeps the first maximal candidate on ties.
        let mut best: Option<(&Arc<Actor>, i64)> = None;
        for actor in candidates {
            let score = (self.priority_fn)(actor);
            match best {
                Some((_, current)) if score <= current => {}
                _ => best = Some((actor, score)),
            }
        }
        best.map(|(actor, _)| actor.clone())
    }
}

/// Selects the candidate whose highest-priority pending message has the
/// greatest priority value. An empty peek ranks below every priority; ties
/// resolve to the first candidate in list order.
pub struct MessagePriorityScheduler;

impl MessagePriorityScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MessagePriorityScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for MessagePriorityScheduler {
    fn next_actor(&mut self, candidates: &[Arc<Actor>]) -> Option<Arc<Actor>> {
        let mut best: Option<(&Arc<Actor>, Option<Priority>)> = None;
        for actor in candidates {
            let peeked = actor
                .peek_highest_priority_message()
                .map(|message| message.priority());
            match &best {
                Some((_, current)) if peeked <= *current => {}
                _ => best = Some((actor, peeked)),
            }
        }
        best.map(|(actor, _)| actor.clone())
    }
}

/// Starvation-bounded fair scheduler.
///
/// Tracks when each actor was last selected. Candidates never selected, or
/// last selected longer ago than the starvation threshold, win immediately
/// (first such in list order); otherwise the candidate with the oldest
/// last-selected stamp wins. Every selection stamps the winner, so no
/// continuously-eligible actor waits beyond the threshold while others are
/// repeatedly chosen.
pub struct FairScheduler {
    last_scheduled: HashMap<ActorId, Instant>,
    max_starvation: Duration,
}

impl FairScheduler {
    pub fn new(max_starvation: Duration) -> Self {
        Self {
            last_scheduled: HashMap::new(),
            max_starvation,
        }
    }

    /// Threshold currently in force
    pub fn max_starvation(&self) -> Duration {
        self.max_starvation
    }
}

impl Default for FairScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_STARVATION_THRESHOLD)
    }
}

impl Scheduler for FairScheduler {
    fn next_actor(&mut self, candidates: &[Arc<Actor>]) -> Option<Arc<Actor>> {
        if candidates.is_empty() {
            return None;
        }
        let now = Instant::now();

        for actor in candidates {
            let starved = match self.last_scheduled.get(actor.id()) {
                None => true,
                Some(stamp) => now.duration_since(*stamp) > self.max_starvation,
            };
            if starved {
                self.last_scheduled.insert(actor.id().clone(), now);
                return Some(actor.clone());
            }
        }

        // Everyone has a recent stamp; take the oldest one.
        let chosen = candidates
            .iter()
            .min_by_key(|actor| self.last_scheduled.get(actor.id()).copied())
            .cloned();
        if let Some(actor) = &chosen {
            self.last_scheduled.insert(actor.id().clone(), now);
        }
        chosen
    }
}
