//! Actor Lifecycle and Mailbox
//!
//! An actor owns a FIFO mailbox, a handler table keyed by message type, and a
//! lifecycle state machine (`Created → Initialized → Running → Stopping →
//! Stopped`). All public operations are atomic at the call boundary: the
//! lifecycle state and the mailbox live behind one mutex so transitions that
//! inspect the mailbox cannot race concurrent senders. Handlers always run
//! with no internal lock held, so a handler may freely call `send`,
//! `register_handler`, or `create_child` on its own actor.

use crate::event_loop::EventLoop;
use crate::messages::Message;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};
use uuid::Uuid;

use parking_lot::Mutex;

/// Unique actor identifier, generated at construction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorId {
    id: Uuid,
}

impl ActorId {
    /// Create new actor ID
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    /// Create from UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self { id }
    }

    /// Get UUID
    pub fn uuid(&self) -> Uuid {
        self.id
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.id.simple())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

/// Actor lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    /// Constructed but not yet initialized
    Created,
    /// Handlers registered, not yet processing
    Initialized,
    /// Accepting and processing messages
    Running,
    /// Draining the mailbox toward Stopped
    Stopping,
    /// Terminal
    Stopped,
}

/// Whether an actor draining toward `Stopped` still accepts new messages.
///
/// Accepting while draining means a persistent sender can keep the drain from
/// ever terminating; rejecting bounds the drain at the messages already
/// queued when `stop()` was called.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DrainPolicy {
    /// `receive` keeps enqueuing while Stopping (default)
    #[default]
    AcceptWhileDraining,
    /// `receive` drops messages once Stopping
    RejectWhileDraining,
}

/// Handler for one message type. Invoked with the owning actor so the body
/// can reply via `actor.send`.
pub type MessageHandler = Arc<dyn Fn(&Actor, &Message) + Send + Sync>;

/// Concrete actor surface: registers handlers before first use and may
/// observe lifecycle transitions.
pub trait Behavior: Send + Sync {
    /// Register message-type handlers. Runs exactly once, on the
    /// `Created → Initialized` transition.
    fn initialize(&self, actor: &Actor);

    /// Observe a lifecycle transition. Purely informational; must not panic.
    fn on_state_changed(&self, _old: ActorState, _new: ActorState) {}
}

/// Lifecycle state and mailbox, guarded together
struct ActorCell {
    state: ActorState,
    mailbox: VecDeque<Message>,
    drain_policy: DrainPolicy,
}

/// Independent computational unit owning a mailbox and message handlers
pub struct Actor {
    id: ActorId,
    name: String,
    cell: Mutex<ActorCell>,
    handlers: Mutex<HashMap<String, MessageHandler>>,
    behavior: Option<Arc<dyn Behavior>>,
    /// Non-owning back-reference used to route outbound sends
    event_loop: Weak<EventLoop>,
    messages_processed: AtomicU64,
    messages_unhandled: AtomicU64,
    messages_dropped: AtomicU64,
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state())
            .field("mailbox_len", &self.message_count())
            .finish()
    }
}

impl Actor {
    /// Create a new actor in `Created` state
    pub fn new(name: impl Into<String>, event_loop: Weak<EventLoop>) -> Arc<Self> {
        Self::build(name, event_loop, None)
    }

    /// Create a new actor whose handlers and observers come from `behavior`
    pub fn with_behavior(
        name: impl Into<String>,
        event_loop: Weak<EventLoop>,
        behavior: Arc<dyn Behavior>,
    ) -> Arc<Self> {
        Self::build(name, event_loop, Some(behavior))
    }

    fn build(
        name: impl Into<String>,
        event_loop: Weak<EventLoop>,
        behavior: Option<Arc<dyn Behavior>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: ActorId::new(),
            name: name.into(),
            cell: Mutex::new(ActorCell {
                state: ActorState::Created,
                mailbox: VecDeque::new(),
                drain_policy: DrainPolicy::default(),
            }),
            handlers: Mutex::new(HashMap::new()),
            behavior,
            event_loop,
            messages_processed: AtomicU64::new(0),
            messages_unhandled: AtomicU64::new(0),
            messages_dropped: AtomicU64::new(0),
        })
    }

    /// Unique identifier
    pub fn id(&self) -> &ActorId {
        &self.id
    }

    /// Human-readable label
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state
    pub fn state(&self) -> ActorState {
        self.cell.lock().state
    }

    /// True when in `Running` state
    pub fn is_running(&self) -> bool {
        self.state() == ActorState::Running
    }

    /// True when the mailbox is non-empty
    pub fn has_messages(&self) -> bool {
        !self.cell.lock().mailbox.is_empty()
    }

    /// Number of queued messages
    pub fn message_count(&self) -> usize {
        self.cell.lock().mailbox.len()
    }

    /// Messages popped and dispatched to a handler
    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    /// Messages consumed without a registered handler
    pub fn messages_unhandled(&self) -> u64 {
        self.messages_unhandled.load(Ordering::Relaxed)
    }

    /// Messages rejected by `receive`
    pub fn messages_dropped(&self) -> u64 {
        self.messages_dropped.load(Ordering::Relaxed)
    }

    /// Current drain policy
    pub fn drain_policy(&self) -> DrainPolicy {
        self.cell.lock().drain_policy
    }

    /// Set whether `receive` accepts messages while Stopping
    pub fn set_drain_policy(&self, policy: DrainPolicy) {
        self.cell.lock().drain_policy = policy;
        debug!(actor_id = %self.id, policy = ?policy, "drain policy set");
    }

    /// Move `Created → Initialized` and run the behavior's initialize hook.
    /// A no-op with a diagnostic from any other state.
    pub fn initialize(&self) {
        let old = {
            let mut cell = self.cell.lock();
            if cell.state != ActorState::Created {
                let state = cell.state;
                drop(cell);
                warn!(
                    actor_id = %self.id,
                    name = %self.name,
                    state = ?state,
                    "cannot initialize actor outside Created state"
                );
                return;
            }
            cell.state = ActorState::Initialized;
            ActorState::Created
        };
        self.notify_state_changed(old, ActorState::Initialized);

        if let Some(behavior) = &self.behavior {
            behavior.initialize(self);
        }
    }

    /// Move `Initialized → Running`. A no-op with a diagnostic from any
    /// other state.
    pub fn start(&self) {
        let old = {
            let mut cell = self.cell.lock();
            if cell.state != ActorState::Initialized {
                let state = cell.state;
                drop(cell);
                warn!(
                    actor_id = %self.id,
                    name = %self.name,
                    state = ?state,
                    "cannot start actor outside Initialized state"
                );
                return;
            }
            cell.state = ActorState::Running;
            ActorState::Initialized
        };
        self.notify_state_changed(old, ActorState::Running);
    }

    /// Request a cooperative stop. Moves to `Stopping`, collapsing
    /// immediately to `Stopped` when the mailbox is already empty; otherwise
    /// the transition finalizes on the processing step that drains the last
    /// message. Idempotent from `Stopping`/`Stopped`.
    pub fn stop(&self) {
        let transitions = {
            let mut cell = self.cell.lock();
            match cell.state {
                ActorState::Stopping | ActorState::Stopped => return,
                old => {
                    if cell.mailbox.is_empty() {
                        cell.state = ActorState::Stopped;
                        vec![
                            (old, ActorState::Stopping),
                            (ActorState::Stopping, ActorState::Stopped),
                        ]
                    } else {
                        cell.state = ActorState::Stopping;
                        vec![(old, ActorState::Stopping)]
                    }
                }
            }
        };
        for (old, new) in transitions {
            self.notify_state_changed(old, new);
        }
    }

    /// Discard all queued messages and force `Stopped` unconditionally.
    /// Idempotent: runs even from `Stopped`.
    pub fn stop_immediately(&self) {
        let (old, discarded) = {
            let mut cell = self.cell.lock();
            let old = cell.state;
            let discarded = cell.mailbox.len();
            cell.mailbox.clear();
            cell.state = ActorState::Stopped;
            (old, discarded)
        };
        if discarded > 0 {
            debug!(
                actor_id = %self.id,
                name = %self.name,
                discarded,
                "discarded queued messages on immediate stop"
            );
        }
        self.notify_state_changed(old, ActorState::Stopped);
    }

    /// Enqueue a message. Accepted while `Running`, and while `Stopping`
    /// under `DrainPolicy::AcceptWhileDraining`; otherwise dropped with a
    /// diagnostic and nothing surfaced to the caller.
    pub fn receive(&self, message: Message) {
        let mut cell = self.cell.lock();
        let accept = match cell.state {
            ActorState::Running => true,
            ActorState::Stopping => cell.drain_policy == DrainPolicy::AcceptWhileDraining,
            _ => false,
        };
        if accept {
            cell.mailbox.push_back(message);
        } else {
            let state = cell.state;
            drop(cell);
            self.messages_dropped.fetch_add(1, Ordering::Relaxed);
            warn!(
                actor_id = %self.id,
                name = %self.name,
                state = ?state,
                message_type = %message.message_type(),
                "actor rejected message"
            );
        }
    }

    /// Pop the oldest message and dispatch it to the handler registered for
    /// its type. Returns false when nothing was processed (`Stopped`, or
    /// empty mailbox — finalizing `Stopping → Stopped` as a side effect).
    /// A message with no registered handler is consumed with a diagnostic.
    pub fn process_next_message(&self) -> bool {
        let message = {
            let mut cell = self.cell.lock();
            if cell.state == ActorState::Stopped {
                return false;
            }
            match cell.mailbox.pop_front() {
                Some(message) => message,
                None => {
                    if cell.state == ActorState::Stopping {
                        cell.state = ActorState::Stopped;
                        drop(cell);
                        self.notify_state_changed(ActorState::Stopping, ActorState::Stopped);
                    }
                    return false;
                }
            }
        };

        let handler = self.handlers.lock().get(message.message_type()).cloned();
        match handler {
            Some(handler) => {
                handler(self, &message);
                self.messages_processed.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.messages_unhandled.fetch_add(1, Ordering::Relaxed);
                warn!(
                    actor_id = %self.id,
                    name = %self.name,
                    message_type = %message.message_type(),
                    "no handler for message type"
                );
            }
        }

        // The pop above may have drained the last message of a stopping actor.
        let finalized = {
            let mut cell = self.cell.lock();
            if cell.state == ActorState::Stopping && cell.mailbox.is_empty() {
                cell.state = ActorState::Stopped;
                true
            } else {
                false
            }
        };
        if finalized {
            self.notify_state_changed(ActorState::Stopping, ActorState::Stopped);
        }

        true
    }

    /// Register a handler for a message type. The last registration for a
    /// given type wins.
    pub fn register_handler<F>(&self, message_type: impl Into<String>, handler: F)
    where
        F: Fn(&Actor, &Message) + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .insert(message_type.into(), Arc::new(handler));
    }

    /// Send a message to another actor through the owning event loop. The
    /// sender and target fields are rewritten to this actor's id and
    /// `target_id` before delivery. Fails with a diagnostic only when the
    /// loop reference is dead.
    pub fn send(&self, target_id: &ActorId, message: Message) {
        let Some(event_loop) = self.event_loop.upgrade() else {
            warn!(
                actor_id = %self.id,
                name = %self.name,
                message_type = %message.message_type(),
                "cannot send message: event loop no longer exists"
            );
            return;
        };
        event_loop.deliver_message(message.readdress(self.id.clone(), target_id.clone()));
    }

    /// Create a child actor sharing this actor's event loop and register it.
    /// Returns `None` when the loop reference is dead.
    pub fn create_child(&self, name: impl Into<String>) -> Option<Arc<Actor>> {
        let Some(event_loop) = self.event_loop.upgrade() else {
            warn!(
                actor_id = %self.id,
                name = %self.name,
                "cannot create child actor: event loop no longer exists"
            );
            return None;
        };
        let child = Actor::new(name, Arc::downgrade(&event_loop));
        event_loop.register_actor(child.clone());
        Some(child)
    }

    /// Next message in FIFO order, without removing it
    pub fn peek_next_message(&self) -> Option<Message> {
        self.cell.lock().mailbox.front().cloned()
    }

    /// Highest-priority queued message, without removing it. Ties resolve to
    /// the earliest arrival. `None` on an empty mailbox.
    pub fn peek_highest_priority_message(&self) -> Option<Message> {
        let cell = self.cell.lock();
        let mut best: Option<&Message> = None;
        for message in &cell.mailbox {
            match best {
                Some(current) if message.priority() <= current.priority() => {}
                _ => best = Some(message),
            }
        }
        best.cloned()
    }

    fn notify_state_changed(&self, old: ActorState, new: ActorState) {
        debug!(
            actor_id = %self.id,
            name = %self.name,
            from = ?old,
            to = ?new,
            "actor state changed"
        );
        if let Some(behavior) = &self.behavior {
            behavior.on_state_changed(old, new);
        }
    }
}
