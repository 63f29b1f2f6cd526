//! Prioritized Actor Runtime
//!
//! Minimal in-process actor runtime: independent actors exchange typed,
//! prioritized messages through a central event loop that repeatedly asks a
//! pluggable scheduler which actor should process its next message. Each
//! scheduling cycle advances global progress by exactly one message, which is
//! what makes scheduler choice meaningful and observable.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐    ┌─────────────────────┐
//! │          Event Loop          │    │      Scheduler      │
//! │                              │    │                     │
//! │  registry: id → Actor        │───▶│  RoundRobin         │
//! │  run cycle:                  │    │  Priority           │
//! │    eligible set ─▶ pick one  │    │  MessagePriority    │
//! │    ─▶ process one message    │    │  Fair               │
//! └──────────────┬───────────────┘    └─────────────────────┘
//!                │ deliver_message
//!        ┌───────▼────────┐
//!        │     Actor      │  Created → Initialized → Running
//!        │  FIFO mailbox  │            → Stopping → Stopped
//!        │  handler table │
//!        └────────────────┘
//! ```
//!
//! Delivery is in-process, at-most-once, and best-effort: a message to an
//! unknown or non-running actor is dropped with a diagnostic. Within one
//! actor, messages are always processed in FIFO arrival order; schedulers
//! only decide which actor runs next.
//!
//! # Examples
//!
//! ```rust
//! use rotor_actors::{Actor, EventLoop, Message};
//! use std::sync::Arc;
//!
//! let event_loop = EventLoop::new();
//!
//! let echo = Actor::new("echo", Arc::downgrade(&event_loop));
//! echo.register_handler("echo", |_actor, msg| {
//!     println!("{}", msg.payload_value_or::<String>("text", String::new()));
//! });
//! event_loop.register_actor(echo.clone());
//! echo.initialize();
//! echo.start();
//!
//! event_loop.deliver_message(
//!     Message::new("echo", echo.id().clone()).with_value("text", "hello"),
//! );
//!
//! // drains to quiescence, then stops every actor
//! event_loop.run();
//! ```

pub mod actor;
pub mod config;
pub mod error;
pub mod event_loop;
pub mod messages;
pub mod scheduler;

pub use actor::{Actor, ActorId, ActorState, Behavior, DrainPolicy, MessageHandler};
pub use config::{RuntimeConfig, SchedulerKind};
pub use error::{PayloadError, Result};
pub use event_loop::{EventLoop, LoopMetrics, LoopStats};
pub use messages::{Message, Priority};
pub use scheduler::{
    FairScheduler, MessagePriorityScheduler, PriorityFn, PriorityScheduler, RoundRobinScheduler,
    Scheduler, DEFAULT_STARVATION_THRESHOLD,
};
