//! Message Data Model
//!
//! Immutable, freely clonable unit of actor communication: a type tag for
//! handler dispatch, sender/target addressing, a keyed heterogeneous payload,
//! a monotonic creation timestamp, and a priority level. Priority is the only
//! field a sender may re-tag before delivery.

use crate::actor::ActorId;
use crate::error::{PayloadError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Message priority, totally ordered `Low < Normal < High < Critical`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Background traffic
    Low,
    /// Default priority
    #[default]
    Normal,
    /// Latency-sensitive but not critical
    High,
    /// Must-run-next system messages
    Critical,
}

/// One unit of communication between actors
#[derive(Debug, Clone)]
pub struct Message {
    /// Dispatch key used to look up a handler on the target
    message_type: String,
    /// Originating actor, `None` when seeded from outside the runtime
    sender_id: Option<ActorId>,
    /// Destination actor
    target_id: ActorId,
    /// Keyed heterogeneous payload
    payload: HashMap<String, Value>,
    /// Stamped at construction, not at send time
    created_at: Instant,
    priority: Priority,
}

impl Message {
    /// Create a message addressed to `target_id` with an empty payload and
    /// `Priority::Normal`. The creation timestamp is stamped here.
    pub fn new(message_type: impl Into<String>, target_id: ActorId) -> Self {
        Self {
            message_type: message_type.into(),
            sender_id: None,
            target_id,
            payload: HashMap::new(),
            created_at: Instant::now(),
            priority: Priority::default(),
        }
    }

    /// Set the sender. `Actor::send` overwrites this with the sending
    /// actor's own id; external seeders use it to make replies routable.
    pub fn with_sender(mut self, sender_id: ActorId) -> Self {
        self.sender_id = Some(sender_id);
        self
    }

    /// Replace the whole payload map
    pub fn with_payload(mut self, payload: HashMap<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    /// Insert one payload entry. Values that fail JSON conversion are stored
    /// as `Value::Null`.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.payload.insert(key.into(), value);
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Re-tag the priority in place
    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    /// Rewrite addressing before delivery through the event loop
    pub(crate) fn readdress(mut self, sender_id: ActorId, target_id: ActorId) -> Self {
        self.sender_id = Some(sender_id);
        self.target_id = target_id;
        self
    }

    /// Dispatch key
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// Originating actor, if any
    pub fn sender_id(&self) -> Option<&ActorId> {
        self.sender_id.as_ref()
    }

    /// Destination actor
    pub fn target_id(&self) -> &ActorId {
        &self.target_id
    }

    /// The full payload map
    pub fn payload(&self) -> &HashMap<String, Value> {
        &self.payload
    }

    /// Creation timestamp (monotonic)
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Time elapsed since construction
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// True when the payload carries `key`
    pub fn has_payload_key(&self, key: &str) -> bool {
        self.payload.contains_key(key)
    }

    /// Read a typed value out of the payload. Missing key and type mismatch
    /// are distinguishable failures.
    pub fn payload_value<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let value = self
            .payload
            .get(key)
            .ok_or_else(|| PayloadError::missing_key(key))?;
        serde_json::from_value(value.clone())
            .map_err(|e| PayloadError::type_mismatch(key, std::any::type_name::<T>(), e))
    }

    /// Read a typed value, substituting `default` for a missing key or a
    /// mismatched type. Never propagates.
    pub fn payload_value_or<T>(&self, key: &str, default: T) -> T
    where
        T: serde::de::DeserializeOwned,
    {
        self.payload_value(key).unwrap_or(default)
    }
}
