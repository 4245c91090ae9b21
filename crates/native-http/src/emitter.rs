//! Event subscription for native completion events
//!
//! The native layer multiplexes every request through two shared channels,
//! `onSuccess` and `onError`. Listeners register per channel and filter by
//! token themselves.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::event::NativeEvent;

/// Native event channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventName {
    /// Request completed with a response
    #[serde(rename = "onSuccess")]
    Success,
    /// Request failed or was canceled
    #[serde(rename = "onError")]
    Error,
}

impl EventName {
    /// Wire name of the channel
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::Success => "onSuccess",
            EventName::Error => "onError",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "onSuccess" => Ok(EventName::Success),
            "onError" => Ok(EventName::Error),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown event name: {other}"
            ))),
        }
    }
}

type Handler = Arc<dyn Fn(&NativeEvent) + Send + Sync>;

/// Listeners keyed by channel and a unique subscription id
type ListenerTree = Arc<RwLock<BTreeMap<(EventName, usize), Handler>>>;

/// Dispatcher for native completion events.
///
/// Cloning yields another handle to the same listener set. The host glue
/// calls [`EventEmitter::emit`] whenever the native module reports a
/// completion.
#[derive(Clone, Default)]
pub struct EventEmitter {
    listeners: ListenerTree,
    unique_subscription_counter: Arc<AtomicUsize>,
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

impl EventEmitter {
    /// Create an emitter without listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events on `name`.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// removed or dropped.
    pub fn add_listener<F>(&self, name: EventName, handler: F) -> Subscription
    where
        F: Fn(&NativeEvent) + Send + Sync + 'static,
    {
        let id = self
            .unique_subscription_counter
            .fetch_add(1, Ordering::Relaxed);

        self.listeners.write().insert((name, id), Arc::new(handler));

        Subscription {
            id,
            name,
            listeners: self.listeners.clone(),
            removed: AtomicBool::new(false),
        }
    }

    /// Deliver `event` to every listener of `name`, returning how many were called.
    ///
    /// Handlers run after the listener lock is released, so a handler may add
    /// or remove subscriptions, its own included.
    pub fn emit(&self, name: EventName, event: &NativeEvent) -> usize {
        let handlers: Vec<Handler> = {
            let listeners = self.listeners.read();
            listeners
                .range((name, 0)..)
                .take_while(|((listener_name, _), _)| *listener_name == name)
                .map(|(_, handler)| handler.clone())
                .collect()
        };

        for handler in handlers.iter() {
            handler(event);
        }

        handlers.len()
    }

    /// Number of live listeners on `name`
    pub fn listener_count(&self, name: EventName) -> usize {
        self.listeners
            .read()
            .range((name, 0)..)
            .take_while(|((listener_name, _), _)| *listener_name == name)
            .count()
    }
}

/// Handle for a registered listener
pub struct Subscription {
    id: usize,
    name: EventName,
    listeners: ListenerTree,
    removed: AtomicBool,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Subscription {
    /// Channel this subscription listens on
    pub fn name(&self) -> EventName {
        self.name
    }

    /// Whether the listener is still registered
    pub fn is_active(&self) -> bool {
        !self.removed.load(Ordering::Acquire)
    }

    /// Unregister the listener. Calling it more than once has no effect.
    pub fn remove(&self) {
        if self.removed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.listeners.write().remove(&(self.name, self.id));
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}
