//! Event dispatch registry.
//!
//! Maps each recognized event to a set of callbacks. Set membership is by
//! identity: the same `Arc` registered twice for one event is stored once.
//!
//! # Dispatch
//!
//! Callbacks run synchronously on the task that delivered the event, in no
//! particular order. A panicking callback is caught and logged; its
//! siblings still run.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::protocol::InboundEvent;

use super::unknown::UnknownEventLog;

// ============================================================================
// Types
// ============================================================================

/// Event callback. Receives the event payload.
pub type Callback = Arc<dyn Fn(&Value) + Send + Sync>;

// ============================================================================
// EventRegistry
// ============================================================================

/// Event name → callback set.
#[derive(Default)]
pub struct EventRegistry {
    callbacks: RwLock<FxHashMap<InboundEvent, Vec<Callback>>>,
    unknown_log: Option<UnknownEventLog>,
}

impl EventRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry that records unknown events to `log`.
    #[inline]
    #[must_use]
    pub fn with_unknown_log(log: Option<UnknownEventLog>) -> Self {
        Self {
            callbacks: RwLock::default(),
            unknown_log: log,
        }
    }

    /// Registers `callback` for `event`. Registering the same callback
    /// again is a no-op.
    pub fn on(&self, event: InboundEvent, callback: Callback) {
        let mut callbacks = self.callbacks.write();
        let set = callbacks.entry(event).or_default();
        if !set.iter().any(|existing| same_callback(existing, &callback)) {
            debug!(%event, "Registering callback");
            set.push(callback);
        }
    }

    /// Unregisters `callback` from `event`. Removing the last callback
    /// drops the event's entry.
    pub fn off(&self, event: InboundEvent, callback: &Callback) {
        let mut callbacks = self.callbacks.write();
        if let Some(set) = callbacks.get_mut(&event) {
            set.retain(|existing| !same_callback(existing, callback));
            if set.is_empty() {
                callbacks.remove(&event);
            }
        }
    }

    /// Clears callbacks for `event`, or for every event when `None`.
    pub fn remove(&self, event: Option<InboundEvent>) {
        let mut callbacks = self.callbacks.write();
        match event {
            Some(event) => {
                callbacks.remove(&event);
            }
            None => callbacks.clear(),
        }
    }

    /// Returns the number of callbacks registered for `event`.
    #[must_use]
    pub fn callback_count(&self, event: InboundEvent) -> usize {
        self.callbacks.read().get(&event).map_or(0, Vec::len)
    }

    /// Returns `true` if any event has a callback.
    #[must_use]
    pub fn has_callbacks(&self) -> bool {
        !self.callbacks.read().is_empty()
    }

    /// Delivers `payload` to every callback registered for `event`.
    ///
    /// Unrecognized names are logged and, when configured, appended to the
    /// unknown-event log. Returns the number of callbacks invoked.
    pub fn dispatch(&self, event: &str, payload: &Value) -> usize {
        debug!(event, "Handling event");

        let Some(known) = InboundEvent::from_name(event) else {
            warn!(event, data = %payload, "Unknown event received");
            if let Some(log) = &self.unknown_log
                && let Err(e) = log.append(event, payload)
            {
                warn!(event, path = %log.path().display(), error = %e, "Failed to record unknown event");
            }
            return 0;
        };

        // Snapshot so callbacks may (un)register without deadlocking.
        let callbacks: Vec<Callback> = self
            .callbacks
            .read()
            .get(&known)
            .cloned()
            .unwrap_or_default();

        for callback in &callbacks {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(payload))) {
                error!(event, error = panic_message(&*panic), "Error in event callback");
            }
        }

        callbacks.len()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Identity comparison, ignoring vtable pointers.
fn same_callback(a: &Callback, b: &Callback) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "callback panicked"
    }
}

// ============================================================================
// Tests
// ============================================================================
