//! Push channel transport seam.
//!
//! The lifecycle manager treats the push channel as an opaque handle: it
//! asks a [`TransportFactory`] for a fresh [`PushTransport`] on every
//! connect attempt, wires the three [`PushHandlers`] roles into it, and
//! then drives `connect` / `disconnect`. Handles are never reused.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

// ============================================================================
// Types
// ============================================================================

/// Inbound event callback: `(event name, payload)`.
pub type EventHandler = Arc<dyn Fn(String, Value) + Send + Sync>;

/// Connect / disconnect callback.
pub type LifecycleHandler = Arc<dyn Fn() + Send + Sync>;

// ============================================================================
// PushHandlers
// ============================================================================

/// The three handler roles a push transport must support.
#[derive(Clone)]
pub struct PushHandlers {
    /// Wildcard handler for every inbound event.
    pub on_event: EventHandler,
    /// Fired when the low-level connection is established.
    pub on_connect: LifecycleHandler,
    /// Fired when the low-level connection is lost or closed.
    pub on_disconnect: LifecycleHandler,
}

impl PushHandlers {
    /// Handlers that ignore everything.
    #[must_use]
    pub fn noop() -> Self {
        Self {
            on_event: Arc::new(|_, _| {}),
            on_connect: Arc::new(|| {}),
            on_disconnect: Arc::new(|| {}),
        }
    }
}

// ============================================================================
// PushTransport
// ============================================================================

/// A persistent push channel to the controller.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Installs the handlers. Called once, before `connect`.
    fn set_handlers(&self, handlers: PushHandlers);

    /// Opens the channel against `url` (`http://<ip>:<port>`).
    ///
    /// Implementations must fire `on_connect` before returning `Ok`; the
    /// session is only marked connected through that handler.
    ///
    /// # Errors
    ///
    /// Any transport failure; the caller logs and retries.
    async fn connect(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Closes the channel. Closing an unopened handle is a no-op.
    ///
    /// # Errors
    ///
    /// Failures while closing; the caller logs and discards them.
    async fn disconnect(&self) -> Result<()>;
}

// ============================================================================
// TransportFactory
// ============================================================================

/// Creates fresh push transport handles.
pub trait TransportFactory: Send + Sync {
    /// Returns a new, unconnected handle.
    fn create(&self) -> Arc<dyn PushTransport>;
}

impl<F> TransportFactory for F
where
    F: Fn() -> Arc<dyn PushTransport> + Send + Sync,
{
    fn create(&self) -> Arc<dyn PushTransport> {
        self()
    }
}
