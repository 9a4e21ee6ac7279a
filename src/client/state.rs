//! Connection state owned by the lifecycle manager.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tokio::time::Instant;

use crate::transport::PushTransport;

// ============================================================================
// ConnectionState
// ============================================================================

/// Mutable per-session state.
///
/// Only [`ClientInner`](super::core::ClientInner) touches this; the monitor
/// and dispatch paths go through its methods.
#[derive(Default)]
pub(crate) struct ConnectionState {
    /// Whether the push channel is up.
    pub(crate) connected: bool,
    /// Last inbound event, successful command or state change.
    pub(crate) last_activity: Option<Instant>,
    /// Attempts made in the current retry campaign.
    pub(crate) reconnect_attempts: u32,
    /// Current push transport handle.
    pub(crate) transport: Option<Arc<dyn PushTransport>>,
    /// Bumped for every new handle; handlers carry the value they were
    /// created with.
    pub(crate) generation: u64,
}

impl ConnectionState {
    /// Records activity now.
    #[inline]
    pub(crate) fn touch(&mut self) {
        self.last_activity = Some(Instant::now());
    }

    /// Starts a new handle generation, returning the previous handle.
    pub(crate) fn replace_transport(
        &mut self,
        transport: Arc<dyn PushTransport>,
    ) -> (u64, Option<Arc<dyn PushTransport>>) {
        self.generation += 1;
        self.connected = false;
        let previous = self.transport.replace(transport);
        (self.generation, previous)
    }

    /// Detaches the current handle and marks the session disconnected.
    pub(crate) fn take_transport(&mut self) -> Option<Arc<dyn PushTransport>> {
        self.connected = false;
        self.transport.take()
    }

    /// Returns `true` if handlers from `generation` are still current.
    #[inline]
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.transport.is_some() && self.generation == generation
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::transport::SocketIoTransport;

    #[test]
    fn test_default_is_disconnected() {
        let state = ConnectionState::default();
        assert!(!state.connected);
        assert!(state.last_activity.is_none());
        assert_eq!(state.reconnect_attempts, 0);
        assert!(state.transport.is_none());
    }

    #[test]
    fn test_replace_transport_starts_new_generation() {
        let mut state = ConnectionState::default();

        let (first, previous) = state.replace_transport(Arc::new(SocketIoTransport::new()));
        assert!(previous.is_none());
        assert!(state.is_current(first));

        state.connected = true;
        let (second, previous) = state.replace_transport(Arc::new(SocketIoTransport::new()));
        assert!(previous.is_some());
        assert!(!state.connected);
        assert!(!state.is_current(first));
        assert!(state.is_current(second));
    }

    #[test]
    fn test_take_transport_detaches_handle() {
        let mut state = ConnectionState::default();
        let (generation, _) = state.replace_transport(Arc::new(SocketIoTransport::new()));
        state.connected = true;

        assert!(state.take_transport().is_some());
        assert!(!state.connected);
        assert!(!state.is_current(generation));
        assert!(state.take_transport().is_none());
    }
}
