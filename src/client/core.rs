//! Connection lifecycle manager.
//!
//! [`Client`] is the single authority over the push channel: it opens,
//! closes and reports on it, and owns the background monitor that heals it.
//!
//! # Lifecycle
//!
//! ```text
//!   build() ──► disconnected ──connect()──► connected ◄──┐
//!                    ▲                          │        │ monitor:
//!                    │                          ▼        │ probe / reconnect
//!                    └──── disconnect() ◄── stale / dropped ┘
//! ```
//!
//! Every `connect` creates a fresh transport handle and wires the three
//! push handlers into it; handles are never reused across reconnects.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::events::{Callback, EventRegistry, UnknownEventLog};
use crate::protocol::InboundEvent;
use crate::transport::{HttpTransport, PushHandlers, TransportFactory};

use super::builder::ClientBuilder;
use super::config::{ClientConfig, DEFAULT_CONNECT_TIMEOUT};
use super::monitor;
use super::state::ConnectionState;

// ============================================================================
// ClientInner
// ============================================================================

/// Shared state behind every [`Client`] handle.
pub(crate) struct ClientInner {
    /// Session configuration.
    pub(crate) config: ClientConfig,
    /// Event callbacks.
    pub(crate) registry: EventRegistry,
    /// Creates push transport handles.
    push_factory: Arc<dyn TransportFactory>,
    /// Command channel transport.
    pub(crate) http: Arc<dyn HttpTransport>,
    /// Connection state.
    state: Mutex<ConnectionState>,
    /// Background monitor task.
    monitor: Mutex<Option<JoinHandle<()>>>,
    /// Monitor stop flag.
    monitor_stop: AtomicBool,
}

// ============================================================================
// ClientInner - State Access
// ============================================================================

impl ClientInner {
    #[inline]
    pub(crate) fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    #[inline]
    pub(crate) fn last_activity(&self) -> Option<Instant> {
        self.state.lock().last_activity
    }

    /// Records activity now.
    #[inline]
    pub(crate) fn touch(&self) {
        debug!("Updating last activity timestamp");
        self.state.lock().touch();
    }

    #[inline]
    pub(crate) fn reconnect_attempts(&self) -> u32 {
        self.state.lock().reconnect_attempts
    }

    #[inline]
    pub(crate) fn reset_reconnect_attempts(&self) {
        self.state.lock().reconnect_attempts = 0;
    }

    #[inline]
    pub(crate) fn increment_reconnect_attempts(&self) {
        let mut state = self.state.lock();
        state.reconnect_attempts = state.reconnect_attempts.saturating_add(1);
    }

    #[inline]
    pub(crate) fn monitor_stopped(&self) -> bool {
        self.monitor_stop.load(Ordering::SeqCst)
    }

    /// Fails with [`Error::NotConnected`] unless connected.
    #[inline]
    pub(crate) fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }
}

// ============================================================================
// ClientInner - Push Handlers
// ============================================================================

impl ClientInner {
    /// Builds the three handlers for the handle of `generation`.
    ///
    /// Handlers hold a weak reference so a live socket never keeps a
    /// dropped client alive.
    fn handlers_for(self: &Arc<Self>, generation: u64) -> PushHandlers {
        let on_event = {
            let weak = Arc::downgrade(self);
            Arc::new(move |event: String, payload: Value| {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_inbound(generation, &event, &payload);
                }
            })
        };
        let on_connect = {
            let weak = Arc::downgrade(self);
            Arc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_connect(generation);
                }
            })
        };
        let on_disconnect = {
            let weak = Arc::downgrade(self);
            Arc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_disconnect(generation);
                }
            })
        };

        PushHandlers {
            on_event,
            on_connect,
            on_disconnect,
        }
    }

    /// Wildcard inbound handler.
    pub(crate) fn handle_inbound(&self, generation: u64, event: &str, payload: &Value) {
        {
            let mut state = self.state.lock();
            if !state.is_current(generation) {
                debug!(event, generation, "Ignoring event from superseded transport");
                return;
            }
            state.touch();
        }
        self.registry.dispatch(event, payload);
    }

    /// Low-level connect handler. Idempotent.
    pub(crate) fn handle_connect(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.is_current(generation) && !state.connected {
            state.connected = true;
            state.touch();
            info!(host = %self.config.host, port = self.config.port, "Connected to njsPC server");
        }
    }

    /// Low-level disconnect handler. Idempotent.
    pub(crate) fn handle_disconnect(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.is_current(generation) && state.connected {
            state.connected = false;
            state.touch();
            warn!(host = %self.config.host, port = self.config.port, "Disconnected from njsPC server");
        }
    }
}

// ============================================================================
// ClientInner - Lifecycle
// ============================================================================

impl ClientInner {
    /// Resolves the configured host to an IP address.
    ///
    /// IPv4 results are preferred.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the host cannot be resolved.
    pub(crate) async fn resolve_host(&self) -> Result<IpAddr> {
        let host = self.config.host.as_str();
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip);
        }

        let unresolved = |detail: String| {
            error!(host, error = %detail, "Failed to resolve host");
            Error::connection(format!("Cannot resolve host: {host}"))
        };

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, self.config.port))
            .await
            .map_err(|e| unresolved(e.to_string()))?
            .collect();

        addrs
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| addrs.first())
            .map(SocketAddr::ip)
            .ok_or_else(|| unresolved("no addresses".to_string()))
    }

    /// Returns `http://<ip>:<port>` for the configured host.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the host cannot be resolved.
    pub(crate) async fn base_url(&self) -> Result<String> {
        let ip = self.resolve_host().await?;
        Ok(format!("http://{}", SocketAddr::new(ip, self.config.port)))
    }

    /// Opens a fresh push channel.
    ///
    /// Ordinary failures are logged and leave the client disconnected;
    /// only host resolution errors are returned.
    pub(crate) async fn connect(self: &Arc<Self>, connect_timeout: Duration) -> Result<()> {
        let transport = self.push_factory.create();
        let (generation, previous) = self.state.lock().replace_transport(Arc::clone(&transport));

        if let Some(previous) = previous
            && let Err(e) = previous.disconnect().await
        {
            warn!(error = %e, "Exception during socket disconnect");
        }

        transport.set_handlers(self.handlers_for(generation));

        let url = self.base_url().await?;
        debug!(url, generation, "Connecting to njsPC server");

        match timeout(connect_timeout, transport.connect(&url, connect_timeout)).await {
            // The transport reports the connect itself; a handle that
            // dropped before `connect` returned stays disconnected.
            Ok(Ok(())) => {
                let mut state = self.state.lock();
                if state.is_current(generation) && state.connected {
                    state.reconnect_attempts = 0;
                } else {
                    warn!(generation, "Push channel dropped while connecting");
                }
            }
            Ok(Err(e)) => {
                self.mark_disconnected(generation);
                error!(error = %e, "Failed to connect to njsPC server. Will attempt to reconnect.");
            }
            Err(_) => {
                self.mark_disconnected(generation);
                error!(
                    timeout_secs = connect_timeout.as_secs_f64(),
                    "Connection attempt timed out. Will attempt to reconnect."
                );
            }
        }

        if self.config.auto_reconnect {
            self.start_monitor();
        }

        Ok(())
    }

    fn mark_disconnected(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.generation == generation {
            state.connected = false;
        }
    }

    /// Closes and drops the current transport without touching the monitor.
    pub(crate) async fn cleanup_socket(&self) {
        let (generation, transport) = {
            let state = self.state.lock();
            (state.generation, state.transport.clone())
        };

        // Close first so the disconnect handler still sees its own handle.
        if let Some(transport) = transport
            && let Err(e) = transport.disconnect().await
        {
            warn!(error = %e, "Exception during socket disconnect");
        }

        let mut state = self.state.lock();
        if state.generation == generation {
            state.take_transport();
        }
    }

    /// Stops the monitor and closes the transport.
    pub(crate) async fn disconnect(&self) {
        self.stop_monitor().await;
        self.cleanup_socket().await;
    }

    /// Spawns the monitor unless one is already running.
    fn start_monitor(self: &Arc<Self>) {
        let mut slot = self.monitor.lock();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        self.monitor_stop.store(false, Ordering::SeqCst);
        *slot = Some(monitor::spawn(Arc::downgrade(self)));
        debug!("Connection monitor started");
    }

    /// Signals, cancels and awaits the monitor.
    async fn stop_monitor(&self) {
        self.monitor_stop.store(true, Ordering::SeqCst);
        let handle = self.monitor.lock().take();
        if let Some(handle) = handle {
            handle.abort();
            match handle.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => warn!(error = %e, "Connection monitor ended abnormally"),
            }
            debug!("Connection monitor stopped");
        }
    }

    pub(crate) fn is_monitor_running(&self) -> bool {
        self.monitor
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

// ============================================================================
// Client
// ============================================================================

/// Async client for a nodejs-poolController server.
///
/// Cheap to clone; clones share one session.
///
/// # Example
///
/// ```no_run
/// use njspc::{Client, InboundEvent, Result};
///
/// # async fn example() -> Result<()> {
/// let client = Client::builder().host("nixie-poolcontroller").build()?;
/// client.on(InboundEvent::Pump, |data| println!("pump: {data}"));
/// client.connect().await?;
///
/// let state = client.fetch_full_state(None).await?;
/// println!("{state}");
///
/// client.disconnect().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    pub(crate) inner: Arc<ClientInner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("connected", &self.connected())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client - Constructor
// ============================================================================

impl Client {
    /// Creates a new [`ClientBuilder`].
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client. Performs no I/O.
    pub(crate) fn new(
        config: ClientConfig,
        push_factory: Arc<dyn TransportFactory>,
        http: Arc<dyn HttpTransport>,
    ) -> Self {
        let unknown_log = config
            .unknown_events_log
            .as_ref()
            .and_then(UnknownEventLog::new);

        Self {
            inner: Arc::new(ClientInner {
                registry: EventRegistry::with_unknown_log(unknown_log),
                config,
                push_factory,
                http,
                state: Mutex::new(ConnectionState::default()),
                monitor: Mutex::new(None),
                monitor_stop: AtomicBool::new(false),
            }),
        }
    }
}

// ============================================================================
// Client - Lifecycle
// ============================================================================

impl Client {
    /// Connects the push channel with the default 10s bound.
    ///
    /// See [`Client::connect_with_timeout`].
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if the host cannot be resolved
    pub async fn connect(&self) -> Result<()> {
        self.connect_with_timeout(DEFAULT_CONNECT_TIMEOUT).await
    }

    /// Connects the push channel, bounding the attempt by `connect_timeout`.
    ///
    /// Any previous transport handle is discarded first. Timeouts and
    /// refused connections are logged, not returned: the client stays
    /// disconnected and, with auto-reconnect enabled, the monitor retries.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if the host cannot be resolved
    pub async fn connect_with_timeout(&self, connect_timeout: Duration) -> Result<()> {
        self.inner.connect(connect_timeout).await
    }

    /// Disconnects and stops the monitor. A no-op when already disconnected.
    pub async fn disconnect(&self) {
        self.inner.disconnect().await;
    }

    /// Closes the client. Same teardown as [`Client::disconnect`].
    pub async fn async_close(&self) {
        self.inner.disconnect().await;
    }

    /// Returns `true` if the push channel is connected.
    #[inline]
    #[must_use]
    pub fn connected(&self) -> bool {
        self.inner.is_connected()
    }
}

// ============================================================================
// Client - Events
// ============================================================================

impl Client {
    /// Registers a callback for `event` and returns its handle.
    ///
    /// Pass the handle to [`Client::off`] to unregister.
    pub fn on<F>(&self, event: InboundEvent, callback: F) -> Callback
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        self.inner.registry.on(event, Arc::clone(&callback));
        callback
    }

    /// Registers an existing callback handle for `event`. Registering the
    /// same handle twice is a no-op.
    pub fn on_callback(&self, event: InboundEvent, callback: &Callback) {
        self.inner.registry.on(event, Arc::clone(callback));
    }

    /// Unregisters a callback handle from `event`.
    pub fn off(&self, event: InboundEvent, callback: &Callback) {
        self.inner.registry.off(event, callback);
    }

    /// Clears callbacks for `event`, or for all events when `None`.
    pub fn remove(&self, event: Option<InboundEvent>) {
        self.inner.registry.remove(event);
    }
}

// ============================================================================
// Client - Accessors
// ============================================================================

impl Client {
    /// Returns the session configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the attempt counter of the current retry campaign.
    #[inline]
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.reconnect_attempts()
    }

    /// Returns when activity was last recorded.
    #[inline]
    #[must_use]
    pub fn last_activity(&self) -> Option<Instant> {
        self.inner.last_activity()
    }

    /// Returns `true` while the connection monitor is running.
    #[inline]
    #[must_use]
    pub fn is_monitor_running(&self) -> bool {
        self.inner.is_monitor_running()
    }
}

// ============================================================================
// Tests
// ============================================================================
