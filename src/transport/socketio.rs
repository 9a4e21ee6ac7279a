//! Socket.IO push transport over WebSocket.
//!
//! Speaks Engine.IO v4 directly over a WebSocket (no HTTP long-polling
//! upgrade), which is what the controller's Socket.IO server accepts at
//! `/socket.io/?EIO=4&transport=websocket`.
//!
//! # Event Loop
//!
//! After the handshake completes, the transport spawns a tokio task that
//! owns the stream and handles:
//!
//! - Events (`42[...]`), forwarded to the wildcard handler
//! - Heartbeats, answering every server ping with a pong and treating
//!   `pingInterval + pingTimeout` of silence as a lost connection
//! - Server-side disconnects and socket errors, reported once through the
//!   disconnect handler
//! - Shutdown requests from [`PushTransport::disconnect`]

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::Packet;

use super::push::{PushHandlers, PushTransport, TransportFactory};

// ============================================================================
// Constants
// ============================================================================

/// Engine.IO endpoint path.
const SOCKETIO_PATH: &str = "/socket.io/";

/// Engine.IO v4 over a bare WebSocket.
const SOCKETIO_QUERY: &str = "EIO=4&transport=websocket";

/// Engine.IO defaults, used when the OPEN packet omits them.
const DEFAULT_PING_INTERVAL: Duration = Duration::from_millis(25_000);
const DEFAULT_PING_TIMEOUT: Duration = Duration::from_millis(20_000);

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

type WsWrite = SplitSink<WsStream, Message>;

/// Internal commands for the event loop.
enum LoopCommand {
    /// Leave the namespace and close the socket.
    Shutdown,
}

/// Heartbeat parameters announced in the OPEN packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Heartbeat {
    interval: Duration,
    timeout: Duration,
}

impl Heartbeat {
    fn from_open(data: &Value) -> Self {
        let millis = |key: &str, default: Duration| {
            data[key]
                .as_u64()
                .map_or(default, Duration::from_millis)
        };
        Self {
            interval: millis("pingInterval", DEFAULT_PING_INTERVAL),
            timeout: millis("pingTimeout", DEFAULT_PING_TIMEOUT),
        }
    }

    /// Longest silence tolerated before the connection counts as lost.
    fn max_silence(self) -> Duration {
        self.interval + self.timeout
    }
}

/// A running event loop.
struct ActiveLoop {
    command_tx: mpsc::UnboundedSender<LoopCommand>,
    task: JoinHandle<()>,
}

// ============================================================================
// SocketIoTransport
// ============================================================================

/// Default [`PushTransport`] implementation.
///
/// One instance represents one connection attempt; the lifecycle manager
/// creates a new one for every reconnect.
#[derive(Default)]
pub struct SocketIoTransport {
    /// Handlers (shared with the event loop).
    handlers: Arc<Mutex<Option<PushHandlers>>>,
    /// Event loop, present while connected.
    active: Mutex<Option<ActiveLoop>>,
}

impl SocketIoTransport {
    /// Creates an unconnected transport.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while the event loop is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|active| !active.task.is_finished())
    }

    /// Converts `http://host:port` into the Engine.IO WebSocket URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if `base` is not an http(s) URL.
    pub fn socketio_url(base: &str) -> Result<String> {
        let mut url =
            Url::parse(base).map_err(|e| Error::connection(format!("Invalid URL {base}: {e}")))?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(Error::connection(format!(
                    "Unsupported URL scheme '{other}'"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| Error::connection(format!("Cannot use scheme {scheme} for {base}")))?;
        url.set_path(SOCKETIO_PATH);
        url.set_query(Some(SOCKETIO_QUERY));

        Ok(url.into())
    }

    /// Fires the connect handler, if any.
    fn fire_connect(handlers: &Mutex<Option<PushHandlers>>) {
        let handler = handlers.lock().as_ref().map(|h| Arc::clone(&h.on_connect));
        if let Some(handler) = handler {
            handler();
        }
    }

    /// Fires the disconnect handler, if any.
    fn fire_disconnect(handlers: &Mutex<Option<PushHandlers>>) {
        let handler = handlers
            .lock()
            .as_ref()
            .map(|h| Arc::clone(&h.on_disconnect));
        if let Some(handler) = handler {
            handler();
        }
    }

    /// Opens the socket and joins the default namespace.
    async fn handshake(ws_url: &str) -> Result<(WsStream, Heartbeat)> {
        let (mut stream, _) = connect_async(ws_url)
            .await
            .map_err(|e| Error::connection(format!("WebSocket connect to {ws_url} failed: {e}")))?;

        let mut heartbeat = None;
        while let Some(message) = stream.next().await {
            let text = match message? {
                Message::Text(text) => text,
                Message::Close(_) => return Err(Error::ConnectionClosed),
                _ => continue,
            };

            match Packet::decode(&text)? {
                Packet::Open(data) if heartbeat.is_none() => {
                    debug!(sid = %data["sid"], "Engine.IO session opened");
                    heartbeat = Some(Heartbeat::from_open(&data));
                    stream
                        .send(Message::Text(Packet::Connect(None).encode()?.into()))
                        .await?;
                }
                Packet::Ping => {
                    stream
                        .send(Message::Text(Packet::Pong.encode()?.into()))
                        .await?;
                }
                Packet::Connect(_) => {
                    if let Some(heartbeat) = heartbeat {
                        return Ok((stream, heartbeat));
                    }
                }
                Packet::ConnectError(data) => {
                    return Err(Error::connection(format!(
                        "Namespace connect refused: {data}"
                    )));
                }
                Packet::Close | Packet::Disconnect => return Err(Error::ConnectionClosed),
                other => trace!(?other, "Ignoring packet during handshake"),
            }
        }

        Err(Error::ConnectionClosed)
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<LoopCommand>,
        handlers: Arc<Mutex<Option<PushHandlers>>>,
        heartbeat: Heartbeat,
    ) {
        let (mut ws_write, mut ws_read) = stream.split();
        let max_silence = heartbeat.max_silence();
        let deadline = sleep(max_silence);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    if matches!(message, Some(Ok(_))) {
                        deadline.as_mut().reset(Instant::now() + max_silence);
                    }

                    match message {
                        Some(Ok(Message::Text(text))) => {
                            if !Self::handle_frame(&text, &mut ws_write, &handlers).await {
                                Self::fire_disconnect(&handlers);
                                break;
                            }
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by controller");
                            Self::fire_disconnect(&handlers);
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            Self::fire_disconnect(&handlers);
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            Self::fire_disconnect(&handlers);
                            break;
                        }

                        // Binary, Ping, Pong
                        _ => {}
                    }
                }

                () = &mut deadline => {
                    warn!(
                        silence_secs = max_silence.as_secs_f64(),
                        "Ping timeout, closing socket"
                    );
                    let _ = ws_write.close().await;
                    Self::fire_disconnect(&handlers);
                    break;
                }

                command = command_rx.recv() => {
                    match command {
                        Some(LoopCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            if let Ok(frame) = Packet::Disconnect.encode() {
                                let _ = ws_write.send(Message::Text(frame.into())).await;
                            }
                            let _ = ws_write.close().await;
                            Self::fire_disconnect(&handlers);
                            break;
                        }

                        None => {
                            debug!("Transport dropped, closing socket");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        debug!("Event loop terminated");
    }

    /// Handles one text frame. Returns `false` when the session ended.
    async fn handle_frame(
        text: &str,
        ws_write: &mut WsWrite,
        handlers: &Mutex<Option<PushHandlers>>,
    ) -> bool {
        let packet = match Packet::decode(text) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(error = %e, frame = %text, "Failed to decode frame");
                return true;
            }
        };

        match packet {
            Packet::Event { name, payload } => {
                trace!(event = %name, "Event received");
                let handler = handlers.lock().as_ref().map(|h| Arc::clone(&h.on_event));
                if let Some(handler) = handler {
                    handler(name, payload);
                }
                true
            }
            Packet::Ping => {
                if let Ok(frame) = Packet::Pong.encode()
                    && let Err(e) = ws_write.send(Message::Text(frame.into())).await
                {
                    warn!(error = %e, "Failed to answer ping");
                }
                true
            }
            Packet::Disconnect | Packet::Close => {
                debug!("Controller ended the session");
                false
            }
            Packet::ConnectError(data) => {
                warn!(%data, "Controller rejected the namespace");
                false
            }
            _ => true,
        }
    }
}

#[async_trait]
impl PushTransport for SocketIoTransport {
    fn set_handlers(&self, handlers: PushHandlers) {
        *self.handlers.lock() = Some(handlers);
    }

    async fn connect(&self, url: &str, connect_timeout: Duration) -> Result<()> {
        if self.is_active() {
            return Err(Error::connection("Transport is already connected"));
        }

        let ws_url = Self::socketio_url(url)?;
        debug!(url = %ws_url, "Opening Socket.IO connection");

        let (stream, heartbeat) = timeout(connect_timeout, Self::handshake(&ws_url))
            .await
            .map_err(|_| Error::connection_timeout("Socket.IO connect", connect_timeout))??;

        // Connect is reported before any event can be delivered.
        Self::fire_connect(&self.handlers);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(Self::run_event_loop(
            stream,
            command_rx,
            Arc::clone(&self.handlers),
            heartbeat,
        ));
        *self.active.lock() = Some(ActiveLoop { command_tx, task });

        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let Some(active) = self.active.lock().take() else {
            return Ok(());
        };

        let _ = active.command_tx.send(LoopCommand::Shutdown);
        active
            .task
            .await
            .map_err(|e| Error::connection(format!("Event loop failed: {e}")))
    }
}

// ============================================================================
// SocketIoFactory
// ============================================================================

/// Factory producing a fresh [`SocketIoTransport`] per connect attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketIoFactory;

impl TransportFactory for SocketIoFactory {
    fn create(&self) -> Arc<dyn PushTransport> {
        Arc::new(SocketIoTransport::new())
    }
}

// ============================================================================
// Tests
// ============================================================================
